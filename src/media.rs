//! Media storage collaborator holding game images.
//!
//! Games reference their image by URL; the bytes live in an external media
//! backend. The service only needs two operations from it, exposed here as a
//! trait so deployments can plug in whatever backend they run.

use futures::future::BoxFuture;
use thiserror::Error;
use uuid::Uuid;

/// Convenient result alias returning [`MediaError`] failures.
pub type MediaResult<T> = Result<T, MediaError>;

/// Failures reported by a media backend.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The backend refused the upload (unsupported type, payload too large).
    #[error("media backend rejected image for game `{game_id}`: {reason}")]
    Rejected {
        /// Game the upload was meant for.
        game_id: Uuid,
        /// Backend-provided reason.
        reason: String,
    },
    /// The backend failed or could not be reached.
    #[error("media backend failure: {message}")]
    Backend {
        /// Human-readable description of the failure.
        message: String,
        /// Underlying backend error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl MediaError {
    /// Wraps a backend-specific error into the generic failure variant.
    pub fn backend(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Backend {
            message: message.into(),
            source: Box::new(source),
        }
    }
}

/// Image payload handed to the media backend.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Original file name, used by backends that keep one.
    pub file_name: String,
    /// MIME type of the payload.
    pub content_type: String,
    /// Raw image bytes.
    pub bytes: Vec<u8>,
}

/// Backend storing game images.
pub trait MediaStore: Send + Sync {
    /// Stores a new image for the game and returns its public URL.
    fn store_game_image(
        &self,
        game_id: Uuid,
        upload: ImageUpload,
    ) -> BoxFuture<'static, MediaResult<String>>;

    /// Deletes every media object stored under the game's folder.
    fn delete_game_media(&self, game_id: Uuid) -> BoxFuture<'static, MediaResult<()>>;
}
