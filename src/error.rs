//! Service-level error taxonomy.

use thiserror::Error;
use uuid::Uuid;
use validator::ValidationErrors;

use crate::{dao::storage::StorageError, media::MediaError};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// The media backend reported a failure.
    #[error("media storage failed")]
    Media(#[source] MediaError),
    /// No media backend is configured for this deployment.
    #[error("no media backend configured")]
    MediaUnavailable,
    /// Invalid input provided by the caller.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// The game already has as many players as it allows.
    #[error("game `{game_id}` is full ({max_capacity} players)")]
    GameFull {
        /// Game that was at capacity.
        game_id: Uuid,
        /// The capacity it was created with.
        max_capacity: u32,
    },
    /// The user is already on the game's player list.
    #[error("user `{user_id}` already joined game `{game_id}`")]
    AlreadyJoined {
        /// Game the user tried to join.
        game_id: Uuid,
        /// The duplicate joiner.
        user_id: Uuid,
    },
    /// The user is not on the game's player list.
    #[error("user `{user_id}` is not a player of game `{game_id}`")]
    NotAPlayer {
        /// Game the user tried to leave.
        game_id: Uuid,
        /// The non-member.
        user_id: Uuid,
    },
    /// Organizers stay on their game until it is removed.
    #[error("the organizer cannot leave game `{game_id}`")]
    OrganizerCannotLeave {
        /// Game whose organizer tried to leave.
        game_id: Uuid,
    },
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<MediaError> for ServiceError {
    fn from(err: MediaError) -> Self {
        ServiceError::Media(err)
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(err: ValidationErrors) -> Self {
        ServiceError::InvalidInput(format!("validation failed: {err}"))
    }
}
