use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

/// Aggregate game entity persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameEntity {
    /// Primary key of the game.
    pub id: Uuid,
    /// Display name of the game, searched by substring.
    pub name: String,
    /// Free-form description shown on the game page.
    pub description: String,
    /// Where the game takes place.
    pub location: String,
    /// Maximum number of players allowed to join.
    pub max_capacity: u32,
    /// Beginning of the scheduled window.
    pub starts_at: SystemTime,
    /// End of the scheduled window; the expiry sweep compares against this.
    pub ends_at: SystemTime,
    /// Ids of the users who joined; the organizer is always present.
    pub players: Vec<Uuid>,
    /// Denormalized player total, kept equal to `players.len()`.
    pub player_count: u32,
    /// Id of the group the game belongs to.
    pub group_id: Uuid,
    /// User who created the game.
    pub organizer: Uuid,
    /// Comments posted on the game, in insertion order.
    pub comments: Vec<CommentEntity>,
    /// URL of the game picture; a configured placeholder until one is uploaded.
    pub image_url: String,
    /// Embedded map reference, may be empty.
    pub map: String,
    /// Free-form directions text, may be empty.
    pub directions: String,
    /// Whether the scheduled window has elapsed.
    pub expired: bool,
    /// Optional external link attached by the organizer.
    pub link: Option<String>,
    /// Label displayed for `link`.
    pub link_desc: Option<String>,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
    /// Last time the game entity was updated.
    pub updated_at: SystemTime,
}

/// Comment subdocument embedded in a game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommentEntity {
    /// Stable identifier for the comment.
    pub id: Uuid,
    /// User who posted the comment; always one of the game's players.
    pub author: Uuid,
    /// When the comment was posted.
    pub posted_at: SystemTime,
    /// Trimmed comment body.
    pub text: String,
}

/// Projection of a user document as far as this crate is concerned.
///
/// The users collection is owned by the account layer; this crate only reads it for
/// existence checks and maintains the bidirectional `games` list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserEntity {
    /// Primary key of the user.
    pub id: Uuid,
    /// Display name, not interpreted here.
    pub display_name: String,
    /// Ids of the games the user has joined.
    pub games: Vec<Uuid>,
}

impl GameEntity {
    /// Whether `user_id` is currently one of the game's players.
    pub fn is_player(&self, user_id: Uuid) -> bool {
        self.players.contains(&user_id)
    }

    /// Whether the game has reached its capacity.
    pub fn is_full(&self) -> bool {
        self.players.len() as u32 >= self.max_capacity
    }
}
