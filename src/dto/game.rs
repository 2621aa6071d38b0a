use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{CommentEntity, GameEntity},
    dto::{format_system_time, validation::validate_not_blank},
};

/// Payload used to create a brand-new game.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateGameInput {
    #[validate(custom(function = validate_not_blank))]
    pub name: String,
    #[validate(custom(function = validate_not_blank))]
    pub description: String,
    #[validate(custom(function = validate_not_blank))]
    pub location: String,
    /// How many players the game accepts, organizer included.
    #[validate(range(min = 1))]
    pub max_capacity: u32,
    pub starts_at: SystemTime,
    pub ends_at: SystemTime,
    /// Group the game is organized in.
    pub group_id: Uuid,
    /// Creator; becomes the first player.
    pub organizer: Uuid,
    /// Optional external link shown on the game page.
    #[validate(url)]
    pub link: Option<String>,
    pub link_desc: Option<String>,
}

/// Payload replacing the editable fields of an existing game.
///
/// Membership, comments, organizer, and audit fields are never taken from
/// this payload; `expired` and `image_url` only when explicitly set.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateGameInput {
    #[validate(custom(function = validate_not_blank))]
    pub name: String,
    #[validate(custom(function = validate_not_blank))]
    pub description: String,
    #[validate(custom(function = validate_not_blank))]
    pub location: String,
    #[validate(range(min = 1))]
    pub max_capacity: u32,
    pub starts_at: SystemTime,
    pub ends_at: SystemTime,
    /// Group the game belongs to; a different id moves the game.
    pub group_id: Uuid,
    /// Embedded-map reference; may be empty.
    #[serde(default)]
    pub map: String,
    /// Free-text travel directions; may be empty.
    #[serde(default)]
    pub directions: String,
    #[validate(url)]
    pub link: Option<String>,
    pub link_desc: Option<String>,
    /// When set, replaces the stored image URL.
    #[serde(default)]
    #[validate(url)]
    pub image_url: Option<String>,
    /// When set, overrides the expiry flag.
    #[serde(default)]
    pub expired: Option<bool>,
}

/// Summary returned once a game has been removed.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct RemovedGame {
    pub id: Uuid,
    pub name: String,
}

/// Projection of a game with RFC 3339 timestamps, ready for serialization.
#[derive(Debug, Serialize)]
pub struct GameSummary {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub location: String,
    pub max_capacity: u32,
    pub starts_at: String,
    pub ends_at: String,
    pub players: Vec<Uuid>,
    pub player_count: u32,
    pub group_id: Uuid,
    pub organizer: Uuid,
    pub comments: Vec<CommentSummary>,
    pub image_url: String,
    pub map: String,
    pub directions: String,
    pub expired: bool,
    pub link: Option<String>,
    pub link_desc: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Public projection of a comment.
#[derive(Debug, Serialize)]
pub struct CommentSummary {
    pub id: Uuid,
    pub author: Uuid,
    pub posted_at: String,
    pub text: String,
}

impl From<CommentEntity> for CommentSummary {
    fn from(comment: CommentEntity) -> Self {
        Self {
            id: comment.id,
            author: comment.author,
            posted_at: format_system_time(comment.posted_at),
            text: comment.text,
        }
    }
}

impl From<GameEntity> for GameSummary {
    fn from(game: GameEntity) -> Self {
        Self {
            id: game.id,
            name: game.name,
            description: game.description,
            location: game.location,
            max_capacity: game.max_capacity,
            starts_at: format_system_time(game.starts_at),
            ends_at: format_system_time(game.ends_at),
            players: game.players,
            player_count: game.player_count,
            group_id: game.group_id,
            organizer: game.organizer,
            comments: game.comments.into_iter().map(Into::into).collect(),
            image_url: game.image_url,
            map: game.map,
            directions: game.directions,
            expired: game.expired,
            link: game.link,
            link_desc: game.link_desc,
            created_at: format_system_time(game.created_at),
            updated_at: format_system_time(game.updated_at),
        }
    }
}
