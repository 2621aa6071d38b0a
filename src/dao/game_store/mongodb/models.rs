//! BSON document shapes and conversions from the storage entities.

use mongodb::bson::{Binary, DateTime, Document, Uuid as BsonUuid, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::models::{CommentEntity, GameEntity, UserEntity};

/// Persisted shape of a game. Timestamps are stored as BSON datetimes so the
/// expiry sweep can compare them server-side, and ids as [`BsonUuid`] so they
/// land as Binary subtype 4 and match the filters built by [`uuid_as_binary`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoGameDocument {
    #[serde(rename = "_id")]
    id: BsonUuid,
    name: String,
    description: String,
    location: String,
    max_capacity: u32,
    starts_at: DateTime,
    ends_at: DateTime,
    players: Vec<BsonUuid>,
    player_count: u32,
    group_id: BsonUuid,
    organizer: BsonUuid,
    comments: Vec<MongoCommentDocument>,
    image_url: String,
    map: String,
    directions: String,
    #[serde(default)]
    expired: bool,
    link: Option<String>,
    link_desc: Option<String>,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<GameEntity> for MongoGameDocument {
    fn from(value: GameEntity) -> Self {
        Self {
            id: value.id.into(),
            name: value.name,
            description: value.description,
            location: value.location,
            max_capacity: value.max_capacity,
            starts_at: DateTime::from_system_time(value.starts_at),
            ends_at: DateTime::from_system_time(value.ends_at),
            players: value.players.into_iter().map(BsonUuid::from).collect(),
            player_count: value.player_count,
            group_id: value.group_id.into(),
            organizer: value.organizer.into(),
            comments: value.comments.into_iter().map(Into::into).collect(),
            image_url: value.image_url,
            map: value.map,
            directions: value.directions,
            expired: value.expired,
            link: value.link,
            link_desc: value.link_desc,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl From<MongoGameDocument> for GameEntity {
    fn from(value: MongoGameDocument) -> Self {
        Self {
            id: value.id.into(),
            name: value.name,
            description: value.description,
            location: value.location,
            max_capacity: value.max_capacity,
            starts_at: value.starts_at.to_system_time(),
            ends_at: value.ends_at.to_system_time(),
            players: value.players.into_iter().map(Uuid::from).collect(),
            player_count: value.player_count,
            group_id: value.group_id.into(),
            organizer: value.organizer.into(),
            comments: value.comments.into_iter().map(Into::into).collect(),
            image_url: value.image_url,
            map: value.map,
            directions: value.directions,
            expired: value.expired,
            link: value.link,
            link_desc: value.link_desc,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

/// Persisted shape of a comment embedded in a game document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoCommentDocument {
    id: BsonUuid,
    author: BsonUuid,
    posted_at: DateTime,
    text: String,
}

impl MongoCommentDocument {
    /// Renders the comment as a literal document for `$push` updates. Field
    /// names and encodings must match the serde representation above.
    pub(super) fn to_document(&self) -> Document {
        doc! {
            "id": self.id,
            "author": self.author,
            "posted_at": self.posted_at,
            "text": self.text.clone(),
        }
    }
}

impl From<CommentEntity> for MongoCommentDocument {
    fn from(value: CommentEntity) -> Self {
        Self {
            id: value.id.into(),
            author: value.author.into(),
            posted_at: DateTime::from_system_time(value.posted_at),
            text: value.text,
        }
    }
}

impl From<MongoCommentDocument> for CommentEntity {
    fn from(value: MongoCommentDocument) -> Self {
        Self {
            id: value.id.into(),
            author: value.author.into(),
            posted_at: value.posted_at.to_system_time(),
            text: value.text,
        }
    }
}

/// Persisted shape of a user. Only the fields this crate touches are mapped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoUserDocument {
    #[serde(rename = "_id")]
    id: BsonUuid,
    display_name: String,
    #[serde(default)]
    games: Vec<BsonUuid>,
}

impl From<UserEntity> for MongoUserDocument {
    fn from(value: UserEntity) -> Self {
        Self {
            id: value.id.into(),
            display_name: value.display_name,
            games: value.games.into_iter().map(BsonUuid::from).collect(),
        }
    }
}

impl From<MongoUserDocument> for UserEntity {
    fn from(value: MongoUserDocument) -> Self {
        Self {
            id: value.id.into(),
            display_name: value.display_name,
            games: value.games.into_iter().map(Uuid::from).collect(),
        }
    }
}

pub(super) fn uuid_as_binary(id: Uuid) -> Binary {
    Binary::from(id)
}

pub(super) fn doc_id(id: Uuid) -> Document {
    doc! {"_id": uuid_as_binary(id)}
}
