//! Error types shared by the MongoDB storage implementation.

use mongodb::error::Error as MongoError;
use thiserror::Error;
use uuid::Uuid;

/// Convenient result alias returning [`MongoDaoError`] failures.
pub type MongoResult<T> = Result<T, MongoDaoError>;

/// Failures that can occur while interacting with MongoDB.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// Required environment variable is missing.
    #[error("missing MongoDB environment variable `{var}`")]
    MissingEnvVar {
        /// Name of the missing variable.
        var: &'static str,
    },
    /// The connection URI could not be parsed by the driver.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        /// The rejected URI.
        uri: String,
        /// Driver-side parse failure.
        #[source]
        source: MongoError,
    },
    /// Building the client from parsed options failed.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        /// Driver-side construction failure.
        #[source]
        source: MongoError,
    },
    /// The initial connection never answered a ping.
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        /// How many pings were attempted before giving up.
        attempts: u32,
        /// Last ping failure.
        #[source]
        source: MongoError,
    },
    /// A routine health-check ping failed.
    #[error("MongoDB ping health check failed")]
    HealthPing {
        /// Driver-side ping failure.
        #[source]
        source: MongoError,
    },
    /// Index bootstrap failed.
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        /// Collection the index belongs to.
        collection: &'static str,
        /// Name of the index that could not be created.
        index: &'static str,
        /// Driver-side failure.
        #[source]
        source: MongoError,
    },
    /// Inserting a new game document failed.
    #[error("failed to insert game `{id}`")]
    InsertGame {
        /// Id of the game being inserted.
        id: Uuid,
        /// Driver-side failure.
        #[source]
        source: MongoError,
    },
    /// Loading a game by id failed.
    #[error("failed to load game `{id}`")]
    LoadGame {
        /// Id of the game being loaded.
        id: Uuid,
        /// Driver-side failure.
        #[source]
        source: MongoError,
    },
    /// Listing game documents failed.
    #[error("failed to list games")]
    ListGames {
        /// Driver-side failure.
        #[source]
        source: MongoError,
    },
    /// The name search query failed.
    #[error("failed to search games by name")]
    SearchGames {
        /// Driver-side failure.
        #[source]
        source: MongoError,
    },
    /// Replacing a game document failed.
    #[error("failed to replace game `{id}`")]
    ReplaceGame {
        /// Id of the game being replaced.
        id: Uuid,
        /// Driver-side failure.
        #[source]
        source: MongoError,
    },
    /// A partial update (players, comments) on a game failed.
    #[error("failed to update game `{id}`")]
    MutateGame {
        /// Id of the game being updated.
        id: Uuid,
        /// Driver-side failure.
        #[source]
        source: MongoError,
    },
    /// Deleting a game document failed.
    #[error("failed to delete game `{id}`")]
    DeleteGame {
        /// Id of the game being deleted.
        id: Uuid,
        /// Driver-side failure.
        #[source]
        source: MongoError,
    },
    /// The batch expiry sweep failed.
    #[error("failed to mark elapsed games as expired")]
    ExpireGames {
        /// Driver-side failure.
        #[source]
        source: MongoError,
    },
    /// Loading a user by id failed.
    #[error("failed to load user `{id}`")]
    LoadUser {
        /// Id of the user being loaded.
        id: Uuid,
        /// Driver-side failure.
        #[source]
        source: MongoError,
    },
    /// Updating the `games` list on a user document failed.
    #[error("failed to update the game list of user `{id}`")]
    UpdateUserGames {
        /// Id of the user being updated.
        id: Uuid,
        /// Driver-side failure.
        #[source]
        source: MongoError,
    },
    /// Removing a deleted game from all user documents failed.
    #[error("failed to detach game `{id}` from user game lists")]
    DetachGameFromUsers {
        /// Id of the removed game.
        id: Uuid,
        /// Driver-side failure.
        #[source]
        source: MongoError,
    },
}
