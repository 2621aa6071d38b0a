#[cfg(feature = "memory-store")]
pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use std::time::SystemTime;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{CommentEntity, GameEntity, UserEntity};
use crate::dao::storage::StorageResult;

/// Abstraction over the persistence layer for game documents and the bidirectional
/// game lists kept on user documents.
///
/// Mutating methods returning `bool` report whether a document was actually touched, so
/// the service layer can turn a silent miss into a not-found error.
pub trait GameStore: Send + Sync {
    /// Insert a freshly created game document.
    fn insert_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch a game by id.
    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    /// List games, filtered to unexpired ones unless `include_expired`.
    fn list_games(
        &self,
        include_expired: bool,
    ) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>>;
    /// List the games owned by a group, with the same expiry filter as [`Self::list_games`].
    fn list_group_games(
        &self,
        group_id: Uuid,
        include_expired: bool,
    ) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>>;
    /// Case-insensitive substring search on game names, capped at `limit` results.
    fn search_games(
        &self,
        term: String,
        limit: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>>;
    /// Replace a game document wholesale.
    fn replace_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<bool>>;
    /// Append a comment to a game's comment list.
    fn push_comment(
        &self,
        game_id: Uuid,
        comment: CommentEntity,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    /// Remove a comment by id; `false` when the game or the comment was missing.
    fn pull_comment(
        &self,
        game_id: Uuid,
        comment_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    /// Add a player to a game and bump the denormalized player count.
    fn push_player(&self, game_id: Uuid, user_id: Uuid)
    -> BoxFuture<'static, StorageResult<bool>>;
    /// Remove a player from a game and decrement the player count.
    fn pull_player(&self, game_id: Uuid, user_id: Uuid)
    -> BoxFuture<'static, StorageResult<bool>>;
    /// Mark every unexpired game whose window ended at or before `cutoff` as expired,
    /// returning how many documents were flipped.
    fn expire_games(&self, cutoff: SystemTime) -> BoxFuture<'static, StorageResult<u64>>;
    /// Delete a game, returning the removed document when it existed.
    fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    /// Fetch a user by id.
    fn find_user(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<UserEntity>>>;
    /// Record a game on a user's `games` list.
    fn push_user_game(
        &self,
        user_id: Uuid,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    /// Drop a game from a user's `games` list.
    fn pull_user_game(
        &self,
        user_id: Uuid,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    /// Drop a game from every user's `games` list, returning how many users were touched.
    fn detach_game_from_users(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<u64>>;
    /// Verify the backend is reachable.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Attempt to re-establish the backend connection.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
