//! [`GameStore`] implementation backed by MongoDB.

use std::{sync::Arc, time::SystemTime};

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database,
    bson::{DateTime, Document, doc},
    options::IndexOptions,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{MongoCommentDocument, MongoGameDocument, MongoUserDocument, doc_id, uuid_as_binary},
};
use crate::dao::{
    game_store::GameStore,
    models::{CommentEntity, GameEntity, UserEntity},
    storage::StorageResult,
};

const GAME_COLLECTION_NAME: &str = "games";
const USER_COLLECTION_NAME: &str = "users";

/// Game store persisting games and user memberships in MongoDB.
#[derive(Clone)]
pub struct MongoGameStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoGameStore {
    /// Establishes a connection to MongoDB and ensures indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;

        create_index(
            &database,
            GAME_COLLECTION_NAME,
            "game_name_idx",
            doc! {"name": 1},
        )
        .await?;
        create_index(
            &database,
            GAME_COLLECTION_NAME,
            "game_group_idx",
            doc! {"group_id": 1},
        )
        .await?;
        // Compound index serving the expiry sweep's range scan.
        create_index(
            &database,
            GAME_COLLECTION_NAME,
            "game_expiry_idx",
            doc! {"expired": 1, "ends_at": 1},
        )
        .await?;
        create_index(
            &database,
            USER_COLLECTION_NAME,
            "user_games_idx",
            doc! {"games": 1},
        )
        .await?;

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn games(&self) -> Collection<MongoGameDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoGameDocument>(GAME_COLLECTION_NAME)
    }

    async fn users(&self) -> Collection<MongoUserDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoUserDocument>(USER_COLLECTION_NAME)
    }

    async fn insert_game(&self, game: GameEntity) -> MongoResult<()> {
        let id = game.id;
        let document: MongoGameDocument = game.into();
        let collection = self.games().await;
        collection
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::InsertGame { id, source })?;
        Ok(())
    }

    async fn find_game(&self, id: Uuid) -> MongoResult<Option<GameEntity>> {
        let collection = self.games().await;

        let document = collection
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadGame { id, source })?;

        Ok(document.map(Into::into))
    }

    async fn list_games(&self, include_expired: bool) -> MongoResult<Vec<GameEntity>> {
        let filter = if include_expired {
            doc! {}
        } else {
            doc! {"expired": false}
        };
        self.collect_games(filter).await
    }

    async fn list_group_games(
        &self,
        group_id: Uuid,
        include_expired: bool,
    ) -> MongoResult<Vec<GameEntity>> {
        let mut filter = doc! {"group_id": uuid_as_binary(group_id)};
        if !include_expired {
            filter.insert("expired", false);
        }
        self.collect_games(filter).await
    }

    async fn collect_games(&self, filter: Document) -> MongoResult<Vec<GameEntity>> {
        let collection = self.games().await;

        let documents: Vec<MongoGameDocument> = collection
            .find(filter)
            .await
            .map_err(|source| MongoDaoError::ListGames { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListGames { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn search_games(&self, term: String, limit: i64) -> MongoResult<Vec<GameEntity>> {
        let collection = self.games().await;
        let filter = search_filter(&term);

        let documents: Vec<MongoGameDocument> = collection
            .find(filter)
            .limit(limit)
            .await
            .map_err(|source| MongoDaoError::SearchGames { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::SearchGames { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn replace_game(&self, game: GameEntity) -> MongoResult<bool> {
        let id = game.id;
        let document: MongoGameDocument = game.into();
        let collection = self.games().await;

        let result = collection
            .replace_one(doc_id(id), &document)
            .await
            .map_err(|source| MongoDaoError::ReplaceGame { id, source })?;
        Ok(result.matched_count > 0)
    }

    async fn push_comment(&self, game_id: Uuid, comment: CommentEntity) -> MongoResult<bool> {
        let document: MongoCommentDocument = comment.into();
        let collection = self.games().await;

        let result = collection
            .update_one(
                doc_id(game_id),
                doc! {"$push": {"comments": document.to_document()}},
            )
            .await
            .map_err(|source| MongoDaoError::MutateGame {
                id: game_id,
                source,
            })?;
        Ok(result.matched_count > 0)
    }

    async fn pull_comment(&self, game_id: Uuid, comment_id: Uuid) -> MongoResult<bool> {
        let collection = self.games().await;

        let result = collection
            .update_one(
                doc_id(game_id),
                doc! {"$pull": {"comments": {"id": uuid_as_binary(comment_id)}}},
            )
            .await
            .map_err(|source| MongoDaoError::MutateGame {
                id: game_id,
                source,
            })?;
        Ok(result.modified_count > 0)
    }

    async fn push_player(&self, game_id: Uuid, user_id: Uuid) -> MongoResult<bool> {
        let collection = self.games().await;

        let result = collection
            .update_one(
                doc_id(game_id),
                doc! {
                    "$push": {"players": uuid_as_binary(user_id)},
                    "$inc": {"player_count": 1},
                },
            )
            .await
            .map_err(|source| MongoDaoError::MutateGame {
                id: game_id,
                source,
            })?;
        Ok(result.matched_count > 0)
    }

    async fn pull_player(&self, game_id: Uuid, user_id: Uuid) -> MongoResult<bool> {
        let collection = self.games().await;

        // Membership is part of the filter so `$inc` never fires without a
        // matching `$pull`.
        let filter = doc! {
            "_id": uuid_as_binary(game_id),
            "players": uuid_as_binary(user_id),
        };
        let result = collection
            .update_one(
                filter,
                doc! {
                    "$pull": {"players": uuid_as_binary(user_id)},
                    "$inc": {"player_count": -1},
                },
            )
            .await
            .map_err(|source| MongoDaoError::MutateGame {
                id: game_id,
                source,
            })?;
        Ok(result.matched_count > 0)
    }

    async fn expire_games(&self, cutoff: SystemTime) -> MongoResult<u64> {
        let collection = self.games().await;

        let filter = doc! {
            "expired": false,
            "ends_at": {"$lte": DateTime::from_system_time(cutoff)},
        };
        let result = collection
            .update_many(filter, doc! {"$set": {"expired": true}})
            .await
            .map_err(|source| MongoDaoError::ExpireGames { source })?;
        Ok(result.modified_count)
    }

    async fn delete_game(&self, id: Uuid) -> MongoResult<Option<GameEntity>> {
        let collection = self.games().await;

        let document = collection
            .find_one_and_delete(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::DeleteGame { id, source })?;
        Ok(document.map(Into::into))
    }

    async fn find_user(&self, id: Uuid) -> MongoResult<Option<UserEntity>> {
        let collection = self.users().await;

        let document = collection
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadUser { id, source })?;
        Ok(document.map(Into::into))
    }

    async fn push_user_game(&self, user_id: Uuid, game_id: Uuid) -> MongoResult<bool> {
        let collection = self.users().await;

        let result = collection
            .update_one(
                doc_id(user_id),
                doc! {"$push": {"games": uuid_as_binary(game_id)}},
            )
            .await
            .map_err(|source| MongoDaoError::UpdateUserGames {
                id: user_id,
                source,
            })?;
        Ok(result.matched_count > 0)
    }

    async fn pull_user_game(&self, user_id: Uuid, game_id: Uuid) -> MongoResult<bool> {
        let collection = self.users().await;

        let filter = doc! {
            "_id": uuid_as_binary(user_id),
            "games": uuid_as_binary(game_id),
        };
        let result = collection
            .update_one(filter, doc! {"$pull": {"games": uuid_as_binary(game_id)}})
            .await
            .map_err(|source| MongoDaoError::UpdateUserGames {
                id: user_id,
                source,
            })?;
        Ok(result.matched_count > 0)
    }

    async fn detach_game_from_users(&self, game_id: Uuid) -> MongoResult<u64> {
        let collection = self.users().await;

        let result = collection
            .update_many(
                doc! {"games": uuid_as_binary(game_id)},
                doc! {"$pull": {"games": uuid_as_binary(game_id)}},
            )
            .await
            .map_err(|source| MongoDaoError::DetachGameFromUsers {
                id: game_id,
                source,
            })?;
        Ok(result.modified_count)
    }
}

async fn create_index(
    database: &Database,
    collection: &'static str,
    index_name: &'static str,
    keys: Document,
) -> MongoResult<()> {
    let index = mongodb::IndexModel::builder()
        .keys(keys)
        .options(
            IndexOptions::builder()
                .name(Some(index_name.to_owned()))
                .build(),
        )
        .build();

    database
        .collection::<Document>(collection)
        .create_index(index)
        .await
        .map_err(|source| MongoDaoError::EnsureIndex {
            collection,
            index: index_name,
            source,
        })?;
    Ok(())
}

/// Escapes regex metacharacters so a search term only ever matches literally.
fn escape_regex(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(
            ch,
            '\\' | '.' | '+' | '*' | '?' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '^' | '$'
        ) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Case-insensitive substring match on `name`, with the term escaped so user
/// input never acts as a pattern.
fn search_filter(term: &str) -> Document {
    doc! {
        "name": {
            "$regex": escape_regex(term),
            "$options": "i",
        },
    }
}

impl GameStore for MongoGameStore {
    fn insert_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_game(game).await.map_err(Into::into) })
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_game(id).await.map_err(Into::into) })
    }

    fn list_games(&self, include_expired: bool) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_games(include_expired).await.map_err(Into::into) })
    }

    fn list_group_games(
        &self,
        group_id: Uuid,
        include_expired: bool,
    ) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list_group_games(group_id, include_expired)
                .await
                .map_err(Into::into)
        })
    }

    fn search_games(
        &self,
        term: String,
        limit: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.search_games(term, limit).await.map_err(Into::into) })
    }

    fn replace_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.replace_game(game).await.map_err(Into::into) })
    }

    fn push_comment(
        &self,
        game_id: Uuid,
        comment: CommentEntity,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.push_comment(game_id, comment).await.map_err(Into::into) })
    }

    fn pull_comment(
        &self,
        game_id: Uuid,
        comment_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .pull_comment(game_id, comment_id)
                .await
                .map_err(Into::into)
        })
    }

    fn push_player(&self, game_id: Uuid, user_id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.push_player(game_id, user_id).await.map_err(Into::into) })
    }

    fn pull_player(&self, game_id: Uuid, user_id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.pull_player(game_id, user_id).await.map_err(Into::into) })
    }

    fn expire_games(&self, cutoff: SystemTime) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move { store.expire_games(cutoff).await.map_err(Into::into) })
    }

    fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.delete_game(id).await.map_err(Into::into) })
    }

    fn find_user(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_user(id).await.map_err(Into::into) })
    }

    fn push_user_game(
        &self,
        user_id: Uuid,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .push_user_game(user_id, game_id)
                .await
                .map_err(Into::into)
        })
    }

    fn pull_user_game(
        &self,
        user_id: Uuid,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .pull_user_game(user_id, game_id)
                .await
                .map_err(Into::into)
        })
    }

    fn detach_game_from_users(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .detach_game_from_users(game_id)
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
