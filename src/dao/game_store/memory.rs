//! In-memory [`GameStore`] used by tests and local development.

use std::{sync::Arc, time::SystemTime};

use dashmap::DashMap;
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::{
    game_store::GameStore,
    models::{CommentEntity, GameEntity, UserEntity},
    storage::StorageResult,
};

/// Game store keeping everything in process memory.
///
/// Mirrors the observable behavior of the MongoDB store so the service layer
/// can be exercised without a running database. Clones share the same maps.
#[derive(Clone, Default)]
pub struct InMemoryGameStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    games: DashMap<Uuid, GameEntity>,
    users: DashMap<Uuid, UserEntity>,
}

impl InMemoryGameStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a user document, replacing any previous one with the same id.
    ///
    /// Users are owned by another part of the system; this hook exists so
    /// tests and local setups can provide them.
    pub fn seed_user(&self, user: UserEntity) {
        self.inner.users.insert(user.id, user);
    }
}

fn name_matches(name: &str, term: &str) -> bool {
    name.to_lowercase().contains(&term.to_lowercase())
}

impl GameStore for InMemoryGameStore {
    fn insert_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.inner.games.insert(game.id, game);
            Ok(())
        })
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.inner.games.get(&id).map(|entry| entry.clone())) })
    }

    fn list_games(&self, include_expired: bool) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .games
                .iter()
                .filter(|entry| include_expired || !entry.expired)
                .map(|entry| entry.clone())
                .collect())
        })
    }

    fn list_group_games(
        &self,
        group_id: Uuid,
        include_expired: bool,
    ) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .games
                .iter()
                .filter(|entry| entry.group_id == group_id)
                .filter(|entry| include_expired || !entry.expired)
                .map(|entry| entry.clone())
                .collect())
        })
    }

    fn search_games(
        &self,
        term: String,
        limit: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .games
                .iter()
                .filter(|entry| name_matches(&entry.name, &term))
                .take(usize::try_from(limit).unwrap_or(0))
                .map(|entry| entry.clone())
                .collect())
        })
    }

    fn replace_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            match store.inner.games.get_mut(&game.id) {
                Some(mut entry) => {
                    *entry = game;
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }

    fn push_comment(
        &self,
        game_id: Uuid,
        comment: CommentEntity,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            match store.inner.games.get_mut(&game_id) {
                Some(mut entry) => {
                    entry.comments.push(comment);
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }

    fn pull_comment(
        &self,
        game_id: Uuid,
        comment_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            match store.inner.games.get_mut(&game_id) {
                Some(mut entry) => {
                    let before = entry.comments.len();
                    entry.comments.retain(|comment| comment.id != comment_id);
                    Ok(entry.comments.len() < before)
                }
                None => Ok(false),
            }
        })
    }

    fn push_player(&self, game_id: Uuid, user_id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            match store.inner.games.get_mut(&game_id) {
                Some(mut entry) => {
                    entry.players.push(user_id);
                    entry.player_count += 1;
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }

    fn pull_player(&self, game_id: Uuid, user_id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            match store.inner.games.get_mut(&game_id) {
                Some(mut entry) if entry.is_player(user_id) => {
                    entry.players.retain(|player| *player != user_id);
                    entry.player_count = entry.player_count.saturating_sub(1);
                    Ok(true)
                }
                _ => Ok(false),
            }
        })
    }

    fn expire_games(&self, cutoff: SystemTime) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            let mut expired = 0;
            for mut entry in store.inner.games.iter_mut() {
                if !entry.expired && entry.ends_at <= cutoff {
                    entry.expired = true;
                    expired += 1;
                }
            }
            Ok(expired)
        })
    }

    fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.inner.games.remove(&id).map(|(_, game)| game)) })
    }

    fn find_user(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.inner.users.get(&id).map(|entry| entry.clone())) })
    }

    fn push_user_game(
        &self,
        user_id: Uuid,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            match store.inner.users.get_mut(&user_id) {
                Some(mut entry) => {
                    entry.games.push(game_id);
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }

    fn pull_user_game(
        &self,
        user_id: Uuid,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            match store.inner.users.get_mut(&user_id) {
                Some(mut entry) if entry.games.contains(&game_id) => {
                    entry.games.retain(|game| *game != game_id);
                    Ok(true)
                }
                _ => Ok(false),
            }
        })
    }

    fn detach_game_from_users(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            let mut detached = 0;
            for mut entry in store.inner.users.iter_mut() {
                let before = entry.games.len();
                entry.games.retain(|game| *game != game_id);
                if entry.games.len() < before {
                    detached += 1;
                }
            }
            Ok(detached)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async move { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async move { Ok(()) })
    }
}
