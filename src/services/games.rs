//! Business logic for managing games. Coordinates the game store, the users
//! collection, and the media backend while enforcing the membership
//! invariants: players never exceed capacity, the organizer stays a player,
//! and the player counter tracks the player list.

use std::{sync::Arc, time::SystemTime};

use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::AppConfig,
    dao::{
        game_store::GameStore,
        models::{CommentEntity, GameEntity},
    },
    dto::{
        format_system_time,
        game::{CreateGameInput, RemovedGame, UpdateGameInput},
    },
    error::ServiceError,
    media::{ImageUpload, MediaStore},
};

/// Data-access service exposing every game operation to the application layer.
#[derive(Clone)]
pub struct GamesService {
    store: Arc<dyn GameStore>,
    media: Option<Arc<dyn MediaStore>>,
    config: AppConfig,
}

impl GamesService {
    /// Creates a service without a media backend. Image operations degrade:
    /// removal skips media cleanup and [`Self::edit_game_image`] is refused.
    pub fn new(store: Arc<dyn GameStore>, config: AppConfig) -> Self {
        Self {
            store,
            media: None,
            config,
        }
    }

    /// Attaches a media backend.
    pub fn with_media(mut self, media: Arc<dyn MediaStore>) -> Self {
        self.media = Some(media);
        self
    }

    /// Creates a game organized by an existing user. The organizer becomes
    /// the first player and the game lands on their `games` list.
    pub async fn create(&self, input: CreateGameInput) -> Result<GameEntity, ServiceError> {
        input.validate()?;
        ensure_valid_window(input.starts_at, input.ends_at)?;

        let organizer = input.organizer;
        if self.store.find_user(organizer).await?.is_none() {
            return Err(ServiceError::NotFound(format!(
                "user `{organizer}` not found"
            )));
        }

        let game = build_game(input, self.config.default_game_image());
        self.store.insert_game(game.clone()).await?;

        if !self.store.push_user_game(organizer, game.id).await? {
            // The organizer disappeared between the check and the push. The
            // game stays; only the user-side list is out of date.
            warn!(
                game_id = %game.id,
                user_id = %organizer,
                "organizer vanished while creating game"
            );
        }

        info!(game_id = %game.id, organizer = %organizer, "created game");
        Ok(game)
    }

    /// Looks a game up by id.
    pub async fn get(&self, game_id: Uuid) -> Result<GameEntity, ServiceError> {
        self.require_game(game_id).await
    }

    /// Lists every game, skipping expired ones unless asked otherwise.
    pub async fn list(&self, include_expired: bool) -> Result<Vec<GameEntity>, ServiceError> {
        Ok(self.store.list_games(include_expired).await?)
    }

    /// Lists the games of a single group, skipping expired ones unless asked
    /// otherwise.
    pub async fn list_by_group(
        &self,
        group_id: Uuid,
        include_expired: bool,
    ) -> Result<Vec<GameEntity>, ServiceError> {
        Ok(self.store.list_group_games(group_id, include_expired).await?)
    }

    /// Case-insensitive substring search on game names, capped at the
    /// configured result limit.
    pub async fn search(&self, term: &str) -> Result<Vec<GameEntity>, ServiceError> {
        let term = term.trim();
        if term.is_empty() {
            return Err(ServiceError::InvalidInput(
                "search term must not be blank".into(),
            ));
        }

        Ok(self
            .store
            .search_games(term.to_owned(), self.config.search_result_limit())
            .await?)
    }

    /// Appends a comment authored by one of the game's players.
    pub async fn add_comment(
        &self,
        game_id: Uuid,
        author: Uuid,
        text: &str,
    ) -> Result<CommentEntity, ServiceError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ServiceError::InvalidInput(
                "comment text must not be blank".into(),
            ));
        }

        let game = self.require_game(game_id).await?;
        if !game.is_player(author) {
            return Err(ServiceError::NotAPlayer {
                game_id,
                user_id: author,
            });
        }

        let comment = CommentEntity {
            id: Uuid::new_v4(),
            author,
            posted_at: SystemTime::now(),
            text: text.to_owned(),
        };
        if !self.store.push_comment(game_id, comment.clone()).await? {
            return Err(ServiceError::NotFound(format!(
                "game `{game_id}` not found"
            )));
        }

        debug!(game_id = %game_id, comment_id = %comment.id, "added comment");
        Ok(comment)
    }

    /// Deletes a comment by id.
    pub async fn remove_comment(
        &self,
        game_id: Uuid,
        comment_id: Uuid,
    ) -> Result<(), ServiceError> {
        if !self.store.pull_comment(game_id, comment_id).await? {
            return Err(ServiceError::NotFound(format!(
                "comment `{comment_id}` not found on game `{game_id}`"
            )));
        }

        debug!(game_id = %game_id, comment_id = %comment_id, "removed comment");
        Ok(())
    }

    /// Adds an existing user to the game's player list and mirrors the game
    /// onto the user's `games` list.
    pub async fn join(&self, game_id: Uuid, user_id: Uuid) -> Result<(), ServiceError> {
        let game = self.require_game(game_id).await?;
        if game.is_full() {
            return Err(ServiceError::GameFull {
                game_id,
                max_capacity: game.max_capacity,
            });
        }
        if game.is_player(user_id) {
            return Err(ServiceError::AlreadyJoined { game_id, user_id });
        }
        if self.store.find_user(user_id).await?.is_none() {
            return Err(ServiceError::NotFound(format!("user `{user_id}` not found")));
        }

        if !self.store.push_player(game_id, user_id).await? {
            return Err(ServiceError::NotFound(format!(
                "game `{game_id}` not found"
            )));
        }
        if !self.store.push_user_game(user_id, game_id).await? {
            warn!(
                game_id = %game_id,
                user_id = %user_id,
                "user vanished while joining game"
            );
        }

        info!(game_id = %game_id, user_id = %user_id, "user joined game");
        Ok(())
    }

    /// Removes a player from the game. The organizer stays until the game is
    /// removed altogether.
    pub async fn leave(&self, game_id: Uuid, user_id: Uuid) -> Result<(), ServiceError> {
        let game = self.require_game(game_id).await?;
        if !game.is_player(user_id) {
            return Err(ServiceError::NotAPlayer { game_id, user_id });
        }
        if game.organizer == user_id {
            return Err(ServiceError::OrganizerCannotLeave { game_id });
        }

        if !self.store.pull_player(game_id, user_id).await? {
            return Err(ServiceError::NotAPlayer { game_id, user_id });
        }
        if !self.store.pull_user_game(user_id, game_id).await? {
            warn!(
                game_id = %game_id,
                user_id = %user_id,
                "game was missing from the leaving user's list"
            );
        }

        info!(game_id = %game_id, user_id = %user_id, "user left game");
        Ok(())
    }

    /// Replaces the editable fields of a game. Membership, comments, the
    /// organizer, and `created_at` always survive; see [`UpdateGameInput`].
    pub async fn update(
        &self,
        game_id: Uuid,
        input: UpdateGameInput,
    ) -> Result<GameEntity, ServiceError> {
        input.validate()?;
        ensure_valid_window(input.starts_at, input.ends_at)?;

        let game = self.require_game(game_id).await?;
        if input.max_capacity < game.player_count {
            return Err(ServiceError::InvalidInput(format!(
                "capacity {} is below the current player count {}",
                input.max_capacity, game.player_count
            )));
        }

        let updated = apply_update(game, input);
        if !self.store.replace_game(updated.clone()).await? {
            return Err(ServiceError::NotFound(format!(
                "game `{game_id}` not found"
            )));
        }

        info!(game_id = %game_id, "updated game");
        Ok(updated)
    }

    /// Deletes a game, detaches it from every user's `games` list, and asks
    /// the media backend to drop the game's media folder.
    pub async fn remove(&self, game_id: Uuid) -> Result<RemovedGame, ServiceError> {
        let Some(game) = self.store.delete_game(game_id).await? else {
            return Err(ServiceError::NotFound(format!(
                "game `{game_id}` not found"
            )));
        };

        let detached = self.store.detach_game_from_users(game_id).await?;
        debug!(game_id = %game_id, detached, "detached removed game from user lists");

        if let Some(media) = &self.media {
            media.delete_game_media(game_id).await?;
        } else {
            debug!(game_id = %game_id, "no media backend configured; skipping media cleanup");
        }

        info!(game_id = %game_id, name = %game.name, "removed game");
        Ok(RemovedGame {
            id: game.id,
            name: game.name,
        })
    }

    /// Marks every unexpired game whose end time has passed as expired.
    /// Returns how many games were flipped.
    pub async fn expire_elapsed_games(&self, now: SystemTime) -> Result<u64, ServiceError> {
        let expired = self.store.expire_games(now).await?;
        info!(cutoff = %format_system_time(now), expired, "expiry sweep finished");
        Ok(expired)
    }

    /// Stores a new image for the game and records its URL.
    pub async fn edit_game_image(
        &self,
        game_id: Uuid,
        upload: ImageUpload,
    ) -> Result<GameEntity, ServiceError> {
        let game = self.require_game(game_id).await?;
        let Some(media) = &self.media else {
            return Err(ServiceError::MediaUnavailable);
        };

        let image_url = media.store_game_image(game_id, upload).await?;

        let mut updated = game;
        updated.image_url = image_url;
        updated.updated_at = SystemTime::now();
        if !self.store.replace_game(updated.clone()).await? {
            return Err(ServiceError::NotFound(format!(
                "game `{game_id}` not found"
            )));
        }

        info!(game_id = %game_id, "updated game image");
        Ok(updated)
    }

    /// Pings the storage backend.
    pub async fn health_check(&self) -> Result<(), ServiceError> {
        Ok(self.store.health_check().await?)
    }

    /// Asks the storage backend to re-establish its connection.
    pub async fn try_reconnect(&self) -> Result<(), ServiceError> {
        Ok(self.store.try_reconnect().await?)
    }

    async fn require_game(&self, game_id: Uuid) -> Result<GameEntity, ServiceError> {
        let Some(game) = self.store.find_game(game_id).await? else {
            return Err(ServiceError::NotFound(format!(
                "game `{game_id}` not found"
            )));
        };
        Ok(game)
    }
}

fn ensure_valid_window(starts_at: SystemTime, ends_at: SystemTime) -> Result<(), ServiceError> {
    if starts_at >= ends_at {
        return Err(ServiceError::InvalidInput(
            "the game must end after it starts".into(),
        ));
    }
    Ok(())
}

fn build_game(input: CreateGameInput, default_image: &str) -> GameEntity {
    let now = SystemTime::now();
    GameEntity {
        id: Uuid::new_v4(),
        name: input.name.trim().to_owned(),
        description: input.description.trim().to_owned(),
        location: input.location.trim().to_owned(),
        max_capacity: input.max_capacity,
        starts_at: input.starts_at,
        ends_at: input.ends_at,
        players: vec![input.organizer],
        player_count: 1,
        group_id: input.group_id,
        organizer: input.organizer,
        comments: Vec::new(),
        image_url: default_image.to_owned(),
        map: String::new(),
        directions: String::new(),
        expired: false,
        link: input.link,
        link_desc: input.link_desc,
        created_at: now,
        updated_at: now,
    }
}

fn apply_update(game: GameEntity, input: UpdateGameInput) -> GameEntity {
    GameEntity {
        id: game.id,
        name: input.name.trim().to_owned(),
        description: input.description.trim().to_owned(),
        location: input.location.trim().to_owned(),
        max_capacity: input.max_capacity,
        starts_at: input.starts_at,
        ends_at: input.ends_at,
        players: game.players,
        player_count: game.player_count,
        group_id: input.group_id,
        organizer: game.organizer,
        comments: game.comments,
        image_url: input.image_url.unwrap_or(game.image_url),
        map: input.map,
        directions: input.directions,
        expired: input.expired.unwrap_or(game.expired),
        link: input.link,
        link_desc: input.link_desc,
        created_at: game.created_at,
        updated_at: SystemTime::now(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn sample_input() -> CreateGameInput {
        let starts_at = SystemTime::now() + Duration::from_secs(3600);
        CreateGameInput {
            name: "  Friday Night Futsal  ".to_owned(),
            description: "Weekly five-a-side".to_owned(),
            location: "Riverside court".to_owned(),
            max_capacity: 10,
            starts_at,
            ends_at: starts_at + Duration::from_secs(7200),
            group_id: Uuid::new_v4(),
            organizer: Uuid::new_v4(),
            link: None,
            link_desc: None,
        }
    }

    #[test]
    fn built_game_starts_with_the_organizer_only() {
        let input = sample_input();
        let organizer = input.organizer;
        let game = build_game(input, "https://img.example/default.png");

        assert_eq!(game.players, vec![organizer]);
        assert_eq!(game.player_count, 1);
        assert_eq!(game.organizer, organizer);
        assert!(game.comments.is_empty());
        assert!(!game.expired);
        assert_eq!(game.image_url, "https://img.example/default.png");
        assert_eq!(game.name, "Friday Night Futsal");
    }

    #[test]
    fn update_preserves_membership_and_audit_fields() {
        let game = build_game(sample_input(), "https://img.example/default.png");
        let created_at = game.created_at;
        let players = game.players.clone();
        let new_group = Uuid::new_v4();

        let input = UpdateGameInput {
            name: "Renamed".to_owned(),
            description: "Changed".to_owned(),
            location: "Elsewhere".to_owned(),
            max_capacity: 12,
            starts_at: game.starts_at,
            ends_at: game.ends_at,
            group_id: new_group,
            map: "court-3".to_owned(),
            directions: "second gate".to_owned(),
            link: Some("https://example.com/rules".to_owned()),
            link_desc: Some("house rules".to_owned()),
            image_url: None,
            expired: None,
        };
        let updated = apply_update(game, input);

        assert_eq!(updated.players, players);
        assert_eq!(updated.player_count, 1);
        assert_eq!(updated.created_at, created_at);
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.group_id, new_group);
        assert_eq!(updated.map, "court-3");
        assert_eq!(updated.image_url, "https://img.example/default.png");
        assert!(!updated.expired);
    }

    #[test]
    fn update_overrides_image_and_expiry_only_when_set() {
        let game = build_game(sample_input(), "https://img.example/default.png");
        let input = UpdateGameInput {
            name: "Renamed".to_owned(),
            description: "Changed".to_owned(),
            location: "Elsewhere".to_owned(),
            max_capacity: 12,
            starts_at: game.starts_at,
            ends_at: game.ends_at,
            group_id: game.group_id,
            map: String::new(),
            directions: String::new(),
            link: None,
            link_desc: None,
            image_url: Some("https://img.example/new.png".to_owned()),
            expired: Some(true),
        };
        let updated = apply_update(game, input);

        assert_eq!(updated.image_url, "https://img.example/new.png");
        assert!(updated.expired);
    }

    #[test]
    fn window_must_end_after_it_starts() {
        let now = SystemTime::now();
        assert!(ensure_valid_window(now, now + Duration::from_secs(1)).is_ok());
        assert!(ensure_valid_window(now, now).is_err());
        assert!(ensure_valid_window(now + Duration::from_secs(1), now).is_err());
    }
}
