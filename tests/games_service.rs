#![cfg(feature = "memory-store")]

use std::{
    sync::{Arc, Mutex},
    time::{Duration, SystemTime},
};

use futures::future::BoxFuture;
use uuid::Uuid;

use matchday_back::{
    config::AppConfig,
    dao::{
        game_store::{GameStore, memory::InMemoryGameStore},
        models::UserEntity,
    },
    dto::game::{CreateGameInput, GameSummary, UpdateGameInput},
    error::ServiceError,
    media::{ImageUpload, MediaError, MediaResult, MediaStore},
    services::games::GamesService,
};

/// Media backend double recording every call so tests can assert the cascade.
#[derive(Default)]
struct RecordingMediaStore {
    stored: Mutex<Vec<Uuid>>,
    deleted: Mutex<Vec<Uuid>>,
    failing_deletes: bool,
}

impl MediaStore for RecordingMediaStore {
    fn store_game_image(
        &self,
        game_id: Uuid,
        upload: ImageUpload,
    ) -> BoxFuture<'static, MediaResult<String>> {
        self.stored.lock().unwrap().push(game_id);
        let url = format!("https://media.test/games/{game_id}/{}", upload.file_name);
        Box::pin(async move { Ok(url) })
    }

    fn delete_game_media(&self, game_id: Uuid) -> BoxFuture<'static, MediaResult<()>> {
        if self.failing_deletes {
            return Box::pin(async {
                Err(MediaError::backend(
                    "media backend offline",
                    std::io::Error::other("connection refused"),
                ))
            });
        }
        self.deleted.lock().unwrap().push(game_id);
        Box::pin(async move { Ok(()) })
    }
}

struct TestSetup {
    service: GamesService,
    store: InMemoryGameStore,
    media: Arc<RecordingMediaStore>,
}

fn setup() -> TestSetup {
    setup_with_media(RecordingMediaStore::default())
}

fn setup_with_failing_media() -> TestSetup {
    setup_with_media(RecordingMediaStore {
        failing_deletes: true,
        ..RecordingMediaStore::default()
    })
}

fn setup_with_media(media: RecordingMediaStore) -> TestSetup {
    let store = InMemoryGameStore::new();
    let media = Arc::new(media);
    let service =
        GamesService::new(Arc::new(store.clone()), AppConfig::default()).with_media(media.clone());
    TestSetup {
        service,
        store,
        media,
    }
}

fn seed_user(store: &InMemoryGameStore, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    store.seed_user(UserEntity {
        id,
        display_name: name.to_owned(),
        games: Vec::new(),
    });
    id
}

fn game_input(name: &str, group_id: Uuid, organizer: Uuid) -> CreateGameInput {
    let starts_at = SystemTime::now() + Duration::from_secs(3600);
    CreateGameInput {
        name: name.to_owned(),
        description: "Pickup game".to_owned(),
        location: "Main hall".to_owned(),
        max_capacity: 3,
        starts_at,
        ends_at: starts_at + Duration::from_secs(7200),
        group_id,
        organizer,
        link: None,
        link_desc: None,
    }
}

fn update_input(name: &str, max_capacity: u32, group_id: Uuid) -> UpdateGameInput {
    let starts_at = SystemTime::now() + Duration::from_secs(3600);
    UpdateGameInput {
        name: name.to_owned(),
        description: "Rescheduled pickup game".to_owned(),
        location: "Side hall".to_owned(),
        max_capacity,
        starts_at,
        ends_at: starts_at + Duration::from_secs(7200),
        group_id,
        map: String::new(),
        directions: String::new(),
        link: None,
        link_desc: None,
        image_url: None,
        expired: None,
    }
}

async fn user_games(store: &InMemoryGameStore, user_id: Uuid) -> Vec<Uuid> {
    store
        .find_user(user_id)
        .await
        .unwrap()
        .expect("user should exist")
        .games
}

#[tokio::test]
async fn create_registers_the_organizer_as_sole_player() {
    let TestSetup { service, store, .. } = setup();
    let organizer = seed_user(&store, "Alice");
    let group_id = Uuid::new_v4();

    let game = service
        .create(game_input("Friday Night Futsal", group_id, organizer))
        .await
        .unwrap();

    assert_eq!(game.players, vec![organizer]);
    assert_eq!(game.player_count, 1);
    assert_eq!(game.organizer, organizer);
    assert!(!game.expired);
    assert!(game.comments.is_empty());
    assert_eq!(game.image_url, AppConfig::default().default_game_image());

    let stored = service.get(game.id).await.unwrap();
    assert_eq!(stored, game);
    assert_eq!(user_games(&store, organizer).await, vec![game.id]);
}

#[tokio::test]
async fn create_requires_a_known_organizer() {
    let TestSetup { service, .. } = setup();

    let result = service
        .create(game_input("Orphan game", Uuid::new_v4(), Uuid::new_v4()))
        .await;

    match result {
        Err(ServiceError::NotFound(_)) => {}
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn create_rejects_invalid_input() {
    let TestSetup { service, store, .. } = setup();
    let organizer = seed_user(&store, "Alice");
    let group_id = Uuid::new_v4();

    let blank_name = game_input("   ", group_id, organizer);
    let zero_capacity = {
        let mut input = game_input("No seats", group_id, organizer);
        input.max_capacity = 0;
        input
    };
    let inverted_window = {
        let mut input = game_input("Time travel", group_id, organizer);
        input.ends_at = input.starts_at - Duration::from_secs(60);
        input
    };

    for input in [blank_name, zero_capacity, inverted_window] {
        match service.create(input).await {
            Err(ServiceError::InvalidInput(_)) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }
}

#[tokio::test]
async fn malformed_links_are_rejected_on_create_and_update() {
    let TestSetup { service, store, .. } = setup();
    let organizer = seed_user(&store, "Alice");
    let group_id = Uuid::new_v4();

    let bad_link = {
        let mut input = game_input("Futsal", group_id, organizer);
        input.link = Some("not-a-url".to_owned());
        input
    };
    match service.create(bad_link).await {
        Err(ServiceError::InvalidInput(_)) => {}
        other => panic!("unexpected result: {other:?}"),
    }

    let game = service
        .create(game_input("Futsal", group_id, organizer))
        .await
        .unwrap();
    let mut input = update_input("Futsal", 3, game.group_id);
    input.link = Some("not-a-url".to_owned());
    match service.update(game.id, input).await {
        Err(ServiceError::InvalidInput(_)) => {}
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn join_adds_the_player_on_both_sides() {
    let TestSetup { service, store, .. } = setup();
    let organizer = seed_user(&store, "Alice");
    let bob = seed_user(&store, "Bob");
    let game = service
        .create(game_input("Futsal", Uuid::new_v4(), organizer))
        .await
        .unwrap();

    service.join(game.id, bob).await.unwrap();

    let stored = service.get(game.id).await.unwrap();
    assert_eq!(stored.player_count, 2);
    assert!(stored.players.contains(&bob));
    assert_eq!(stored.players.len() as u32, stored.player_count);
    assert_eq!(user_games(&store, bob).await, vec![game.id]);
}

#[tokio::test]
async fn join_rejects_duplicate_membership() {
    let TestSetup { service, store, .. } = setup();
    let organizer = seed_user(&store, "Alice");
    let bob = seed_user(&store, "Bob");
    let game = service
        .create(game_input("Futsal", Uuid::new_v4(), organizer))
        .await
        .unwrap();

    match service.join(game.id, organizer).await {
        Err(ServiceError::AlreadyJoined { game_id, user_id }) => {
            assert_eq!(game_id, game.id);
            assert_eq!(user_id, organizer);
        }
        other => panic!("unexpected result: {other:?}"),
    }

    service.join(game.id, bob).await.unwrap();
    match service.join(game.id, bob).await {
        Err(ServiceError::AlreadyJoined { .. }) => {}
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn join_refuses_a_full_game() {
    let TestSetup { service, store, .. } = setup();
    let organizer = seed_user(&store, "Alice");
    let bob = seed_user(&store, "Bob");
    let carol = seed_user(&store, "Carol");
    let dave = seed_user(&store, "Dave");
    // Capacity 3: organizer plus two joiners.
    let game = service
        .create(game_input("Futsal", Uuid::new_v4(), organizer))
        .await
        .unwrap();

    service.join(game.id, bob).await.unwrap();
    service.join(game.id, carol).await.unwrap();

    match service.join(game.id, dave).await {
        Err(ServiceError::GameFull {
            game_id,
            max_capacity,
        }) => {
            assert_eq!(game_id, game.id);
            assert_eq!(max_capacity, 3);
        }
        other => panic!("unexpected result: {other:?}"),
    }

    let stored = service.get(game.id).await.unwrap();
    assert_eq!(stored.player_count, 3);
}

#[tokio::test]
async fn join_reports_fullness_before_duplicate_membership() {
    let TestSetup { service, store, .. } = setup();
    let organizer = seed_user(&store, "Alice");
    let game = {
        let mut input = game_input("Solo session", Uuid::new_v4(), organizer);
        input.max_capacity = 1;
        service.create(input).await.unwrap()
    };

    // The organizer already fills the game; the capacity error wins.
    match service.join(game.id, organizer).await {
        Err(ServiceError::GameFull {
            game_id,
            max_capacity,
        }) => {
            assert_eq!(game_id, game.id);
            assert_eq!(max_capacity, 1);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn join_requires_an_existing_user() {
    let TestSetup { service, store, .. } = setup();
    let organizer = seed_user(&store, "Alice");
    let game = service
        .create(game_input("Futsal", Uuid::new_v4(), organizer))
        .await
        .unwrap();

    match service.join(game.id, Uuid::new_v4()).await {
        Err(ServiceError::NotFound(_)) => {}
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn leave_removes_the_player_on_both_sides() {
    let TestSetup { service, store, .. } = setup();
    let organizer = seed_user(&store, "Alice");
    let bob = seed_user(&store, "Bob");
    let game = service
        .create(game_input("Futsal", Uuid::new_v4(), organizer))
        .await
        .unwrap();
    service.join(game.id, bob).await.unwrap();

    service.leave(game.id, bob).await.unwrap();

    let stored = service.get(game.id).await.unwrap();
    assert_eq!(stored.player_count, 1);
    assert!(!stored.players.contains(&bob));
    assert!(user_games(&store, bob).await.is_empty());
}

#[tokio::test]
async fn leave_enforces_membership_and_protects_the_organizer() {
    let TestSetup { service, store, .. } = setup();
    let organizer = seed_user(&store, "Alice");
    let carol = seed_user(&store, "Carol");
    let game = service
        .create(game_input("Futsal", Uuid::new_v4(), organizer))
        .await
        .unwrap();

    match service.leave(game.id, carol).await {
        Err(ServiceError::NotAPlayer { game_id, user_id }) => {
            assert_eq!(game_id, game.id);
            assert_eq!(user_id, carol);
        }
        other => panic!("unexpected result: {other:?}"),
    }

    match service.leave(game.id, organizer).await {
        Err(ServiceError::OrganizerCannotLeave { game_id }) => {
            assert_eq!(game_id, game.id);
        }
        other => panic!("unexpected result: {other:?}"),
    }

    let stored = service.get(game.id).await.unwrap();
    assert_eq!(stored.players, vec![organizer]);
}

#[tokio::test]
async fn comments_append_and_remove() {
    let TestSetup { service, store, .. } = setup();
    let organizer = seed_user(&store, "Alice");
    let game = service
        .create(game_input("Futsal", Uuid::new_v4(), organizer))
        .await
        .unwrap();

    let comment = service
        .add_comment(game.id, organizer, "  See you there!  ")
        .await
        .unwrap();
    assert_eq!(comment.text, "See you there!");
    assert_eq!(comment.author, organizer);

    let stored = service.get(game.id).await.unwrap();
    assert_eq!(stored.comments.len(), 1);
    assert_eq!(stored.comments[0], comment);

    service.remove_comment(game.id, comment.id).await.unwrap();
    assert!(service.get(game.id).await.unwrap().comments.is_empty());

    match service.remove_comment(game.id, comment.id).await {
        Err(ServiceError::NotFound(_)) => {}
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn comments_require_membership_and_text() {
    let TestSetup { service, store, .. } = setup();
    let organizer = seed_user(&store, "Alice");
    let bob = seed_user(&store, "Bob");
    let game = service
        .create(game_input("Futsal", Uuid::new_v4(), organizer))
        .await
        .unwrap();

    match service.add_comment(game.id, bob, "Can I come?").await {
        Err(ServiceError::NotAPlayer { user_id, .. }) => assert_eq!(user_id, bob),
        other => panic!("unexpected result: {other:?}"),
    }

    match service.add_comment(game.id, organizer, "   ").await {
        Err(ServiceError::InvalidInput(_)) => {}
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn search_matches_substrings_case_insensitively() {
    let TestSetup { service, store, .. } = setup();
    let organizer = seed_user(&store, "Alice");
    let group_id = Uuid::new_v4();

    for name in ["Friday Night Futsal", "Sunday Futsal", "Basketball"] {
        service
            .create(game_input(name, group_id, organizer))
            .await
            .unwrap();
    }

    assert_eq!(service.search("futsal").await.unwrap().len(), 2);
    assert_eq!(service.search("FUTSAL").await.unwrap().len(), 2);
    assert_eq!(service.search("basket").await.unwrap().len(), 1);
    assert!(service.search("tennis").await.unwrap().is_empty());

    match service.search("   ").await {
        Err(ServiceError::InvalidInput(_)) => {}
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn search_caps_the_result_count() {
    let TestSetup { service, store, .. } = setup();
    let organizer = seed_user(&store, "Alice");
    let group_id = Uuid::new_v4();

    for i in 0..12 {
        service
            .create(game_input(&format!("Pickup {i}"), group_id, organizer))
            .await
            .unwrap();
    }

    let found = service.search("pickup").await.unwrap();
    assert_eq!(found.len(), 10);
}

#[tokio::test]
async fn update_replaces_fields_but_preserves_membership() {
    let TestSetup { service, store, .. } = setup();
    let organizer = seed_user(&store, "Alice");
    let bob = seed_user(&store, "Bob");
    let game = service
        .create(game_input("Futsal", Uuid::new_v4(), organizer))
        .await
        .unwrap();
    service.join(game.id, bob).await.unwrap();
    let comment = service
        .add_comment(game.id, organizer, "bring water")
        .await
        .unwrap();

    let updated = service
        .update(game.id, update_input("Futsal (rescheduled)", 5, game.group_id))
        .await
        .unwrap();

    assert_eq!(updated.name, "Futsal (rescheduled)");
    assert_eq!(updated.max_capacity, 5);
    assert_eq!(updated.players.len(), 2);
    assert_eq!(updated.player_count, 2);
    assert_eq!(updated.organizer, organizer);
    assert_eq!(updated.comments, vec![comment]);
    assert_eq!(updated.created_at, game.created_at);
    assert_eq!(updated.group_id, game.group_id);
    assert!(!updated.expired);
    assert_eq!(updated.image_url, game.image_url);
}

#[tokio::test]
async fn update_can_move_the_game_to_another_group() {
    let TestSetup { service, store, .. } = setup();
    let organizer = seed_user(&store, "Alice");
    let group_a = Uuid::new_v4();
    let group_b = Uuid::new_v4();
    let game = service
        .create(game_input("Futsal", group_a, organizer))
        .await
        .unwrap();

    let updated = service
        .update(game.id, update_input("Futsal", 3, group_b))
        .await
        .unwrap();
    assert_eq!(updated.group_id, group_b);

    assert!(
        service
            .list_by_group(group_a, false)
            .await
            .unwrap()
            .is_empty()
    );
    let in_b = service.list_by_group(group_b, false).await.unwrap();
    assert_eq!(in_b.len(), 1);
    assert_eq!(in_b[0].id, game.id);
}

#[tokio::test]
async fn update_can_override_the_expiry_flag() {
    let TestSetup { service, store, .. } = setup();
    let organizer = seed_user(&store, "Alice");
    let game = service
        .create(game_input("Futsal", Uuid::new_v4(), organizer))
        .await
        .unwrap();

    let mut input = update_input("Futsal", 3, game.group_id);
    input.expired = Some(true);
    let updated = service.update(game.id, input).await.unwrap();
    assert!(updated.expired);

    let visible = service.list(false).await.unwrap();
    assert!(visible.iter().all(|g| g.id != game.id));
    let all = service.list(true).await.unwrap();
    assert!(all.iter().any(|g| g.id == game.id));
}

#[tokio::test]
async fn update_refuses_capacity_below_the_player_count() {
    let TestSetup { service, store, .. } = setup();
    let organizer = seed_user(&store, "Alice");
    let bob = seed_user(&store, "Bob");
    let game = service
        .create(game_input("Futsal", Uuid::new_v4(), organizer))
        .await
        .unwrap();
    service.join(game.id, bob).await.unwrap();

    match service
        .update(game.id, update_input("Futsal", 1, game.group_id))
        .await
    {
        Err(ServiceError::InvalidInput(_)) => {}
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn update_of_a_missing_game_is_not_found() {
    let TestSetup { service, .. } = setup();

    match service
        .update(Uuid::new_v4(), update_input("Ghost", 4, Uuid::new_v4()))
        .await
    {
        Err(ServiceError::NotFound(_)) => {}
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn remove_cascades_to_users_and_media() {
    let TestSetup {
        service,
        store,
        media,
    } = setup();
    let organizer = seed_user(&store, "Alice");
    let bob = seed_user(&store, "Bob");
    let game = service
        .create(game_input("Futsal", Uuid::new_v4(), organizer))
        .await
        .unwrap();
    service.join(game.id, bob).await.unwrap();

    let removed = service.remove(game.id).await.unwrap();
    assert_eq!(removed.id, game.id);
    assert_eq!(removed.name, "Futsal");

    match service.get(game.id).await {
        Err(ServiceError::NotFound(_)) => {}
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(user_games(&store, organizer).await.is_empty());
    assert!(user_games(&store, bob).await.is_empty());
    assert_eq!(*media.deleted.lock().unwrap(), vec![game.id]);
}

#[tokio::test]
async fn remove_surfaces_media_failures_after_the_document_cascade() {
    let TestSetup { service, store, .. } = setup_with_failing_media();
    let organizer = seed_user(&store, "Alice");
    let game = service
        .create(game_input("Futsal", Uuid::new_v4(), organizer))
        .await
        .unwrap();

    match service.remove(game.id).await {
        Err(ServiceError::Media(_)) => {}
        other => panic!("unexpected result: {other:?}"),
    }

    // The game and the user links are already gone; only the media cleanup failed.
    match service.get(game.id).await {
        Err(ServiceError::NotFound(_)) => {}
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(user_games(&store, organizer).await.is_empty());
}

#[tokio::test]
async fn remove_of_a_missing_game_is_not_found() {
    let TestSetup { service, media, .. } = setup();

    match service.remove(Uuid::new_v4()).await {
        Err(ServiceError::NotFound(_)) => {}
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(media.deleted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn expiry_sweep_flips_exactly_the_elapsed_games() {
    let TestSetup { service, store, .. } = setup();
    let organizer = seed_user(&store, "Alice");
    let group_id = Uuid::new_v4();
    let cutoff = SystemTime::now();

    let elapsed = {
        let mut input = game_input("Last week", group_id, organizer);
        input.starts_at = cutoff - Duration::from_secs(7200);
        input.ends_at = cutoff - Duration::from_secs(3600);
        service.create(input).await.unwrap()
    };
    let ending_now = {
        let mut input = game_input("Ends right now", group_id, organizer);
        input.starts_at = cutoff - Duration::from_secs(3600);
        input.ends_at = cutoff;
        service.create(input).await.unwrap()
    };
    let upcoming = service
        .create(game_input("Next week", group_id, organizer))
        .await
        .unwrap();

    let flipped = service.expire_elapsed_games(cutoff).await.unwrap();
    assert_eq!(flipped, 2);

    assert!(service.get(elapsed.id).await.unwrap().expired);
    assert!(service.get(ending_now.id).await.unwrap().expired);
    assert!(!service.get(upcoming.id).await.unwrap().expired);

    let visible = service.list(false).await.unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, upcoming.id);

    // Already-expired games are not flipped twice.
    assert_eq!(service.expire_elapsed_games(cutoff).await.unwrap(), 0);
}

#[tokio::test]
async fn list_by_group_scopes_to_the_group() {
    let TestSetup { service, store, .. } = setup();
    let organizer = seed_user(&store, "Alice");
    let group_a = Uuid::new_v4();
    let group_b = Uuid::new_v4();

    let in_a = service
        .create(game_input("Group A futsal", group_a, organizer))
        .await
        .unwrap();
    service
        .create(game_input("Group B futsal", group_b, organizer))
        .await
        .unwrap();

    let games = service.list_by_group(group_a, false).await.unwrap();
    assert_eq!(games.len(), 1);
    assert_eq!(games[0].id, in_a.id);
}

#[tokio::test]
async fn edit_game_image_stores_the_upload_and_records_its_url() {
    let TestSetup {
        service,
        store,
        media,
    } = setup();
    let organizer = seed_user(&store, "Alice");
    let game = service
        .create(game_input("Futsal", Uuid::new_v4(), organizer))
        .await
        .unwrap();

    let upload = ImageUpload {
        file_name: "pitch.png".to_owned(),
        content_type: "image/png".to_owned(),
        bytes: vec![0x89, 0x50, 0x4e, 0x47],
    };
    let updated = service.edit_game_image(game.id, upload).await.unwrap();

    let expected_url = format!("https://media.test/games/{}/pitch.png", game.id);
    assert_eq!(updated.image_url, expected_url);
    assert_eq!(service.get(game.id).await.unwrap().image_url, expected_url);
    assert_eq!(*media.stored.lock().unwrap(), vec![game.id]);
}

#[tokio::test]
async fn game_summary_renders_rfc3339_timestamps() {
    let TestSetup { service, store, .. } = setup();
    let organizer = seed_user(&store, "Alice");
    let game = service
        .create(game_input("Futsal", Uuid::new_v4(), organizer))
        .await
        .unwrap();
    let comment = service
        .add_comment(game.id, organizer, "see you there")
        .await
        .unwrap();

    let summary = GameSummary::from(service.get(game.id).await.unwrap());
    assert_eq!(summary.id, game.id);
    assert_eq!(summary.name, "Futsal");
    assert!(summary.starts_at.contains('T'), "got {}", summary.starts_at);
    assert!(summary.created_at.ends_with('Z'), "got {}", summary.created_at);
    assert_eq!(summary.comments.len(), 1);
    assert_eq!(summary.comments[0].id, comment.id);
}

#[tokio::test]
async fn edit_game_image_without_a_media_backend_is_refused() {
    let store = InMemoryGameStore::new();
    let organizer = seed_user(&store, "Alice");
    let service = GamesService::new(Arc::new(store.clone()), AppConfig::default());
    let game = service
        .create(game_input("Futsal", Uuid::new_v4(), organizer))
        .await
        .unwrap();

    let upload = ImageUpload {
        file_name: "pitch.png".to_owned(),
        content_type: "image/png".to_owned(),
        bytes: Vec::new(),
    };
    match service.edit_game_image(game.id, upload).await {
        Err(ServiceError::MediaUnavailable) => {}
        other => panic!("unexpected result: {other:?}"),
    }
}
