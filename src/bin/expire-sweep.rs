//! One-shot expiry sweep over the games collection, meant to be run on a
//! schedule (cron). Marks every unexpired game whose end time has passed.

use std::{sync::Arc, time::SystemTime};

use anyhow::Context;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use matchday_back::{
    config::AppConfig,
    dao::game_store::mongodb::{MongoConfig, MongoGameStore},
    services::games::GamesService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let mongo_config = MongoConfig::from_env()
        .await
        .context("reading MongoDB configuration")?;
    let store = MongoGameStore::connect(mongo_config)
        .await
        .context("connecting to MongoDB")?;

    let service = GamesService::new(Arc::new(store), AppConfig::load());

    if let Err(err) = service.health_check().await {
        warn!(error = %err, "storage ping failed; reconnecting before the sweep");
        service
            .try_reconnect()
            .await
            .context("reconnecting to storage")?;
    }

    service
        .expire_elapsed_games(SystemTime::now())
        .await
        .context("running the expiry sweep")?;

    Ok(())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
