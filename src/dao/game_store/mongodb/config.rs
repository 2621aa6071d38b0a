//! Connection settings for the MongoDB game store.

use mongodb::options::ClientOptions;

use super::error::{MongoDaoError, MongoResult};

/// Database used when `MONGO_DB` is not set and no explicit name is given.
const DEFAULT_DATABASE: &str = "matchday";

/// Parsed connection settings handed to [`super::MongoGameStore::connect`].
#[derive(Clone)]
pub struct MongoConfig {
    /// Driver options parsed from the connection URI.
    pub options: ClientOptions,
    /// Database holding the `games` and `users` collections.
    pub database_name: String,
}

impl MongoConfig {
    /// Parses a MongoDB connection URI, falling back to the default database
    /// name when none is provided.
    pub async fn from_uri(uri: &str, db_name: Option<&str>) -> MongoResult<Self> {
        let database_name = db_name.unwrap_or(DEFAULT_DATABASE).to_owned();
        let options =
            ClientOptions::parse(uri)
                .await
                .map_err(|source| MongoDaoError::InvalidUri {
                    uri: uri.to_owned(),
                    source,
                })?;

        Ok(Self {
            options,
            database_name,
        })
    }

    /// Builds the configuration from the `MONGO_URI` and `MONGO_DB`
    /// environment variables. `MONGO_URI` is required; `MONGO_DB` is optional.
    pub async fn from_env() -> MongoResult<Self> {
        let uri = std::env::var("MONGO_URI")
            .map_err(|_| MongoDaoError::MissingEnvVar { var: "MONGO_URI" })?;
        let db = std::env::var("MONGO_DB").ok();
        Self::from_uri(&uri, db.as_deref()).await
    }
}
