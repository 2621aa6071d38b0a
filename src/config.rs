//! Application-level configuration loading.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the service looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "MATCHDAY_BACK_CONFIG_PATH";
/// Image assigned to games created without one.
const DEFAULT_GAME_IMAGE: &str =
    "https://storage.googleapis.com/matchday-media/defaults/game.png";
/// How many games a name search returns at most.
const DEFAULT_SEARCH_RESULT_LIMIT: i64 = 10;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    default_game_image: String,
    search_result_limit: i64,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the
    /// baked-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(path = %path.display(), "loaded configuration");
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// URL assigned to games created without an image.
    pub fn default_game_image(&self) -> &str {
        &self.default_game_image
    }

    /// Maximum number of games a name search returns.
    pub fn search_result_limit(&self) -> i64 {
        self.search_result_limit
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_game_image: DEFAULT_GAME_IMAGE.to_owned(),
            search_result_limit: DEFAULT_SEARCH_RESULT_LIMIT,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
/// Every field is optional; missing entries keep their baked-in default.
struct RawConfig {
    default_game_image: Option<String>,
    search_result_limit: Option<i64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            default_game_image: value
                .default_game_image
                .unwrap_or_else(|| DEFAULT_GAME_IMAGE.to_owned()),
            search_result_limit: value
                .search_result_limit
                .unwrap_or(DEFAULT_SEARCH_RESULT_LIMIT),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
