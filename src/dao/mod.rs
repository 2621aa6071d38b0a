/// Game storage backends and the [`game_store::GameStore`] trait.
pub mod game_store;
/// Database entity definitions.
pub mod models;
/// Storage abstraction layer for database failures.
pub mod storage;
