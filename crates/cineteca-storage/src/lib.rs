pub mod config;
pub mod connection;
pub mod models;
pub mod schema;
pub mod sqlite;

pub use config::{StorageBackend, StorageConfig};
pub use sqlite::SqliteFavoritesStore;
