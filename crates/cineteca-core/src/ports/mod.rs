pub mod catalog;
pub mod favorites;
pub mod feed;

pub use catalog::{CatalogClient, CatalogError};
pub use favorites::{FavoriteToggle, FavoritesStore, StoreError, StoreLayout};
pub use feed::{FavoritesFeed, FeedHub};
