pub mod ids;
pub mod movie;
pub mod search_result;

pub use ids::MovieId;
pub use movie::{FavoriteEntry, Movie};
pub use search_result::{SEARCH_FAILED_MESSAGE, SearchResult};
