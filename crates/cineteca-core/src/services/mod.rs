pub mod catalog_service;

pub use catalog_service::{
  FavoriteToggle, MovieCatalogService, SearchOrdering, ServiceEvent, ServiceOptions,
};
