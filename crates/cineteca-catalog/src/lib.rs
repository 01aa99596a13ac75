pub mod client;
pub mod config;
mod dto;

pub use client::{ClientError, TmdbCatalogClient};
pub use config::CatalogConfig;
