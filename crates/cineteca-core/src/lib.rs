pub mod domain;
pub mod errors;
pub mod ports;
pub mod services;
pub mod stores;

pub use errors::CoreError;
