mod atomic;
mod backend;
mod paths;

pub use atomic::atomic_write_str;
pub use backend::{ConfigBackend, TomlConfigBackend};
pub use paths::{BASE_DIR_ENV, CinetecaPaths, ConfigError};

use once_cell::sync::Lazy;

// Singleton de paths (portable / system)
pub static PATHS: Lazy<CinetecaPaths> =
  Lazy::new(|| CinetecaPaths::new().expect("failed to init CinetecaPaths"));

// Singleton del backend de config
pub static CONFIG_BACKEND: Lazy<TomlConfigBackend> =
  Lazy::new(|| TomlConfigBackend::new(PATHS.clone()));
