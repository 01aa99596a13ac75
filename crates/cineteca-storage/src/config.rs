use cineteca_config::{CONFIG_BACKEND, ConfigBackend, ConfigError, PATHS};
use cineteca_core::ports::StoreLayout;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Qué adapter de favoritos monta la app.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
  /// Sin persistencia; se pierde al cerrar.
  Memory,
  #[default]
  Sqlite,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
  pub backend: StorageBackend,
  pub layout: StoreLayout,
  pub db_path: PathBuf,
  pub journal_mode: Option<String>,
  pub pool_size: u32,
}

impl Default for StorageConfig {
  fn default() -> Self {
    let db_path = PATHS.data_dir.join("cineteca.db");
    StorageConfig {
      backend: StorageBackend::default(),
      layout: StoreLayout::default(),
      db_path,
      journal_mode: Some("WAL".to_string()),
      pool_size: 4,
    }
  }
}

impl StorageConfig {
  pub fn load() -> Result<Self, ConfigError> {
    let cfg = CONFIG_BACKEND.load_section_with_default("storage")?;
    CONFIG_BACKEND.save_section("storage", &cfg)?;
    Ok(cfg)
  }

  pub fn save(&self) -> Result<(), ConfigError> {
    CONFIG_BACKEND.save_section("storage", self)
  }
}
