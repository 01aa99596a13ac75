use directories::ProjectDirs;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
  #[error("toml error: {0}")]
  Toml(#[from] toml::de::Error),
  #[error("directories error: could not determine home directory")]
  Directories,
  #[error("other: {0}")]
  Other(String),
}

#[derive(Debug, Clone)]
pub struct CinetecaPaths {
  pub base_dir: PathBuf,
  pub config_dir: PathBuf,
  pub data_dir: PathBuf,
  pub cache_dir: PathBuf,
}

/// Variable que fuerza el modo portable: todo cuelga de esa ruta.
pub const BASE_DIR_ENV: &str = "CINETECA_BASE_DIR";

impl CinetecaPaths {
  /// Resuelve los directorios de la app y los crea si faltan.
  pub fn new() -> Result<Self, ConfigError> {
    if let Some(base) = std::env::var_os(BASE_DIR_ENV).filter(|v| !v.is_empty()) {
      return Self::rooted(base);
    }

    let dirs = ProjectDirs::from("com", "cineteca", "cineteca").ok_or(ConfigError::Directories)?;
    let paths = CinetecaPaths {
      base_dir: dirs.config_dir().to_path_buf(),
      config_dir: dirs.config_dir().to_path_buf(),
      data_dir: dirs.data_dir().to_path_buf(),
      cache_dir: dirs.cache_dir().to_path_buf(),
    };
    paths.ensure()
  }

  /// `config/`, `data/` y `cache/` bajo una raíz fija.
  pub fn rooted(base: impl Into<PathBuf>) -> Result<Self, ConfigError> {
    let base = base.into();
    let paths = CinetecaPaths {
      config_dir: base.join("config"),
      data_dir: base.join("data"),
      cache_dir: base.join("cache"),
      base_dir: base,
    };
    paths.ensure()
  }

  fn ensure(self) -> Result<Self, ConfigError> {
    for dir in [&self.config_dir, &self.data_dir, &self.cache_dir] {
      std::fs::create_dir_all(dir)?;
    }
    Ok(self)
  }

  pub fn config_file(&self) -> PathBuf {
    self.config_dir.join("cineteca.toml")
  }
}
