use cineteca_config::{CONFIG_BACKEND, ConfigBackend, ConfigError};
use serde::{Deserialize, Serialize};

/// Variable de entorno que, si existe, manda sobre `api_token`.
pub const TOKEN_ENV: &str = "CINETECA_TMDB_TOKEN";

/// Sección `[catalog]` de cineteca.toml.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CatalogConfig {
  #[serde(default = "default_base_url")]
  pub base_url: String,

  /// Prefijo para pósters y fondos (`{image_base_url}/{poster_path}`).
  #[serde(default = "default_image_base_url")]
  pub image_base_url: String,

  /// Token "API Read Access" de TMDB. Mejor dejarlo fuera del archivo y
  /// usar la variable de entorno.
  pub api_token: Option<String>,

  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

fn default_base_url() -> String {
  "https://api.themoviedb.org/3/".into()
}

fn default_image_base_url() -> String {
  "https://image.tmdb.org/t/p/w500".into()
}

fn default_timeout_secs() -> u64 {
  15
}

impl Default for CatalogConfig {
  fn default() -> Self {
    CatalogConfig {
      base_url: default_base_url(),
      image_base_url: default_image_base_url(),
      api_token: None,
      timeout_secs: default_timeout_secs(),
    }
  }
}

impl CatalogConfig {
  pub fn load() -> Result<Self, ConfigError> {
    let cfg = CONFIG_BACKEND.load_section_with_default("catalog")?;
    CONFIG_BACKEND.save_section("catalog", &cfg)?;
    Ok(cfg)
  }

  pub fn save(&self) -> Result<(), ConfigError> {
    CONFIG_BACKEND.save_section("catalog", self)
  }

  /// Token efectivo: el de entorno si está definido y no es vacío, si no el
  /// del archivo.
  pub fn resolved_token(&self) -> Option<String> {
    pick_token(std::env::var(TOKEN_ENV).ok(), self.api_token.as_deref())
  }
}

fn pick_token(env: Option<String>, file: Option<&str>) -> Option<String> {
  let clean = |t: &str| Some(t.trim().to_string()).filter(|t| !t.is_empty());
  env.as_deref().and_then(clean).or_else(|| file.and_then(clean))
}
