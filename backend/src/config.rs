use cineteca_config::{CONFIG_BACKEND, ConfigBackend, ConfigError};
use cineteca_core::services::{SearchOrdering, ServiceOptions};
use serde::{Deserialize, Serialize};

/// Sección `[service]` de cineteca.toml.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
  pub search_ordering: SearchOrdering,
  pub event_capacity: usize,
}

impl Default for ServiceConfig {
  fn default() -> Self {
    let defaults = ServiceOptions::default();
    ServiceConfig { search_ordering: defaults.search_ordering, event_capacity: defaults.event_capacity }
  }
}

impl ServiceConfig {
  pub fn load() -> Result<Self, ConfigError> {
    let cfg = CONFIG_BACKEND.load_section_with_default("service")?;
    CONFIG_BACKEND.save_section("service", &cfg)?;
    Ok(cfg)
  }

  pub fn save(&self) -> Result<(), ConfigError> {
    CONFIG_BACKEND.save_section("service", self)
  }
}

impl From<&ServiceConfig> for ServiceOptions {
  fn from(cfg: &ServiceConfig) -> Self {
    ServiceOptions { search_ordering: cfg.search_ordering, event_capacity: cfg.event_capacity }
  }
}
