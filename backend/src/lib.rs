mod config;
mod infrastructure;
pub mod view;

use std::sync::Arc;

use anyhow::Context;
use cineteca_catalog::{CatalogConfig, TmdbCatalogClient};
use cineteca_core::domain::Movie;
use cineteca_core::ports::FavoritesStore;
use cineteca_core::services::{MovieCatalogService, ServiceOptions};
use cineteca_core::stores::MemoryFavoritesStore;
use cineteca_storage::{SqliteFavoritesStore, StorageBackend, StorageConfig};
use tracing::info;

pub use crate::config::ServiceConfig;
pub use crate::infrastructure::tracing::{LOG_FILE_ENV, init_tracing};
use crate::view::{MovieCardDto, SearchStateDto};

/// Servicio con los adapters de producción: TMDB y el store que diga la
/// configuración.
pub type AppCatalogService = MovieCatalogService<TmdbCatalogClient, Arc<dyn FavoritesStore>>;

/// Estado global que la UI mantiene vivo mientras corre la app.
#[derive(Clone)]
pub struct AppState {
  pub catalog: AppCatalogService,
  image_base_url: String,
}

impl AppState {
  pub fn image_base_url(&self) -> &str {
    &self.image_base_url
  }

  /// Estado de búsqueda listo para pintar, con el filtro de favoritos ya
  /// aplicado.
  pub fn search_view(&self) -> SearchStateDto {
    let state = self.catalog.state();
    let displayed = self.catalog.displayed();
    SearchStateDto::render(&state, &displayed, &self.image_base_url, |m| self.catalog.is_favorite(m))
  }

  pub fn favorites_view(&self) -> Vec<MovieCardDto> {
    self.catalog.favorites().iter().map(|m| MovieCardDto::from_movie(m, &self.image_base_url, true)).collect()
  }

  /// Tarjeta de la película seleccionada para la pantalla de detalle.
  pub fn detail_view(&self) -> Option<MovieCardDto> {
    self.catalog.selected().map(|m: Movie| {
      let fav = self.catalog.is_favorite(&m);
      MovieCardDto::from_movie(&m, &self.image_base_url, fav)
    })
  }
}

/// Carga la configuración desde cineteca.toml y monta el estado completo.
pub async fn bootstrap() -> anyhow::Result<AppState> {
  let catalog = CatalogConfig::load().context("loading [catalog] config")?;
  let storage = StorageConfig::load().context("loading [storage] config")?;
  let service = ServiceConfig::load().context("loading [service] config")?;
  build_state(&catalog, &storage, &service).await
}

pub async fn build_state(
  catalog_cfg: &CatalogConfig,
  storage_cfg: &StorageConfig,
  service_cfg: &ServiceConfig,
) -> anyhow::Result<AppState> {
  // --- Dependency Injection Phase ---

  // 1. Persistence Adapter
  let store = open_store(storage_cfg)?;

  // 2. Catalog Adapter (TMDB over HTTP)
  let client = TmdbCatalogClient::from_config(catalog_cfg).context("building TMDB client")?;

  // 3. Service Wiring
  let catalog = MovieCatalogService::new(client, store, ServiceOptions::from(service_cfg))
    .await
    .context("starting movie catalog service")?;

  info!(
    backend = ?storage_cfg.backend,
    layout = ?storage_cfg.layout,
    ordering = ?service_cfg.search_ordering,
    "cineteca ready"
  );

  Ok(AppState { catalog, image_base_url: catalog_cfg.image_base_url.clone() })
}

/// Elige el adapter de favoritos según `[storage].backend`.
pub fn open_store(cfg: &StorageConfig) -> anyhow::Result<Arc<dyn FavoritesStore>> {
  let store: Arc<dyn FavoritesStore> = match cfg.backend {
    StorageBackend::Memory => Arc::new(MemoryFavoritesStore::with_layout(cfg.layout)),
    StorageBackend::Sqlite => Arc::new(
      SqliteFavoritesStore::from_config(cfg)
        .with_context(|| format!("opening favorites database at {}", cfg.db_path.display()))?,
    ),
  };
  Ok(store)
}
