use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::ids::MovieId;
use crate::domain::movie::{FavoriteEntry, Movie};
use crate::ports::feed::FavoritesFeed;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
  #[error("storage error: {0}")]
  Storage(String),

  #[error("lock poisoned: {0}")]
  Poisoned(String),
}

/// Forma en la que un store persiste los favoritos.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreLayout {
  /// Tabla propia de favoritos: que exista la fila = es favorita.
  #[default]
  Dedicated,
  /// Caché de toda película vista, con un flag `is_favorite` por fila.
  UnifiedCache,
}

impl StoreLayout {
  /// Solo la caché unificada guarda los resultados de búsqueda.
  pub fn caches_search_results(self) -> bool {
    matches!(self, StoreLayout::UnifiedCache)
  }
}

/// Resultado de invertir la membresía de una película.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteToggle {
  Added,
  Removed,
}

/// Port del almacén local de favoritos.
///
/// Contrato que el núcleo asume:
/// - El store es la autoridad: serializa sus propias escrituras.
/// - Cada suscriptor de [`FavoritesStore::subscribe`] recibe primero la foto
///   actual y después exactamente una foto por cada `upsert`/`remove`
///   confirmado, en orden de commit.
/// - El orden de las fotos es el de inserción.
/// - `toggle` lee y escribe en un solo paso: dos llamadas solapadas sobre
///   el mismo id siempre dan `Added` y `Removed`, nunca dos veces lo mismo.
#[async_trait]
pub trait FavoritesStore: Send + Sync {
  fn layout(&self) -> StoreLayout;

  async fn subscribe(&self) -> Result<FavoritesFeed, StoreError>;

  async fn get_all(&self) -> Result<Vec<FavoriteEntry>, StoreError>;

  async fn get_by_id(&self, id: MovieId) -> Result<Option<FavoriteEntry>, StoreError>;

  async fn upsert(&self, entry: &FavoriteEntry) -> Result<(), StoreError>;

  async fn remove(&self, entry: &FavoriteEntry) -> Result<(), StoreError>;

  /// Quita `entry` si es favorita y si no la añade, de forma atómica.
  async fn toggle(&self, entry: &FavoriteEntry) -> Result<FavoriteToggle, StoreError>;

  /// Guarda en caché una tanda de resultados conservando el flag previo de
  /// cada película (`false` si nunca se vio). Sin efecto en `Dedicated`.
  async fn cache_movies(&self, movies: &[Movie]) -> Result<(), StoreError>;
}

#[async_trait]
impl<S> FavoritesStore for Arc<S>
where
  S: FavoritesStore + ?Sized,
{
  fn layout(&self) -> StoreLayout {
    (**self).layout()
  }

  async fn subscribe(&self) -> Result<FavoritesFeed, StoreError> {
    (**self).subscribe().await
  }

  async fn get_all(&self) -> Result<Vec<FavoriteEntry>, StoreError> {
    (**self).get_all().await
  }

  async fn get_by_id(&self, id: MovieId) -> Result<Option<FavoriteEntry>, StoreError> {
    (**self).get_by_id(id).await
  }

  async fn upsert(&self, entry: &FavoriteEntry) -> Result<(), StoreError> {
    (**self).upsert(entry).await
  }

  async fn remove(&self, entry: &FavoriteEntry) -> Result<(), StoreError> {
    (**self).remove(entry).await
  }

  async fn toggle(&self, entry: &FavoriteEntry) -> Result<FavoriteToggle, StoreError> {
    (**self).toggle(entry).await
  }

  async fn cache_movies(&self, movies: &[Movie]) -> Result<(), StoreError> {
    (**self).cache_movies(movies).await
  }
}
