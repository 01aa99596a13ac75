use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::movie::Movie;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogError {
  /// Red caída, timeout, TLS...
  #[error("transport error: {0}")]
  Transport(String),

  #[error("unexpected status {status}")]
  Status { status: u16 },

  #[error("deserialization error: {0}")]
  Deserialization(String),
}

/// Port del catálogo remoto: búsqueda libre por texto.
///
/// Es un pass-through. Nada de reintentos, paginación ni rate limiting; el
/// servicio ya recibe la consulta recortada y no vacía.
#[async_trait]
pub trait CatalogClient: Send + Sync {
  async fn search(&self, query: &str) -> Result<Vec<Movie>, CatalogError>;
}

#[async_trait]
impl<C> CatalogClient for Arc<C>
where
  C: CatalogClient + ?Sized,
{
  async fn search(&self, query: &str) -> Result<Vec<Movie>, CatalogError> {
    (**self).search(query).await
  }
}
