use thiserror::Error;

use crate::ports::catalog::CatalogError;
use crate::ports::favorites::StoreError;

/// Error genérico del núcleo de Cineteca.
///
/// Las capas superiores (UI, CLI, etc.) deberían mapear este error
/// a mensajes de usuario o logs.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
  #[error("catalog error: {0}")]
  Catalog(#[from] CatalogError),

  #[error("store error: {0}")]
  Store(#[from] StoreError),
}
