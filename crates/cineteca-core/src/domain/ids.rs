use serde::{Deserialize, Serialize};
use std::fmt;

/// Identificador numérico de una película en el catálogo remoto.
///
/// Lo asigna el catálogo y es estable entre búsquedas, así que sirve como
/// clave tanto en memoria como en la base local.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovieId(i64);

impl MovieId {
  pub const fn new(raw: i64) -> Self {
    MovieId(raw)
  }

  /// Devuelve el valor crudo.
  pub const fn get(&self) -> i64 {
    self.0
  }
}

impl From<i64> for MovieId {
  fn from(raw: i64) -> Self {
    MovieId(raw)
  }
}

impl From<MovieId> for i64 {
  fn from(id: MovieId) -> Self {
    id.0
  }
}

impl fmt::Display for MovieId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.0.fmt(f)
  }
}
