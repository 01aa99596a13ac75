use crate::domain::movie::Movie;
use crate::ports::catalog::CatalogError;

/// Mensaje fijo que ve el usuario cuando falla una búsqueda.
pub const SEARCH_FAILED_MESSAGE: &str = "Failed to load movies";

/// Estado de la última búsqueda emitida.
///
/// Solo `search()` y sus finalizaciones mueven este estado:
///
/// - `Empty` → consulta en blanco o todavía no se buscó nada.
/// - `Loading` → hay una llamada en vuelo; lleva los datos del último
///   `Success` para que la UI no parpadee.
/// - `Success` → lista en el orden exacto del servidor.
/// - `Error` → mensaje genérico + causa solo para diagnóstico.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SearchResult {
  #[default]
  Empty,
  Loading(Option<Vec<Movie>>),
  Success(Vec<Movie>),
  Error { message: String, cause: Option<CatalogError> },
}

impl SearchResult {
  pub fn failed(cause: CatalogError) -> Self {
    SearchResult::Error { message: SEARCH_FAILED_MESSAGE.to_string(), cause: Some(cause) }
  }

  /// Películas visibles ahora mismo: las de `Success` o las que arrastra
  /// `Loading`.
  pub fn movies(&self) -> Option<&[Movie]> {
    match self {
      SearchResult::Success(movies) => Some(movies),
      SearchResult::Loading(Some(previous)) => Some(previous),
      SearchResult::Loading(None) | SearchResult::Empty | SearchResult::Error { .. } => None,
    }
  }

  pub fn is_loading(&self) -> bool {
    matches!(self, SearchResult::Loading(_))
  }
}
