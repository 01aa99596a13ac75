use serde::{Deserialize, Serialize};

use crate::domain::ids::MovieId;

/// Película tal como la devuelve el catálogo.
///
/// Es un valor inmutable: su identidad es `id` y el resto de campos son
/// metadatos de presentación, todos opcionales porque el catálogo puede
/// omitirlos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
  pub id: MovieId,
  pub title: Option<String>,
  pub overview: Option<String>,
  /// Ruta relativa del póster (p. ej. `/abc.jpg`).
  pub poster_path: Option<String>,
  pub backdrop_path: Option<String>,
  pub release_date: Option<String>,
  pub vote_average: Option<f32>,
}

impl Movie {
  /// Película con solo el id; el resto de campos vacíos.
  pub fn bare(id: impl Into<MovieId>) -> Self {
    Movie {
      id: id.into(),
      title: None,
      overview: None,
      poster_path: None,
      backdrop_path: None,
      release_date: None,
      vote_average: None,
    }
  }

  pub fn with_title(mut self, title: impl Into<String>) -> Self {
    self.title = Some(title.into());
    self
  }

  /// URL absoluta del póster, uniendo `image_base` (p. ej.
  /// `https://image.tmdb.org/t/p/w500`) con la ruta guardada.
  pub fn poster_url(&self, image_base: &str) -> Option<String> {
    self.poster_path.as_deref().map(|p| join_image_url(image_base, p))
  }

  pub fn backdrop_url(&self, image_base: &str) -> Option<String> {
    self.backdrop_path.as_deref().map(|p| join_image_url(image_base, p))
  }
}

fn join_image_url(base: &str, path: &str) -> String {
  format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Fila de favoritos: una foto completa de la película en el momento de
/// marcarla. Que exista la entrada ya implica que es favorita.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteEntry {
  pub id: MovieId,
  pub title: Option<String>,
  pub overview: Option<String>,
  pub poster_path: Option<String>,
  pub backdrop_path: Option<String>,
  pub release_date: Option<String>,
  pub vote_average: Option<f32>,
}

impl FavoriteEntry {
  pub fn to_movie(&self) -> Movie {
    Movie {
      id: self.id,
      title: self.title.clone(),
      overview: self.overview.clone(),
      poster_path: self.poster_path.clone(),
      backdrop_path: self.backdrop_path.clone(),
      release_date: self.release_date.clone(),
      vote_average: self.vote_average,
    }
  }
}

impl From<&Movie> for FavoriteEntry {
  fn from(movie: &Movie) -> Self {
    FavoriteEntry {
      id: movie.id,
      title: movie.title.clone(),
      overview: movie.overview.clone(),
      poster_path: movie.poster_path.clone(),
      backdrop_path: movie.backdrop_path.clone(),
      release_date: movie.release_date.clone(),
      vote_average: movie.vote_average,
    }
  }
}

impl From<FavoriteEntry> for Movie {
  fn from(entry: FavoriteEntry) -> Self {
    Movie {
      id: entry.id,
      title: entry.title,
      overview: entry.overview,
      poster_path: entry.poster_path,
      backdrop_path: entry.backdrop_path,
      release_date: entry.release_date,
      vote_average: entry.vote_average,
    }
  }
}
