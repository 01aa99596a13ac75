//! Modelos serializables para la capa de UI.
//!
//! La UI nunca ve `SearchResult` directamente: recibe un `SearchStateDto`
//! etiquetado por `status` con las tarjetas ya resueltas (URLs absolutas,
//! flag de favorito).

use cineteca_core::domain::{Movie, SearchResult};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieCardDto {
  pub id: i64,
  pub title: String,
  pub overview: String,
  pub poster_url: Option<String>,
  pub backdrop_url: Option<String>,
  pub release_date: Option<String>,
  pub vote_average: f32,
  pub is_favorite: bool,
}

impl MovieCardDto {
  pub fn from_movie(movie: &Movie, image_base: &str, is_favorite: bool) -> Self {
    MovieCardDto {
      id: movie.id.get(),
      title: movie.title.clone().unwrap_or_default(),
      overview: movie.overview.clone().unwrap_or_default(),
      poster_url: movie.poster_url(image_base),
      backdrop_url: movie.backdrop_url(image_base),
      release_date: movie.release_date.clone(),
      vote_average: movie.vote_average.unwrap_or(0.0),
      is_favorite,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SearchStateDto {
  Empty,
  Loading { movies: Vec<MovieCardDto> },
  Success { movies: Vec<MovieCardDto> },
  Error { message: String },
}

impl SearchStateDto {
  /// `displayed` es la lista ya filtrada que publica el servicio; solo se
  /// usa para los estados que llevan datos.
  pub fn render(
    state: &SearchResult,
    displayed: &[Movie],
    image_base: &str,
    is_favorite: impl Fn(&Movie) -> bool,
  ) -> Self {
    let cards = || -> Vec<MovieCardDto> {
      displayed.iter().map(|m| MovieCardDto::from_movie(m, image_base, is_favorite(m))).collect()
    };

    match state {
      SearchResult::Empty => SearchStateDto::Empty,
      SearchResult::Loading(None) => SearchStateDto::Loading { movies: Vec::new() },
      SearchResult::Loading(Some(_)) => SearchStateDto::Loading { movies: cards() },
      SearchResult::Success(_) => SearchStateDto::Success { movies: cards() },
      SearchResult::Error { message, .. } => SearchStateDto::Error { message: message.clone() },
    }
  }
}
