use cineteca_core::domain::{Movie, MovieId};
use serde::Deserialize;

/// Respuesta de `GET search/movie`. Solo nos interesa `results`.
#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
  #[serde(default)]
  pub results: Vec<MovieDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MovieDto {
  pub id: i64,
  #[serde(default)]
  pub title: Option<String>,
  #[serde(default)]
  pub overview: Option<String>,
  #[serde(default)]
  pub poster_path: Option<String>,
  #[serde(default)]
  pub backdrop_path: Option<String>,
  #[serde(default)]
  pub release_date: Option<String>,
  #[serde(default)]
  pub vote_average: Option<f32>,
}

impl From<MovieDto> for Movie {
  fn from(dto: MovieDto) -> Self {
    Movie {
      id: MovieId::new(dto.id),
      title: dto.title,
      overview: dto.overview,
      poster_path: dto.poster_path,
      backdrop_path: dto.backdrop_path,
      release_date: dto.release_date,
      vote_average: dto.vote_average,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_and_null_fields_become_none() {
    let body = r#"{"page":1,"results":[{"id":268,"title":"Batman","poster_path":null,"vote_average":7.2}]}"#;

    let parsed: SearchResponse = serde_json::from_str(body).unwrap();
    let movie = Movie::from(parsed.results.into_iter().next().unwrap());

    assert_eq!(movie.id, MovieId::new(268));
    assert_eq!(movie.title.as_deref(), Some("Batman"));
    assert_eq!(movie.poster_path, None);
    assert_eq!(movie.overview, None);
    assert_eq!(movie.vote_average, Some(7.2));
  }
}
