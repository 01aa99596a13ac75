use crate::schema::favorite_movies;
use crate::schema::movies;

use cineteca_core::domain::{FavoriteEntry, Movie, MovieId};
use diesel::prelude::*;

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = favorite_movies)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FavoriteMovieRow {
  pub id: i64,
  pub title: Option<String>,
  pub overview: Option<String>,
  pub poster_path: Option<String>,
  pub backdrop_path: Option<String>,
  pub release_date: Option<String>,
  pub vote_average: Option<f32>,
  pub favorited_seq: i64,
}

impl FavoriteMovieRow {
  pub fn from_entry(entry: &FavoriteEntry, favorited_seq: i64) -> Self {
    FavoriteMovieRow {
      id: entry.id.get(),
      title: entry.title.clone(),
      overview: entry.overview.clone(),
      poster_path: entry.poster_path.clone(),
      backdrop_path: entry.backdrop_path.clone(),
      release_date: entry.release_date.clone(),
      vote_average: entry.vote_average,
      favorited_seq,
    }
  }

  pub fn into_entry(self) -> FavoriteEntry {
    FavoriteEntry {
      id: MovieId::new(self.id),
      title: self.title,
      overview: self.overview,
      poster_path: self.poster_path,
      backdrop_path: self.backdrop_path,
      release_date: self.release_date,
      vote_average: self.vote_average,
    }
  }
}

/// Fila de la caché unificada. `favorited_seq` solo tiene valor mientras
/// `is_favorite` es `true`.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = movies)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MovieRow {
  pub id: i64,
  pub title: Option<String>,
  pub overview: Option<String>,
  pub poster_path: Option<String>,
  pub backdrop_path: Option<String>,
  pub release_date: Option<String>,
  pub vote_average: Option<f32>,
  pub is_favorite: bool,
  pub favorited_seq: Option<i64>,
}

impl MovieRow {
  pub fn from_movie(movie: &Movie, is_favorite: bool, favorited_seq: Option<i64>) -> Self {
    MovieRow {
      id: movie.id.get(),
      title: movie.title.clone(),
      overview: movie.overview.clone(),
      poster_path: movie.poster_path.clone(),
      backdrop_path: movie.backdrop_path.clone(),
      release_date: movie.release_date.clone(),
      vote_average: movie.vote_average,
      is_favorite,
      favorited_seq,
    }
  }

  pub fn favorite(entry: &FavoriteEntry, favorited_seq: i64) -> Self {
    Self::from_movie(&entry.to_movie(), true, Some(favorited_seq))
  }

  pub fn into_entry(self) -> FavoriteEntry {
    FavoriteEntry {
      id: MovieId::new(self.id),
      title: self.title,
      overview: self.overview,
      poster_path: self.poster_path,
      backdrop_path: self.backdrop_path,
      release_date: self.release_date,
      vote_average: self.vote_average,
    }
  }
}
