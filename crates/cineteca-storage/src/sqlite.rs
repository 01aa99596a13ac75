use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use diesel::dsl::max;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use tracing::debug;

use cineteca_core::domain::{FavoriteEntry, Movie, MovieId};
use cineteca_core::ports::{
  FavoriteToggle, FavoritesFeed, FavoritesStore, FeedHub, StoreError, StoreLayout,
};

use crate::config::StorageConfig;
use crate::connection::{DbConn, DbPool, open_pool, storage_err};
use crate::models::{FavoriteMovieRow, MovieRow};
use crate::schema::favorite_movies::dsl as fav;
use crate::schema::movies::dsl as mv;

/// Adapter SQLite (diesel + r2d2) de [`FavoritesStore`].
///
/// Diesel es síncrono: cada operación corre en `spawn_blocking`. Las
/// escrituras pasan por `write_gate`, que además cubre la foto que se
/// reparte a los suscriptores, así el feed sale en orden de commit.
#[derive(Clone)]
pub struct SqliteFavoritesStore {
  shared: Arc<Shared>,
}

struct Shared {
  pool: DbPool,
  layout: StoreLayout,
  write_gate: Mutex<()>,
  hub: FeedHub,
}

impl SqliteFavoritesStore {
  pub fn open(database_url: &str, layout: StoreLayout) -> Result<Self, StoreError> {
    Self::open_with(database_url, layout, 4, Some("WAL"))
  }

  pub fn open_with(
    database_url: &str,
    layout: StoreLayout,
    pool_size: u32,
    journal_mode: Option<&str>,
  ) -> Result<Self, StoreError> {
    let pool = open_pool(database_url, pool_size, journal_mode)?;
    let shared = Shared { pool, layout, write_gate: Mutex::new(()), hub: FeedHub::new() };
    Ok(Self { shared: Arc::new(shared) })
  }

  pub fn from_config(cfg: &StorageConfig) -> Result<Self, StoreError> {
    if let Some(parent) = cfg.db_path.parent() {
      std::fs::create_dir_all(parent).map_err(storage_err)?;
    }
    let url = cfg.db_path.to_string_lossy();
    Self::open_with(&url, cfg.layout, cfg.pool_size, cfg.journal_mode.as_deref())
  }

  /// Flag guardado para `id`: en `Dedicated` equivale a "existe la fila";
  /// en `UnifiedCache`, `None` si la película nunca se vio.
  pub async fn stored_flag(&self, id: MovieId) -> Result<Option<bool>, StoreError> {
    self
      .blocking(move |shared| {
        let mut conn = shared.conn()?;
        match shared.layout {
          StoreLayout::Dedicated => {
            let found = shared.find(&mut conn, id)?;
            Ok(found.map(|_| true))
          }
          StoreLayout::UnifiedCache => mv::movies
            .find(id.get())
            .select(mv::is_favorite)
            .first::<bool>(&mut *conn)
            .optional()
            .map_err(storage_err),
        }
      })
      .await
  }

  async fn blocking<T, F>(&self, f: F) -> Result<T, StoreError>
  where
    F: FnOnce(&Shared) -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
  {
    let shared = Arc::clone(&self.shared);
    tokio::task::spawn_blocking(move || f(&shared))
      .await
      .map_err(|e| StoreError::Storage(format!("join error: {e}")))?
  }
}

impl Shared {
  fn conn(&self) -> Result<DbConn, StoreError> {
    self.pool.get().map_err(storage_err)
  }

  fn gate(&self) -> Result<MutexGuard<'_, ()>, StoreError> {
    self.write_gate.lock().map_err(|_| StoreError::Poisoned("sqlite write gate".to_string()))
  }

  fn snapshot(&self, conn: &mut SqliteConnection) -> Result<Vec<FavoriteEntry>, StoreError> {
    let entries = match self.layout {
      StoreLayout::Dedicated => fav::favorite_movies
        .order(fav::favorited_seq.asc())
        .select(FavoriteMovieRow::as_select())
        .load(conn)
        .map_err(storage_err)?
        .into_iter()
        .map(FavoriteMovieRow::into_entry)
        .collect(),
      StoreLayout::UnifiedCache => mv::movies
        .filter(mv::is_favorite.eq(true))
        .order(mv::favorited_seq.asc())
        .select(MovieRow::as_select())
        .load(conn)
        .map_err(storage_err)?
        .into_iter()
        .map(MovieRow::into_entry)
        .collect(),
    };
    Ok(entries)
  }

  fn find(&self, conn: &mut SqliteConnection, id: MovieId) -> Result<Option<FavoriteEntry>, StoreError> {
    let entry = match self.layout {
      StoreLayout::Dedicated => fav::favorite_movies
        .find(id.get())
        .select(FavoriteMovieRow::as_select())
        .first(conn)
        .optional()
        .map_err(storage_err)?
        .map(FavoriteMovieRow::into_entry),
      StoreLayout::UnifiedCache => mv::movies
        .find(id.get())
        .filter(mv::is_favorite.eq(true))
        .select(MovieRow::as_select())
        .first(conn)
        .optional()
        .map_err(storage_err)?
        .map(MovieRow::into_entry),
    };
    Ok(entry)
  }

  /// Ejecuta `op` en una transacción con el gate tomado y, si `notify`
  /// lo pide, reparte la foto resultante antes de soltarlo.
  fn commit<T>(
    &self,
    op: impl FnOnce(&mut SqliteConnection) -> QueryResult<T>,
    notify: impl FnOnce(&T) -> bool,
  ) -> Result<T, StoreError> {
    let _gate = self.gate()?;
    let mut pooled = self.conn()?;
    let conn: &mut SqliteConnection = &mut pooled;

    let out = conn.transaction(|conn| op(conn)).map_err(storage_err)?;

    if notify(&out) {
      let snapshot = self.snapshot(conn)?;
      self.hub.publish(&snapshot)?;
    }
    Ok(out)
  }
}

fn upsert_dedicated(conn: &mut SqliteConnection, entry: &FavoriteEntry) -> QueryResult<()> {
  let existing = fav::favorite_movies
    .find(entry.id.get())
    .select(fav::favorited_seq)
    .first::<i64>(conn)
    .optional()?;

  let seq = match existing {
    Some(seq) => seq,
    None => fav::favorite_movies.select(max(fav::favorited_seq)).first::<Option<i64>>(conn)?.unwrap_or(0) + 1,
  };

  diesel::replace_into(fav::favorite_movies)
    .values(&FavoriteMovieRow::from_entry(entry, seq))
    .execute(conn)?;
  Ok(())
}

fn upsert_unified(conn: &mut SqliteConnection, entry: &FavoriteEntry) -> QueryResult<()> {
  let existing = mv::movies
    .find(entry.id.get())
    .select(mv::favorited_seq)
    .first::<Option<i64>>(conn)
    .optional()?
    .flatten();

  let seq = match existing {
    Some(seq) => seq,
    None => mv::movies.select(max(mv::favorited_seq)).first::<Option<i64>>(conn)?.unwrap_or(0) + 1,
  };

  diesel::replace_into(mv::movies).values(&MovieRow::favorite(entry, seq)).execute(conn)?;
  Ok(())
}

fn unmark(conn: &mut SqliteConnection, layout: StoreLayout, id: i64) -> QueryResult<()> {
  match layout {
    StoreLayout::Dedicated => diesel::delete(fav::favorite_movies.find(id)).execute(conn)?,
    StoreLayout::UnifiedCache => diesel::update(mv::movies.find(id))
      .set((mv::is_favorite.eq(false), mv::favorited_seq.eq(None::<i64>)))
      .execute(conn)?,
  };
  Ok(())
}

/// Lectura y escritura en la misma transacción; con el gate tomado por
/// `commit`, dos toggles solapados no pueden ver el mismo estado.
fn toggle_row(
  conn: &mut SqliteConnection,
  layout: StoreLayout,
  entry: &FavoriteEntry,
) -> QueryResult<FavoriteToggle> {
  let id = entry.id.get();
  let is_favorite = match layout {
    StoreLayout::Dedicated => {
      fav::favorite_movies.find(id).select(fav::id).first::<i64>(conn).optional()?.is_some()
    }
    StoreLayout::UnifiedCache => {
      mv::movies.find(id).select(mv::is_favorite).first::<bool>(conn).optional()?.unwrap_or(false)
    }
  };

  if is_favorite {
    unmark(conn, layout, id)?;
    return Ok(FavoriteToggle::Removed);
  }

  match layout {
    StoreLayout::Dedicated => upsert_dedicated(conn, entry)?,
    StoreLayout::UnifiedCache => upsert_unified(conn, entry)?,
  }
  Ok(FavoriteToggle::Added)
}

/// Guarda cada película conservando su flag previo. Devuelve si alguna de
/// las filas tocadas era favorita.
fn cache_unified(conn: &mut SqliteConnection, movies: &[Movie]) -> QueryResult<bool> {
  let mut touched_favorite = false;

  for movie in movies {
    let (is_favorite, seq) = mv::movies
      .find(movie.id.get())
      .select((mv::is_favorite, mv::favorited_seq))
      .first::<(bool, Option<i64>)>(conn)
      .optional()?
      .unwrap_or((false, None));

    touched_favorite |= is_favorite;
    diesel::replace_into(mv::movies).values(&MovieRow::from_movie(movie, is_favorite, seq)).execute(conn)?;
  }

  Ok(touched_favorite)
}

#[async_trait]
impl FavoritesStore for SqliteFavoritesStore {
  fn layout(&self) -> StoreLayout {
    self.shared.layout
  }

  async fn subscribe(&self) -> Result<FavoritesFeed, StoreError> {
    self
      .blocking(|shared| {
        let _gate = shared.gate()?;
        let mut conn = shared.conn()?;
        let current = shared.snapshot(&mut conn)?;
        shared.hub.subscribe(current)
      })
      .await
  }

  async fn get_all(&self) -> Result<Vec<FavoriteEntry>, StoreError> {
    self.blocking(|shared| shared.snapshot(&mut *shared.conn()?)).await
  }

  async fn get_by_id(&self, id: MovieId) -> Result<Option<FavoriteEntry>, StoreError> {
    self.blocking(move |shared| shared.find(&mut *shared.conn()?, id)).await
  }

  async fn upsert(&self, entry: &FavoriteEntry) -> Result<(), StoreError> {
    let entry = entry.clone();
    self
      .blocking(move |shared| {
        debug!(movie_id = %entry.id, "upsert favorite");
        match shared.layout {
          StoreLayout::Dedicated => shared.commit(|conn| upsert_dedicated(conn, &entry), |_| true),
          StoreLayout::UnifiedCache => shared.commit(|conn| upsert_unified(conn, &entry), |_| true),
        }
      })
      .await
  }

  async fn remove(&self, entry: &FavoriteEntry) -> Result<(), StoreError> {
    let id = entry.id.get();
    self
      .blocking(move |shared| {
        debug!(movie_id = id, "remove favorite");
        let layout = shared.layout;
        shared.commit(|conn| unmark(conn, layout, id), |_| true)
      })
      .await
  }

  async fn toggle(&self, entry: &FavoriteEntry) -> Result<FavoriteToggle, StoreError> {
    let entry = entry.clone();
    self
      .blocking(move |shared| {
        let layout = shared.layout;
        let toggle = shared.commit(|conn| toggle_row(conn, layout, &entry), |_| true)?;
        debug!(movie_id = %entry.id, ?toggle, "favorite toggled");
        Ok(toggle)
      })
      .await
  }

  async fn cache_movies(&self, movies: &[Movie]) -> Result<(), StoreError> {
    if !self.shared.layout.caches_search_results() || movies.is_empty() {
      return Ok(());
    }

    let movies = movies.to_vec();
    self
      .blocking(move |shared| {
        let touched = shared.commit(|conn| cache_unified(conn, &movies), |touched| *touched)?;
        debug!(cached = movies.len(), touched, "search results cached");
        Ok(())
      })
      .await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::{TempDir, tempdir};

  fn open(layout: StoreLayout) -> (TempDir, SqliteFavoritesStore) {
    let tmp = tempdir().unwrap();
    let url = tmp.path().join("cineteca.db");
    let store = SqliteFavoritesStore::open(url.to_str().unwrap(), layout).unwrap();
    (tmp, store)
  }

  fn entry(id: i64, title: &str) -> FavoriteEntry {
    FavoriteEntry::from(&Movie::bare(id).with_title(title))
  }

  fn ids(entries: &[FavoriteEntry]) -> Vec<i64> {
    entries.iter().map(|e| e.id.get()).collect()
  }

  #[tokio::test]
  async fn upsert_find_remove_in_both_layouts() {
    for layout in [StoreLayout::Dedicated, StoreLayout::UnifiedCache] {
      let (_tmp, store) = open(layout);
      let heat = entry(7, "Heat");

      store.upsert(&heat).await.unwrap();
      assert_eq!(store.get_by_id(MovieId::new(7)).await.unwrap(), Some(heat.clone()));

      store.remove(&heat).await.unwrap();
      assert_eq!(store.get_by_id(MovieId::new(7)).await.unwrap(), None, "{layout:?}");
      assert!(store.get_all().await.unwrap().is_empty());
    }
  }

  #[tokio::test]
  async fn full_snapshot_is_persisted() {
    let (_tmp, store) = open(StoreLayout::Dedicated);
    let mut movie = Movie::bare(3).with_title("Ikiru");
    movie.overview = Some("A bureaucrat...".into());
    movie.poster_path = Some("/ikiru.jpg".into());
    movie.release_date = Some("1952-10-09".into());
    movie.vote_average = Some(8.0);

    store.upsert(&FavoriteEntry::from(&movie)).await.unwrap();

    assert_eq!(store.get_all().await.unwrap(), vec![FavoriteEntry::from(&movie)]);
  }

  #[tokio::test]
  async fn favorites_keep_insertion_order() {
    let (_tmp, store) = open(StoreLayout::Dedicated);
    for id in [30, 10, 20] {
      store.upsert(&entry(id, "x")).await.unwrap();
    }
    store.upsert(&entry(30, "again")).await.unwrap();

    assert_eq!(ids(&store.get_all().await.unwrap()), vec![30, 10, 20]);
  }

  #[tokio::test]
  async fn feed_sees_each_commit_exactly_once() {
    let (_tmp, store) = open(StoreLayout::Dedicated);
    store.upsert(&entry(1, "a")).await.unwrap();
    let mut feed = store.subscribe().await.unwrap();

    store.upsert(&entry(2, "b")).await.unwrap();
    store.remove(&entry(1, "a")).await.unwrap();

    assert_eq!(feed.try_next().map(|s| ids(&s)), Some(vec![1]));
    assert_eq!(feed.try_next().map(|s| ids(&s)), Some(vec![1, 2]));
    assert_eq!(feed.try_next().map(|s| ids(&s)), Some(vec![2]));
    assert_eq!(feed.try_next(), None);
  }

  #[tokio::test]
  async fn cache_preserves_favorite_flag() {
    let (_tmp, store) = open(StoreLayout::UnifiedCache);
    store.upsert(&entry(1, "Batman")).await.unwrap();
    let mut feed = store.subscribe().await.unwrap();
    let _initial = feed.try_next();

    store
      .cache_movies(&[Movie::bare(1).with_title("Batman (1989)"), Movie::bare(2).with_title("Returns")])
      .await
      .unwrap();

    assert_eq!(store.stored_flag(MovieId::new(1)).await.unwrap(), Some(true));
    assert_eq!(store.stored_flag(MovieId::new(2)).await.unwrap(), Some(false));
    assert_eq!(store.stored_flag(MovieId::new(3)).await.unwrap(), None);

    let favs = store.get_all().await.unwrap();
    assert_eq!(ids(&favs), vec![1]);
    assert_eq!(favs[0].title.as_deref(), Some("Batman (1989)"));
    // La tanda tocó un favorito: una foto nueva.
    assert_eq!(feed.try_next().map(|s| ids(&s)), Some(vec![1]));
    assert_eq!(feed.try_next(), None);
  }

  #[tokio::test]
  async fn cache_without_favorites_does_not_notify() {
    let (_tmp, store) = open(StoreLayout::UnifiedCache);
    let mut feed = store.subscribe().await.unwrap();
    let _initial = feed.try_next();

    store.cache_movies(&[Movie::bare(5)]).await.unwrap();

    assert_eq!(feed.try_next(), None);
  }

  #[tokio::test]
  async fn unified_remove_keeps_the_cached_row() {
    let (_tmp, store) = open(StoreLayout::UnifiedCache);
    let heat = entry(7, "Heat");
    store.upsert(&heat).await.unwrap();

    store.remove(&heat).await.unwrap();

    assert_eq!(store.stored_flag(MovieId::new(7)).await.unwrap(), Some(false));
  }

  #[tokio::test]
  async fn dedicated_layout_ignores_cache_writes() {
    let (_tmp, store) = open(StoreLayout::Dedicated);

    store.cache_movies(&[Movie::bare(5)]).await.unwrap();

    assert_eq!(store.stored_flag(MovieId::new(5)).await.unwrap(), None);
  }

  #[tokio::test]
  async fn favorites_survive_reopening() {
    let tmp = tempdir().unwrap();
    let url = tmp.path().join("cineteca.db");
    let url = url.to_str().unwrap();

    {
      let store = SqliteFavoritesStore::open(url, StoreLayout::Dedicated).unwrap();
      store.upsert(&entry(42, "Stalker")).await.unwrap();
    }

    let reopened = SqliteFavoritesStore::open(url, StoreLayout::Dedicated).unwrap();
    assert_eq!(ids(&reopened.get_all().await.unwrap()), vec![42]);
  }

  #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
  async fn overlapping_toggles_give_added_and_removed() {
    for layout in [StoreLayout::Dedicated, StoreLayout::UnifiedCache] {
      let (_tmp, store) = open(layout);
      let heat = entry(7, "Heat");

      for _ in 0..15 {
        let (a, b) = (store.clone(), store.clone());
        let (ea, eb) = (heat.clone(), heat.clone());
        let first = tokio::spawn(async move { a.toggle(&ea).await });
        let second = tokio::spawn(async move { b.toggle(&eb).await });

        let mut outcomes = vec![first.await.unwrap().unwrap(), second.await.unwrap().unwrap()];
        outcomes.sort_by_key(|t| *t == FavoriteToggle::Removed);

        assert_eq!(outcomes, vec![FavoriteToggle::Added, FavoriteToggle::Removed], "{layout:?}");
        assert_eq!(store.get_by_id(MovieId::new(7)).await.unwrap(), None, "{layout:?}");
      }
    }
  }

  #[tokio::test]
  async fn toggle_publishes_each_flip() {
    let (_tmp, store) = open(StoreLayout::UnifiedCache);
    let mut feed = store.subscribe().await.unwrap();
    let heat = entry(7, "Heat");

    assert_eq!(store.toggle(&heat).await.unwrap(), FavoriteToggle::Added);
    assert_eq!(store.toggle(&heat).await.unwrap(), FavoriteToggle::Removed);

    assert_eq!(feed.try_next().map(|s| ids(&s)), Some(vec![]));
    assert_eq!(feed.try_next().map(|s| ids(&s)), Some(vec![7]));
    assert_eq!(feed.try_next().map(|s| ids(&s)), Some(vec![]));
    assert_eq!(store.stored_flag(MovieId::new(7)).await.unwrap(), Some(false));
  }
}
