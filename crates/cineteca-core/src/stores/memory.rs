use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::ids::MovieId;
use crate::domain::movie::{FavoriteEntry, Movie};
use crate::ports::favorites::{FavoriteToggle, FavoritesStore, StoreError, StoreLayout};
use crate::ports::feed::{FavoritesFeed, FeedHub};

#[derive(Debug, Clone)]
struct StoredMovie {
  entry: FavoriteEntry,
  /// Posición en la lista de favoritos; `None` = visto pero no favorito.
  favorite_seq: Option<u64>,
}

#[derive(Debug, Default)]
struct MemoryState {
  rows: HashMap<MovieId, StoredMovie>,
  next_seq: u64,
}

impl MemoryState {
  fn favorites(&self) -> Vec<FavoriteEntry> {
    let mut favs: Vec<(u64, &FavoriteEntry)> = self
      .rows
      .values()
      .filter_map(|row| row.favorite_seq.map(|seq| (seq, &row.entry)))
      .collect();
    favs.sort_by_key(|(seq, _)| *seq);
    favs.into_iter().map(|(_, entry)| entry.clone()).collect()
  }

  fn take_seq(&mut self) -> u64 {
    self.next_seq += 1;
    self.next_seq
  }

  fn is_favorite(&self, id: MovieId) -> bool {
    self.rows.get(&id).is_some_and(|row| row.favorite_seq.is_some())
  }

  fn mark(&mut self, entry: &FavoriteEntry) {
    let existing = self.rows.get(&entry.id).and_then(|row| row.favorite_seq);
    let seq = match existing {
      Some(seq) => seq,
      None => self.take_seq(),
    };
    self.rows.insert(entry.id, StoredMovie { entry: entry.clone(), favorite_seq: Some(seq) });
  }

  fn unmark(&mut self, layout: StoreLayout, id: MovieId) {
    match layout {
      StoreLayout::Dedicated => {
        self.rows.remove(&id);
      }
      StoreLayout::UnifiedCache => {
        if let Some(row) = self.rows.get_mut(&id) {
          row.favorite_seq = None;
        }
      }
    }
  }
}

/// Store de favoritos en memoria, sin persistencia.
///
/// Soporta las dos formas de [`StoreLayout`]; con `UnifiedCache` guarda
/// también las películas vistas en búsquedas.
#[derive(Debug, Default)]
pub struct MemoryFavoritesStore {
  layout: StoreLayout,
  state: Mutex<MemoryState>,
  hub: FeedHub,
}

impl MemoryFavoritesStore {
  pub fn new() -> Self {
    Self::with_layout(StoreLayout::Dedicated)
  }

  pub fn with_layout(layout: StoreLayout) -> Self {
    Self { layout, state: Mutex::new(MemoryState::default()), hub: FeedHub::new() }
  }

  fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
    self.state.lock().map_err(|_| StoreError::Poisoned("memory store".to_string()))
  }

  /// Número de filas guardadas, favoritas o no.
  pub fn cached_len(&self) -> usize {
    self.state.lock().map(|s| s.rows.len()).unwrap_or(0)
  }

  /// Flag guardado para `id`; `None` si la película nunca se guardó.
  pub fn stored_flag(&self, id: MovieId) -> Option<bool> {
    let state = self.state.lock().ok()?;
    state.rows.get(&id).map(|row| row.favorite_seq.is_some())
  }
}

#[async_trait]
impl FavoritesStore for MemoryFavoritesStore {
  fn layout(&self) -> StoreLayout {
    self.layout
  }

  async fn subscribe(&self) -> Result<FavoritesFeed, StoreError> {
    let state = self.lock()?;
    self.hub.subscribe(state.favorites())
  }

  async fn get_all(&self) -> Result<Vec<FavoriteEntry>, StoreError> {
    Ok(self.lock()?.favorites())
  }

  async fn get_by_id(&self, id: MovieId) -> Result<Option<FavoriteEntry>, StoreError> {
    let state = self.lock()?;
    Ok(state.rows.get(&id).filter(|row| row.favorite_seq.is_some()).map(|row| row.entry.clone()))
  }

  async fn upsert(&self, entry: &FavoriteEntry) -> Result<(), StoreError> {
    let mut state = self.lock()?;
    state.mark(entry);
    self.hub.publish(&state.favorites())
  }

  async fn remove(&self, entry: &FavoriteEntry) -> Result<(), StoreError> {
    let mut state = self.lock()?;
    state.unmark(self.layout, entry.id);
    self.hub.publish(&state.favorites())
  }

  async fn toggle(&self, entry: &FavoriteEntry) -> Result<FavoriteToggle, StoreError> {
    let mut state = self.lock()?;
    let toggle = if state.is_favorite(entry.id) {
      state.unmark(self.layout, entry.id);
      FavoriteToggle::Removed
    } else {
      state.mark(entry);
      FavoriteToggle::Added
    };
    self.hub.publish(&state.favorites())?;
    Ok(toggle)
  }

  async fn cache_movies(&self, movies: &[Movie]) -> Result<(), StoreError> {
    if !self.layout.caches_search_results() {
      return Ok(());
    }

    let mut state = self.lock()?;
    let mut touched_favorite = false;

    for movie in movies {
      let favorite_seq = state.rows.get(&movie.id).and_then(|row| row.favorite_seq);
      touched_favorite |= favorite_seq.is_some();
      state.rows.insert(movie.id, StoredMovie { entry: FavoriteEntry::from(movie), favorite_seq });
    }

    if touched_favorite {
      self.hub.publish(&state.favorites())?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ids(entries: &[FavoriteEntry]) -> Vec<i64> {
    entries.iter().map(|e| e.id.get()).collect()
  }

  #[tokio::test]
  async fn favorites_keep_insertion_order() {
    let store = MemoryFavoritesStore::new();
    for id in [3, 1, 2] {
      store.upsert(&FavoriteEntry::from(&Movie::bare(id))).await.unwrap();
    }

    assert_eq!(ids(&store.get_all().await.unwrap()), vec![3, 1, 2]);

    // Re-upsert no mueve la película al final.
    store.upsert(&FavoriteEntry::from(&Movie::bare(3).with_title("Alien"))).await.unwrap();
    let all = store.get_all().await.unwrap();
    assert_eq!(ids(&all), vec![3, 1, 2]);
    assert_eq!(all[0].title.as_deref(), Some("Alien"));
  }

  #[tokio::test]
  async fn feed_gets_one_snapshot_per_commit() {
    let store = MemoryFavoritesStore::new();
    let mut feed = store.subscribe().await.unwrap();
    let movie = FavoriteEntry::from(&Movie::bare(9));

    store.upsert(&movie).await.unwrap();
    store.remove(&movie).await.unwrap();

    assert_eq!(feed.try_next().map(|s| ids(&s)), Some(vec![]));
    assert_eq!(feed.try_next().map(|s| ids(&s)), Some(vec![9]));
    assert_eq!(feed.try_next().map(|s| ids(&s)), Some(vec![]));
    assert_eq!(feed.try_next(), None);
  }

  #[tokio::test]
  async fn unified_cache_preserves_flag_and_refreshes_metadata() {
    let store = MemoryFavoritesStore::with_layout(StoreLayout::UnifiedCache);
    store.upsert(&FavoriteEntry::from(&Movie::bare(1).with_title("Old"))).await.unwrap();

    store.cache_movies(&[Movie::bare(1).with_title("New"), Movie::bare(2)]).await.unwrap();

    assert_eq!(store.stored_flag(MovieId::new(1)), Some(true));
    assert_eq!(store.stored_flag(MovieId::new(2)), Some(false));
    let fav = store.get_by_id(MovieId::new(1)).await.unwrap().unwrap();
    assert_eq!(fav.title.as_deref(), Some("New"));
    assert!(store.get_by_id(MovieId::new(2)).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn unified_remove_keeps_cached_row() {
    let store = MemoryFavoritesStore::with_layout(StoreLayout::UnifiedCache);
    let entry = FavoriteEntry::from(&Movie::bare(5));
    store.upsert(&entry).await.unwrap();
    store.remove(&entry).await.unwrap();

    assert_eq!(store.stored_flag(MovieId::new(5)), Some(false));
    assert!(store.get_all().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn toggle_flips_and_publishes_once() {
    for layout in [StoreLayout::Dedicated, StoreLayout::UnifiedCache] {
      let store = MemoryFavoritesStore::with_layout(layout);
      let mut feed = store.subscribe().await.unwrap();
      let entry = FavoriteEntry::from(&Movie::bare(4));

      assert_eq!(store.toggle(&entry).await.unwrap(), FavoriteToggle::Added);
      assert_eq!(store.toggle(&entry).await.unwrap(), FavoriteToggle::Removed);

      assert_eq!(feed.try_next().map(|s| ids(&s)), Some(vec![]));
      assert_eq!(feed.try_next().map(|s| ids(&s)), Some(vec![4]));
      assert_eq!(feed.try_next().map(|s| ids(&s)), Some(vec![]), "{layout:?}");
      assert_eq!(feed.try_next(), None);
    }
  }

  #[tokio::test]
  async fn dedicated_layout_ignores_cache_writes() {
    let store = MemoryFavoritesStore::new();
    store.cache_movies(&[Movie::bare(1)]).await.unwrap();
    assert_eq!(store.cached_len(), 0);
  }
}
