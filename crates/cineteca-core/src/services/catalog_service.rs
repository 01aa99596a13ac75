use std::collections::HashSet;
use std::future::poll_fn;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::task::Poll;

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, warn};

use crate::domain::ids::MovieId;
use crate::domain::movie::{FavoriteEntry, Movie};
use crate::domain::search_result::SearchResult;
use crate::errors::CoreError;
use crate::ports::catalog::CatalogClient;
pub use crate::ports::favorites::FavoriteToggle;
use crate::ports::favorites::{FavoritesStore, StoreError};
use crate::ports::feed::FavoritesFeed;

/// Qué búsqueda gana cuando varias se solapan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchOrdering {
  /// Solo se muestra el resultado de la última búsqueda emitida; las
  /// respuestas tardías de búsquedas anteriores se descartan.
  #[default]
  IssueOrder,
  /// La última respuesta en llegar gana, aunque sea de una búsqueda vieja.
  CompletionOrder,
}

#[derive(Debug, Clone)]
pub struct ServiceOptions {
  pub search_ordering: SearchOrdering,
  /// Capacidad del canal de [`ServiceEvent`].
  pub event_capacity: usize,
}

impl Default for ServiceOptions {
  fn default() -> Self {
    Self { search_ordering: SearchOrdering::default(), event_capacity: 32 }
  }
}

/// Fallos del store que la UI tiene que enterarse aunque nadie espere el
/// `JoinHandle`.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceEvent {
  ToggleFailed { movie_id: MovieId, error: StoreError },
  CacheWriteFailed { query: String, error: StoreError },
}

struct SearchTicket {
  seq: u64,
  query: String,
}

struct SearchSlot {
  /// Número de la última búsqueda emitida (incluidas las vacías).
  latest: u64,
}

struct FavoritesView {
  feed: FavoritesFeed,
  movies: Vec<Movie>,
  ids: HashSet<MovieId>,
}

impl FavoritesView {
  fn apply(&mut self, snapshot: Vec<FavoriteEntry>) {
    self.ids = snapshot.iter().map(|e| e.id).collect();
    self.movies = snapshot.into_iter().map(Movie::from).collect();
  }

  /// Aplica todas las fotos pendientes del feed; `true` si hubo alguna.
  fn drain(&mut self) -> bool {
    let mut changed = false;
    while let Some(snapshot) = self.feed.try_next() {
      self.apply(snapshot);
      changed = true;
    }
    changed
  }
}

struct Inner<C, F> {
  catalog: C,
  store: F,
  options: ServiceOptions,
  search: Mutex<SearchSlot>,
  state: watch::Sender<SearchResult>,
  favorites: Mutex<FavoritesView>,
  favorites_tx: watch::Sender<Vec<Movie>>,
  // También serializa los recálculos de `displayed`.
  show_favorites_only: Mutex<bool>,
  displayed: watch::Sender<Vec<Movie>>,
  selection: watch::Sender<Option<Movie>>,
  events: broadcast::Sender<ServiceEvent>,
  pump: Mutex<Option<AbortHandle>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
  mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Fuente única de verdad para la capa de presentación: estado de búsqueda,
/// favoritos y película seleccionada.
///
/// Une los resultados del [`CatalogClient`] con el [`FavoritesStore`]. Las
/// operaciones que mutan (`search`, `toggle_favorite`) lanzan una tarea y
/// vuelven enseguida; el resultado se observa por los `watch` o esperando
/// el `JoinHandle`.
pub struct MovieCatalogService<C, F> {
  inner: Arc<Inner<C, F>>,
}

impl<C, F> Clone for MovieCatalogService<C, F> {
  fn clone(&self) -> Self {
    Self { inner: Arc::clone(&self.inner) }
  }
}

impl<C, F> MovieCatalogService<C, F>
where
  C: CatalogClient + 'static,
  F: FavoritesStore + 'static,
{
  /// Se suscribe al store y arranca la tarea que mantiene la vista de
  /// favoritos al día. Debe llamarse dentro de un runtime de Tokio.
  pub async fn new(catalog: C, store: F, options: ServiceOptions) -> Result<Self, CoreError> {
    let feed = store.subscribe().await?;
    let mut view = FavoritesView { feed, movies: Vec::new(), ids: HashSet::new() };
    view.drain();

    let (favorites_tx, _) = watch::channel(view.movies.clone());
    let (state, _) = watch::channel(SearchResult::Empty);
    let (displayed, _) = watch::channel(Vec::new());
    let (selection, _) = watch::channel(None);
    let (events, _) = broadcast::channel(options.event_capacity.max(1));

    let inner = Arc::new(Inner {
      catalog,
      store,
      options,
      search: Mutex::new(SearchSlot { latest: 0 }),
      state,
      favorites: Mutex::new(view),
      favorites_tx,
      show_favorites_only: Mutex::new(false),
      displayed,
      selection,
      events,
      pump: Mutex::new(None),
    });

    let pump = tokio::spawn(pump_favorites(Arc::downgrade(&inner)));
    *lock(&inner.pump) = Some(pump.abort_handle());

    debug!(layout = ?inner.store.layout(), ordering = ?inner.options.search_ordering, "catalog service ready");
    Ok(Self { inner })
  }

  // -------- SEARCH --------

  /// Lanza una búsqueda.
  ///
  /// Con una consulta en blanco el estado pasa a `Empty` y devuelve `None`
  /// sin tocar la red. Si no, el estado pasa a `Loading` antes de volver y
  /// la llamada al catálogo corre en una tarea aparte. El `Err` de la tarea
  /// solo puede venir de la escritura en caché; los fallos del catálogo
  /// acaban en `SearchResult::Error`.
  pub fn search(&self, query: &str) -> Option<JoinHandle<Result<(), CoreError>>> {
    let ticket = self.inner.begin_search(query)?;
    let inner = Arc::clone(&self.inner);
    Some(tokio::spawn(async move { inner.finish_search(ticket).await }))
  }

  /// Igual que [`Self::search`] pero en la tarea del llamador.
  pub async fn run_search(&self, query: &str) -> Result<(), CoreError> {
    match self.inner.begin_search(query) {
      Some(ticket) => self.inner.finish_search(ticket).await,
      None => Ok(()),
    }
  }

  pub fn state(&self) -> SearchResult {
    self.inner.state.borrow().clone()
  }

  pub fn subscribe_state(&self) -> watch::Receiver<SearchResult> {
    self.inner.state.subscribe()
  }

  /// Lista que debe pintar la pantalla de búsqueda (con el filtro aplicado).
  pub fn displayed(&self) -> Vec<Movie> {
    self.inner.displayed.borrow().clone()
  }

  pub fn subscribe_displayed(&self) -> watch::Receiver<Vec<Movie>> {
    self.inner.displayed.subscribe()
  }

  /// Activa o desactiva el filtro "solo favoritos". Devuelve el nuevo valor.
  ///
  /// Es solo un filtro de vista: el `Success` de fondo no cambia, así que
  /// desactivarlo recupera la lista completa sin volver a buscar.
  pub fn toggle_show_favorites_filter(&self) -> bool {
    let enabled = {
      let mut flag = lock(&self.inner.show_favorites_only);
      *flag = !*flag;
      *flag
    };
    debug!(enabled, "favorites-only filter toggled");
    self.inner.recompute_displayed();
    enabled
  }

  pub fn show_favorites_only(&self) -> bool {
    *lock(&self.inner.show_favorites_only)
  }

  // -------- FAVORITES --------

  /// Invierte la membresía de `movie` en favoritos.
  ///
  /// Cada llamada invierte; dos llamadas seguidas dejan todo como estaba.
  /// Un fallo del store llega por el `JoinHandle` y por [`Self::events`].
  pub fn toggle_favorite(&self, movie: Movie) -> JoinHandle<Result<FavoriteToggle, CoreError>> {
    let inner = Arc::clone(&self.inner);
    tokio::spawn(async move { inner.toggle(&movie).await })
  }

  pub async fn run_toggle_favorite(&self, movie: &Movie) -> Result<FavoriteToggle, CoreError> {
    self.inner.toggle(movie).await
  }

  pub fn is_favorite(&self, movie: &Movie) -> bool {
    self.inner.sync_favorites();
    lock(&self.inner.favorites).ids.contains(&movie.id)
  }

  /// Favoritos en orden de inserción.
  pub fn favorites(&self) -> Vec<Movie> {
    self.inner.sync_favorites();
    lock(&self.inner.favorites).movies.clone()
  }

  pub fn subscribe_favorites(&self) -> watch::Receiver<Vec<Movie>> {
    self.inner.favorites_tx.subscribe()
  }

  pub fn events(&self) -> broadcast::Receiver<ServiceEvent> {
    self.inner.events.subscribe()
  }

  // -------- SELECTION --------

  pub fn select_movie(&self, movie: Movie) {
    self.inner.selection.send_replace(Some(movie));
  }

  pub fn selected(&self) -> Option<Movie> {
    self.inner.selection.borrow().clone()
  }

  pub fn subscribe_selection(&self) -> watch::Receiver<Option<Movie>> {
    self.inner.selection.subscribe()
  }
}

impl<C, F> Inner<C, F>
where
  C: CatalogClient,
  F: FavoritesStore,
{
  fn begin_search(&self, query: &str) -> Option<SearchTicket> {
    let trimmed = query.trim();
    let mut slot = lock(&self.search);
    slot.latest += 1;
    let seq = slot.latest;

    if trimmed.is_empty() {
      debug!(seq, "blank query, search state -> Empty");
      self.state.send_replace(SearchResult::Empty);
      drop(slot);
      self.recompute_displayed();
      return None;
    }

    let previous = self.state.borrow().movies().map(<[Movie]>::to_vec);
    self.state.send_replace(SearchResult::Loading(previous));
    drop(slot);
    self.recompute_displayed();

    Some(SearchTicket { seq, query: trimmed.to_string() })
  }

  async fn finish_search(&self, ticket: SearchTicket) -> Result<(), CoreError> {
    debug!(query = %ticket.query, seq = ticket.seq, "searching catalog");

    let movies = match self.catalog.search(&ticket.query).await {
      Ok(movies) => movies,
      Err(error) => {
        warn!(query = %ticket.query, %error, "catalog search failed");
        self.commit_search(ticket.seq, SearchResult::failed(error));
        return Ok(());
      }
    };

    if !self.store.layout().caches_search_results() {
      self.commit_search(ticket.seq, SearchResult::Success(movies));
      return Ok(());
    }

    // La UI recibe la lista tal cual; el flag de favorito vive en el store.
    self.commit_search(ticket.seq, SearchResult::Success(movies.clone()));

    if let Err(error) = self.store.cache_movies(&movies).await {
      warn!(query = %ticket.query, %error, "caching search results failed");
      let _ = self
        .events
        .send(ServiceEvent::CacheWriteFailed { query: ticket.query, error: error.clone() });
      return Err(error.into());
    }

    Ok(())
  }

  fn commit_search(&self, seq: u64, next: SearchResult) {
    let slot = lock(&self.search);

    if self.options.search_ordering == SearchOrdering::IssueOrder && seq != slot.latest {
      debug!(seq, latest = slot.latest, "discarding stale search result");
      return;
    }

    self.state.send_replace(next);
    drop(slot);
    self.recompute_displayed();
  }

  async fn toggle(&self, movie: &Movie) -> Result<FavoriteToggle, CoreError> {
    match self.store.toggle(&FavoriteEntry::from(movie)).await {
      Ok(toggle) => {
        debug!(movie_id = %movie.id, ?toggle, "favorite toggled");
        self.sync_favorites();
        Ok(toggle)
      }
      Err(error) => {
        warn!(movie_id = %movie.id, %error, "favorite toggle failed");
        let _ = self.events.send(ServiceEvent::ToggleFailed { movie_id: movie.id, error: error.clone() });
        Err(error.into())
      }
    }
  }

  fn sync_favorites(&self) {
    let changed = {
      let mut view = lock(&self.favorites);
      let changed = view.drain();
      if changed {
        self.favorites_tx.send_replace(view.movies.clone());
      }
      changed
    };

    if changed {
      self.recompute_displayed();
    }
  }

  fn recompute_displayed(&self) {
    let only_favorites = lock(&self.show_favorites_only);
    let movies = self.state.borrow().movies().map(<[Movie]>::to_vec).unwrap_or_default();

    let shown = if *only_favorites {
      let view = lock(&self.favorites);
      movies.into_iter().filter(|m| view.ids.contains(&m.id)).collect()
    } else {
      movies
    };

    self.displayed.send_replace(shown);
  }
}

impl<C, F> Drop for Inner<C, F> {
  fn drop(&mut self) {
    if let Some(pump) = lock(&self.pump).take() {
      pump.abort();
    }
  }
}

/// Aplica cada foto del feed en cuanto llega, para los suscriptores de
/// los `watch`. Se apaga sola cuando el servicio desaparece.
async fn pump_favorites<C, F>(inner: Weak<Inner<C, F>>)
where
  C: CatalogClient,
  F: FavoritesStore,
{
  loop {
    let alive = poll_fn(|cx| {
      let Some(inner) = inner.upgrade() else {
        return Poll::Ready(false);
      };

      let (changed, closed) = {
        let mut view = lock(&inner.favorites);
        let mut changed = false;
        let closed = loop {
          match view.feed.poll_next_unpin(cx) {
            Poll::Ready(Some(snapshot)) => {
              view.apply(snapshot);
              changed = true;
            }
            Poll::Ready(None) => break true,
            Poll::Pending => break false,
          }
        };
        if changed {
          inner.favorites_tx.send_replace(view.movies.clone());
        }
        (changed, closed)
      };

      if changed {
        inner.recompute_displayed();
      }

      match (changed, closed) {
        (_, true) => Poll::Ready(false),
        (true, false) => Poll::Ready(true),
        (false, false) => Poll::Pending,
      }
    })
    .await;

    if !alive {
      debug!("favorites feed closed");
      break;
    }
  }
}
