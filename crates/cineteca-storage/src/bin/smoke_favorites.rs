use cineteca_core::domain::{FavoriteEntry, Movie};
use cineteca_core::ports::{FavoritesStore, StoreLayout};
use cineteca_storage::SqliteFavoritesStore;

#[tokio::main]
async fn main() {
  // Base local en el directorio actual, forma unificada para probar la caché.
  let store =
    SqliteFavoritesStore::open("cineteca-smoke.db", StoreLayout::UnifiedCache).expect("failed to open db");

  let mut movie = Movie::bare(268).with_title("Batman");
  movie.release_date = Some("1989-06-23".to_string());

  println!("Caching movie with id = {}", movie.id);
  store.cache_movies(std::slice::from_ref(&movie)).await.expect("failed to cache movie");

  if store.get_by_id(movie.id).await.expect("failed to read").is_none() {
    store.upsert(&FavoriteEntry::from(&movie)).await.expect("failed to favorite movie");
  }

  let favorites = store.get_all().await.expect("failed to load favorites");
  println!("Favorites in DB: {favorites:?}");
  println!("Stored flag: {:?}", store.stored_flag(movie.id).await.expect("failed to read flag"));
}
