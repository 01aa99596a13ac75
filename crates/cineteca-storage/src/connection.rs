use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, warn};

use cineteca_core::ports::StoreError;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConn = PooledConnection<ConnectionManager<SqliteConnection>>;

pub(crate) fn storage_err(e: impl std::fmt::Display) -> StoreError {
  StoreError::Storage(e.to_string())
}

/// PRAGMAs que se aplican a cada conexión nueva del pool.
#[derive(Debug)]
struct SqlitePragmas {
  journal_mode: Option<String>,
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
  fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
    let mut sql = String::from("PRAGMA busy_timeout = 5000;");
    if let Some(mode) = &self.journal_mode {
      sql.push_str(&format!(" PRAGMA journal_mode = {mode};"));
    }
    conn.batch_execute(&sql).map_err(diesel::r2d2::Error::QueryError)
  }
}

/// Abre (o crea) la base en `database_url` y aplica las migraciones
/// pendientes.
pub fn open_pool(
  database_url: &str,
  pool_size: u32,
  journal_mode: Option<&str>,
) -> Result<DbPool, StoreError> {
  // Va pegado dentro de un PRAGMA: solo se aceptan palabras (WAL, DELETE...).
  let journal_mode = journal_mode.and_then(|mode| {
    if !mode.is_empty() && mode.chars().all(|c| c.is_ascii_alphabetic()) {
      Some(mode.to_string())
    } else {
      warn!(%mode, "ignoring invalid journal_mode");
      None
    }
  });

  let pool = Pool::builder()
    .max_size(pool_size.max(1))
    .connection_customizer(Box::new(SqlitePragmas { journal_mode }))
    .build(ConnectionManager::<SqliteConnection>::new(database_url))
    .map_err(storage_err)?;

  let mut conn = pool.get().map_err(storage_err)?;
  let applied = conn.run_pending_migrations(MIGRATIONS).map_err(storage_err)?;
  debug!(database_url, migrations = applied.len(), "sqlite ready");

  Ok(pool)
}
