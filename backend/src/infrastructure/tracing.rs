use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Ruta opcional de un archivo de log; sin ella se escribe en stderr.
pub const LOG_FILE_ENV: &str = "CINETECA_LOG";

/// Instala el subscriber global. El filtro sale de `RUST_LOG` (por defecto
/// `info`). Llamarlo dos veces no es un error: la segunda no hace nada.
pub fn init_tracing() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

  let file = std::env::var(LOG_FILE_ENV)
    .ok()
    .filter(|p| !p.trim().is_empty())
    .and_then(|path| match OpenOptions::new().create(true).append(true).open(&path) {
      Ok(f) => Some(f),
      Err(e) => {
        eprintln!("cineteca: no se pudo abrir {path} para logs: {e}");
        None
      }
    });

  let (file_layer, stderr_layer) = match file {
    Some(f) => (Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(f))), None),
    None => (None, Some(fmt::layer().with_writer(std::io::stderr))),
  };

  let _ = tracing_subscriber::registry().with(filter).with(file_layer).with(stderr_layer).try_init();
}
