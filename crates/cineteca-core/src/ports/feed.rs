use std::pin::Pin;
use std::sync::Mutex;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, error::TryRecvError};

use crate::domain::movie::FavoriteEntry;
use crate::ports::favorites::StoreError;

/// Suscripción viva al conjunto de favoritos.
///
/// Cada elemento es la foto completa después de un commit. El canal no tiene
/// límite para que ninguna foto se pierda ni se fusione con otra.
#[derive(Debug)]
pub struct FavoritesFeed {
  rx: UnboundedReceiver<Vec<FavoriteEntry>>,
}

impl FavoritesFeed {
  /// Siguiente foto pendiente sin esperar.
  pub fn try_next(&mut self) -> Option<Vec<FavoriteEntry>> {
    match self.rx.try_recv() {
      Ok(snapshot) => Some(snapshot),
      Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
    }
  }
}

/// Termina (`None`) cuando el store se destruye.
impl Stream for FavoritesFeed {
  type Item = Vec<FavoriteEntry>;

  fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
    self.get_mut().rx.poll_recv(cx)
  }
}

/// Reparte fotos a los suscriptores de un store.
///
/// El store debe llamar a `subscribe` y `publish` con su lock de escritura
/// tomado; así el orden de entrega es el orden de commit y ningún commit
/// cae entre la foto inicial y el registro.
#[derive(Debug, Default)]
pub struct FeedHub {
  subscribers: Mutex<Vec<UnboundedSender<Vec<FavoriteEntry>>>>,
}

impl FeedHub {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn subscribe(&self, current: Vec<FavoriteEntry>) -> Result<FavoritesFeed, StoreError> {
    let (tx, rx) = mpsc::unbounded_channel();
    // No puede fallar: el receptor sigue vivo aquí.
    let _ = tx.send(current);

    self
      .subscribers
      .lock()
      .map_err(|_| StoreError::Poisoned("feed subscribers".to_string()))?
      .push(tx);

    Ok(FavoritesFeed { rx })
  }

  /// Entrega `snapshot` a cada suscriptor vivo y descarta los cerrados.
  pub fn publish(&self, snapshot: &[FavoriteEntry]) -> Result<(), StoreError> {
    let mut subscribers = self
      .subscribers
      .lock()
      .map_err(|_| StoreError::Poisoned("feed subscribers".to_string()))?;

    subscribers.retain(|tx| tx.send(snapshot.to_vec()).is_ok());
    Ok(())
  }

  pub fn subscriber_count(&self) -> usize {
    self.subscribers.lock().map(|s| s.len()).unwrap_or(0)
  }
}
