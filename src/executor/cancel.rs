//! Cooperative cancellation of retry loops.

use tokio::sync::watch;

/// Cancels every [`CancelToken`] created from it.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

/// Observes a [`CancelHandle`]. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    /// A token that is never cancelled.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancelled. Never resolves if the handle is dropped first.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        let fired = rx.wait_for(|cancelled| *cancelled).await.is_ok();
        if !fired {
            std::future::pending::<()>().await;
        }
    }
}
