use std::sync::Arc;

use tokio::sync::watch;

/// Clonable cooperative-cancellation handle.
///
/// Every network-calling operation in the pipeline takes one of these and
/// either polls `is_cancelled` between units of work or selects on
/// `cancelled` while awaiting. Cancellation is one-way: once requested it
/// is observed by every clone of the token.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Completes once cancellation has been requested.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        // wait_for only fails when the sender is gone; the token itself
        // keeps one alive, so a failure means cancellation can never
        // arrive and the future stays pending.
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
