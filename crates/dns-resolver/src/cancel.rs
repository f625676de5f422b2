//! Cooperative cancellation for in-flight queries.
//!
//! A query takes a `CancelSignal`; the matching `CancelHandle` fires
//! it.  Cancellation releases the query's pending timers and sockets
//! (they are owned by the futures being dropped) and surfaces as
//! `ResolutionError::Cancelled`.

use tokio::sync::watch;

/// Create a connected handle/signal pair.
pub fn cancellation() -> (CancelHandle, CancelSignal) {
    let (sender, receiver) = watch::channel(false);
    (CancelHandle { sender }, CancelSignal { receiver })
}

#[derive(Debug)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        // an error just means every signal is gone already
        let _ = self.sender.send(true);
    }
}

#[derive(Debug, Clone)]
pub struct CancelSignal {
    receiver: watch::Receiver<bool>,
}

impl CancelSignal {
    /// A signal which never fires, for callers with nothing to
    /// cancel.
    pub fn never() -> Self {
        static SENDER: std::sync::OnceLock<watch::Sender<bool>> = std::sync::OnceLock::new();
        let sender = SENDER.get_or_init(|| watch::channel(false).0);
        Self {
            receiver: sender.subscribe(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Wait until cancelled.  If the handle is dropped without
    /// cancelling, this pends forever.
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        loop {
            if *receiver.borrow() {
                return;
            }
            if receiver.changed().await.is_err() {
                // handle dropped without firing
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn cancel_fires_signal() {
        let (handle, signal) = cancellation();
        assert!(!signal.is_cancelled());

        handle.cancel();
        assert!(signal.is_cancelled());
        signal.cancelled().await; // completes immediately
    }

    #[tokio::test]
    async fn dropped_handle_never_fires() {
        let (handle, signal) = cancellation();
        drop(handle);

        let waited = tokio::time::timeout(Duration::from_millis(10), signal.cancelled()).await;
        assert!(waited.is_err());
        assert!(!signal.is_cancelled());
    }
}
