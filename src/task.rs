//! Handles for background loops.

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::warn;

/// A running background loop that can be told to stop.
///
/// `stop` consumes the handle, so a loop can only be stopped once.
#[derive(Debug)]
pub struct LoopHandle {
    name: &'static str,
    stop_tx: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

impl LoopHandle {
    /// Spawn `body` with the receiving half of a fresh stop channel.
    pub fn spawn<F, Fut>(name: &'static str, body: F) -> Self
    where
        F: FnOnce(oneshot::Receiver<()>) -> Fut,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let (stop_tx, stop_rx) = oneshot::channel();
        let join = tokio::spawn(body(stop_rx));
        Self {
            name,
            stop_tx,
            join,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Signal the loop and wait for it to exit.
    pub async fn stop(self) {
        // The loop may already have exited on its own; the send then fails
        // and the join below returns immediately.
        let _ = self.stop_tx.send(());
        if let Err(e) = self.join.await {
            warn!(task = self.name, error = %e, "Background task ended abnormally");
        }
    }
}
