//! Ordered fan-out of events to in-process subscribers.
//!
//! Each subscriber gets its own bounded channel. A broadcast delivers to
//! subscribers in registration order and waits for room in each channel, so
//! every subscriber sees events in the order they were produced, and a full
//! subscriber only holds up the producer once its buffer is exhausted.

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

/// Events buffered per subscriber before a broadcast waits.
pub const SUBSCRIBER_BUFFER_SIZE: usize = 64;

pub struct Broadcaster<T> {
    subscribers: Mutex<Vec<mpsc::Sender<T>>>,
    capacity: usize,
}

impl<T: Clone + Send> Broadcaster<T> {
    pub fn new() -> Self {
        Self::with_capacity(SUBSCRIBER_BUFFER_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            capacity: capacity.max(1),
        }
    }

    /// Register a new subscriber. Safe to call while broadcasts are running;
    /// the subscriber receives every event broadcast after this returns.
    pub fn subscribe(&self) -> mpsc::Receiver<T> {
        let (tx, rx) = mpsc::channel(self.capacity);
        self.subscribers.lock().push(tx);
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Deliver `event` to every live subscriber. Subscribers whose receiver
    /// was dropped are removed. Returns how many received the event.
    pub async fn broadcast(&self, event: T) -> usize {
        let targets: Vec<mpsc::Sender<T>> = self.subscribers.lock().clone();

        let mut delivered = 0;
        let mut saw_closed = false;
        for tx in &targets {
            if tx.send(event.clone()).await.is_ok() {
                delivered += 1;
            } else {
                saw_closed = true;
            }
        }

        if saw_closed {
            let mut subscribers = self.subscribers.lock();
            subscribers.retain(|tx| !tx.is_closed());
            debug!(remaining = subscribers.len(), "Pruned closed subscribers");
        }

        delivered
    }
}

impl<T: Clone + Send> Default for Broadcaster<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Broadcaster<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcaster")
            .field("subscribers", &self.subscribers.lock().len())
            .field("capacity", &self.capacity)
            .finish()
    }
}
