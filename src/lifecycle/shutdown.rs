//! Shutdown coordination.

use std::future::Future;

use tokio::sync::broadcast;

/// Fans a single "stop now" out to every task that subscribed.
///
/// Cloning shares the same channel, so any clone can trigger.
#[derive(Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Get a receiver that fires when shutdown is triggered.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Tell every subscriber to stop.
    pub fn trigger(&self) {
        // No subscribers left means nothing to stop.
        let _ = self.tx.send(());
    }

    /// Trigger once an OS termination signal arrives.
    pub fn trigger_on_signal(&self) -> tokio::task::JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            super::signals::wait_for_signal().await;
            this.trigger();
        })
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn a receiver into a future that completes on trigger.
///
/// A closed channel also counts as a trigger, so a dropped coordinator never
/// leaves a server running forever.
pub fn signalled(mut rx: broadcast::Receiver<()>) -> impl Future<Output = ()> + Send + 'static {
    async move {
        let _ = rx.recv().await;
    }
}
