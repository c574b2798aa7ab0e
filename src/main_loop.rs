//! Main (UI) event loop
//!
//! All mutable screen state is touched from one consumer that drains a queue of
//! events. Anything running elsewhere (camera worker, recorder tasks, timers,
//! terminal input) talks to it by posting through a [`MainHandle`].

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Callback that can be invoked from any thread or task
pub type Listener<T> = Arc<dyn Fn(T) + Send + Sync>;

/// The consuming end of the main loop
pub struct MainLoop<E> {
    tx: mpsc::UnboundedSender<E>,
    rx: mpsc::UnboundedReceiver<E>,
}

impl<E: Send + 'static> MainLoop<E> {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    /// Get a posting handle for this loop
    pub fn handle(&self) -> MainHandle<E> {
        MainHandle {
            tx: self.tx.clone(),
        }
    }

    /// Wait for the next event
    pub async fn next(&mut self) -> Option<E> {
        self.rx.recv().await
    }

    /// Take the next event if one is already queued
    pub fn try_next(&mut self) -> Option<E> {
        self.rx.try_recv().ok()
    }
}

impl<E: Send + 'static> Default for MainLoop<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Posting side of the main loop
pub struct MainHandle<E> {
    tx: mpsc::UnboundedSender<E>,
}

impl<E> Clone for MainHandle<E> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<E: Send + 'static> MainHandle<E> {
    /// Queue an event. Returns false if the loop has been dropped.
    pub fn post(&self, event: E) -> bool {
        self.tx.send(event).is_ok()
    }

    /// Queue an event after `delay`
    ///
    /// The returned task can be cancelled; dropping it cancels it as well.
    pub fn post_delayed(&self, delay: Duration, event: E) -> DelayedTask {
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if tx.send(event).is_err() {
                debug!("Delayed event dropped: main loop is gone");
            }
        });

        DelayedTask { handle }
    }

    /// Build a callback that wraps its argument and posts it to this loop
    pub fn listener<T, F>(&self, wrap: F) -> Listener<T>
    where
        T: 'static,
        F: Fn(T) -> E + Send + Sync + 'static,
    {
        let tx = self.tx.clone();
        Arc::new(move |value: T| {
            let _ = tx.send(wrap(value));
        })
    }
}

/// A pending delayed post
#[derive(Debug)]
pub struct DelayedTask {
    handle: JoinHandle<()>,
}

impl DelayedTask {
    /// Cancel the post if it has not fired yet
    pub fn cancel(&self) {
        self.handle.abort();
    }

    /// Whether the post has fired or been cancelled
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for DelayedTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_delayed_post_fires_after_delay() {
        let mut main_loop = MainLoop::<u32>::new();
        let handle = main_loop.handle();

        let start = tokio::time::Instant::now();
        let _task = handle.post_delayed(Duration::from_millis(250), 7);

        assert_eq!(main_loop.next().await, Some(7));
        assert_eq!(start.elapsed(), Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_post_never_arrives() {
        let mut main_loop = MainLoop::<u32>::new();
        let handle = main_loop.handle();

        let task = handle.post_delayed(Duration::from_millis(100), 1);
        task.cancel();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(main_loop.try_next(), None);
    }

    #[tokio::test]
    async fn test_listener_wraps_value() {
        let mut main_loop = MainLoop::<String>::new();
        let listener = main_loop.handle().listener(|n: u8| format!("event-{}", n));

        listener(3);

        assert_eq!(main_loop.next().await.as_deref(), Some("event-3"));
    }
}
