use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;
use uuid::Uuid;

/// Lifecycle state of a screen that camera sessions are bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LifecycleState {
    Created,
    Started,
    Destroyed,
}

/// A lifecycle owner
///
/// Cloning shares the same underlying state. Sessions bound to an owner are torn
/// down by their binder once it reaches [`LifecycleState::Destroyed`].
#[derive(Debug, Clone)]
pub struct Lifecycle {
    id: Uuid,
    state: Arc<watch::Sender<LifecycleState>>,
}

impl Lifecycle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(LifecycleState::Created);
        Self {
            id: Uuid::new_v4(),
            state: Arc::new(tx),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    pub fn is_destroyed(&self) -> bool {
        self.state() == LifecycleState::Destroyed
    }

    /// Move to `next`. States only move forward.
    pub fn advance(&self, next: LifecycleState) {
        let changed = self.state.send_if_modified(|current| {
            if next > *current {
                *current = next;
                true
            } else {
                false
            }
        });

        if changed {
            debug!("Lifecycle {} -> {:?}", self.id, next);
        }
    }

    /// Watch state changes
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// Resolve once the owner is destroyed
    pub async fn destroyed(&self) {
        let mut rx = self.subscribe();
        // The sender lives as long as `self`, so this only errors if it is dropped mid-wait
        let _ = rx.wait_for(|s| *s == LifecycleState::Destroyed).await;
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
