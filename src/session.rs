//! Process-wide observable of the current authenticated identity.
//!
//! Auth changes arrive from the hosted provider at arbitrary times; anything
//! holding cached per-user data subscribes and re-fetches on change rather
//! than reading ambient global state.

use tokio::sync::watch;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub user_id: Uuid,
    pub email: String,
}

#[derive(Debug, thiserror::Error)]
#[error("Session hub closed")]
pub struct SessionClosed;

/// Single broadcast point for session changes. Cloning shares the hub.
#[derive(Debug, Clone)]
pub struct SessionHub {
    tx: watch::Sender<Option<SessionIdentity>>,
}

impl SessionHub {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    pub fn current(&self) -> Option<SessionIdentity> {
        self.tx.borrow().clone()
    }

    /// Publish a new session state. Subscribers are only woken when the
    /// identity actually changed.
    pub fn set(&self, session: Option<SessionIdentity>) {
        self.tx.send_if_modified(|current| {
            if *current != session {
                *current = session;
                true
            } else {
                false
            }
        });
    }

    pub fn subscribe(&self) -> SessionWatch {
        SessionWatch {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for SessionHub {
    fn default() -> Self {
        Self::new()
    }
}

/// One subscriber's handle; dropping it unsubscribes.
#[derive(Debug)]
pub struct SessionWatch {
    rx: watch::Receiver<Option<SessionIdentity>>,
}

impl SessionWatch {
    /// Wait for the next session change and return the new identity.
    pub async fn next_change(&mut self) -> Result<Option<SessionIdentity>, SessionClosed> {
        self.rx.changed().await.map_err(|_| SessionClosed)?;
        Ok(self.rx.borrow_and_update().clone())
    }

    /// Whether a change has been published since the last `next_change`.
    pub fn has_pending(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }
}
