//! Session token shared with the primary flow
//!
//! One token is current at any time. The refresher replaces it wholesale on a
//! fixed interval; readers take a snapshot (`Arc<SessionToken>`) and never see
//! a half-written value.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Opaque session identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionToken {
    /// Token value sent upstream as `session_id`
    pub value: String,
    /// When this token was generated
    pub generated_at: DateTime<Utc>,
}

impl SessionToken {
    /// Generate a fresh random token
    pub fn generate() -> Self {
        Self {
            value: Uuid::new_v4().to_string(),
            generated_at: Utc::now(),
        }
    }
}

/// Holder of the current session token
///
/// Cloning is cheap; all clones observe the same token.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sender: Arc<watch::Sender<Arc<SessionToken>>>,
}

impl SessionStore {
    /// Create a store seeded with a freshly generated token
    pub fn new() -> Self {
        let token = Arc::new(SessionToken::generate());
        info!(
            session_id = %token.value,
            generated_at = %token.generated_at,
            "Generated initial session token"
        );
        let (sender, _) = watch::channel(token);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Snapshot of the current token
    pub fn current(&self) -> Arc<SessionToken> {
        self.sender.borrow().clone()
    }

    /// Replace the current token with a new one and return it
    pub fn rotate(&self) -> Arc<SessionToken> {
        let token = Arc::new(SessionToken::generate());
        self.sender.send_replace(token.clone());
        token
    }

    /// Receiver notified on every rotation
    pub fn subscribe(&self) -> watch::Receiver<Arc<SessionToken>> {
        self.sender.subscribe()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Background task that rotates the session token
#[derive(Debug)]
pub struct SessionRefresher {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl SessionRefresher {
    /// Start rotating `store` every `period`
    ///
    /// The first rotation happens one full period after this call.
    ///
    /// # Panics
    ///
    /// Panics if `period` is zero.
    pub fn spawn(store: SessionStore, period: Duration) -> Self {
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    () = task_cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let token = store.rotate();
                        info!(
                            session_id = %token.value,
                            generated_at = %token.generated_at,
                            "Session ID refreshed"
                        );
                    }
                }
            }

            debug!("Session refresher stopped");
        });

        Self { cancel, handle }
    }

    /// Cancel the task and wait for it to finish
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            warn!("Session refresher ended abnormally: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    #[test]
    fn test_generated_tokens_are_unique_uuids() {
        let a = SessionToken::generate();
        let b = SessionToken::generate();
        assert_ne!(a.value, b.value);
        assert!(Uuid::parse_str(&a.value).is_ok());
    }

    #[tokio::test]
    async fn test_rotate_replaces_snapshot() {
        let store = SessionStore::new();
        let before = store.current();
        let rotated = store.rotate();

        assert_ne!(before.value, rotated.value);
        assert_eq!(store.current(), rotated);
        // Old snapshots stay intact
        assert_ne!(before.value, store.current().value);
    }

    #[tokio::test]
    async fn test_clones_share_token() {
        let store = SessionStore::new();
        let other = store.clone();
        store.rotate();
        assert_eq!(store.current(), other.current());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_happens_once_per_interval() {
        let store = SessionStore::new();
        let mut updates = store.subscribe();
        let initial = store.current();
        let refresher = SessionRefresher::spawn(store.clone(), HOUR);

        let start = Instant::now();
        updates.changed().await.unwrap();
        assert_eq!(start.elapsed(), HOUR);
        let first = updates.borrow_and_update().clone();
        assert_ne!(first.value, initial.value);

        // Nothing changes before the next interval is over
        let quiet = tokio::time::timeout(HOUR - Duration::from_secs(1), updates.changed()).await;
        assert!(quiet.is_err());
        assert_eq!(store.current(), first);

        updates.changed().await.unwrap();
        assert_eq!(start.elapsed(), HOUR * 2);
        assert_ne!(store.current().value, first.value);

        refresher.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_refresh_after_shutdown() {
        let store = SessionStore::new();
        let mut updates = store.subscribe();
        let refresher = SessionRefresher::spawn(store.clone(), HOUR);

        refresher.shutdown().await;
        let before = store.current();

        let after_shutdown = tokio::time::timeout(HOUR * 5, updates.changed()).await;
        assert!(after_shutdown.is_err());
        assert_eq!(store.current(), before);
    }
}
