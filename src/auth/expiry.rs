//! Background token-expiry watcher.
//!
//! DESIGN
//! ======
//! A single tokio task re-checks the session on a fixed period (60 s by
//! default). When the token will run out before the next period, the task
//! sleeps only until the expiry instant instead, so logout happens on time
//! rather than up to a full period late.
//!
//! Each check publishes an [`AuthStatus`] on a watch channel. On expiry the
//! persisted token is removed as well.
//!
//! LIFECYCLE
//! =========
//! The task is owned by [`ExpiryWatcher`] and aborted when the watcher is
//! dropped, so it never outlives the view that started it.

#[cfg(test)]
#[path = "expiry_test.rs"]
mod tests;

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::session::{AuthState, AuthTransition};
use super::token::Clock;
use crate::persist::storage::{KeyValueStore, TOKEN_KEY};

pub const DEFAULT_EXPIRY_CHECK_SECS: u64 = 60;

/// Auth state shared between the foreground and the watcher task.
pub type SharedAuth = Arc<Mutex<AuthState>>;

/// Snapshot published after every check.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AuthStatus {
    pub authenticated: bool,
    pub remaining: Option<Duration>,
    pub last_transition: AuthTransition,
}

pub struct ExpiryWatcher {
    handle: JoinHandle<()>,
    status: watch::Receiver<AuthStatus>,
}

impl ExpiryWatcher {
    /// Spawn the watcher on the current tokio runtime.
    pub fn spawn<S, C>(auth: SharedAuth, store: Arc<S>, clock: C, period: Duration) -> Self
    where
        S: KeyValueStore + ?Sized + 'static,
        C: Clock + 'static,
    {
        let (tx, status) = watch::channel(AuthStatus::default());
        info!(period_secs = period.as_secs(), "token expiry watcher started");

        let handle = tokio::spawn(async move {
            loop {
                let now = clock.now_unix();
                let snapshot = {
                    let mut state = auth.lock().unwrap_or_else(PoisonError::into_inner);
                    let transition = state.check_expiry(now);
                    AuthStatus {
                        authenticated: state.is_authenticated(),
                        remaining: state.remaining(now),
                        last_transition: transition,
                    }
                };

                if snapshot.last_transition == AuthTransition::Expired {
                    if let Err(e) = store.remove_item(TOKEN_KEY) {
                        warn!(error = %e, "failed to clear expired token from storage");
                    }
                }
                if tx.send(snapshot).is_err() {
                    break;
                }

                let wait = match snapshot.remaining {
                    Some(left) if left < period => left.max(Duration::from_secs(1)),
                    _ => period,
                };
                tokio::time::sleep(wait).await;
            }
        });

        Self { handle, status }
    }

    /// Receiver for the status published after each check.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthStatus> {
        self.status.clone()
    }

    #[must_use]
    pub fn status(&self) -> AuthStatus {
        *self.status.borrow()
    }
}

impl Drop for ExpiryWatcher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
