//! Best-effort presence tracking.
//!
//! While tracking, a listener task consumes [`ActivitySignal`]s from a
//! broadcast bus. A signal triggers a last-active write only when more than
//! `interval` has passed since the previous write; the timestamp is claimed
//! before the write so a burst of signals yields a single write. Failures
//! are logged and dropped.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::clock::Clock;
use crate::remote::RemoteBackend;

/// Default minimum spacing between presence writes (5 minutes).
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5 * 60);

const SIGNAL_BUFFER: usize = 64;

/// Classes of user interaction that count as activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivitySignal {
    Pointer,
    Keyboard,
    Scroll,
    Touch,
    FocusReturn,
}

struct Tracker<B> {
    backend: Arc<B>,
    clock: Arc<dyn Clock>,
    interval: TimeDelta,
    last_update: Mutex<Option<DateTime<Utc>>>,
}

impl<B: RemoteBackend> Tracker<B> {
    /// Claim the next write slot if the interval has elapsed.
    fn claim(&self) -> Option<DateTime<Utc>> {
        let now = self.clock.now();
        let mut last = self.last_update.lock().unwrap_or_else(PoisonError::into_inner);
        let due = last.is_none_or(|previous| now - previous > self.interval);
        if !due {
            return None;
        }
        *last = Some(now);
        Some(now)
    }

    fn force_claim(&self) -> DateTime<Utc> {
        let now = self.clock.now();
        *self.last_update.lock().unwrap_or_else(PoisonError::into_inner) = Some(now);
        now
    }

    async fn write(&self, at: DateTime<Utc>) -> bool {
        let identity = match self.backend.current_identity().await {
            Ok(Some(identity)) => identity,
            Ok(None) => {
                tracing::debug!("no identity; skipping presence write");
                return false;
            }
            Err(error) => {
                tracing::warn!(%error, "presence identity lookup failed");
                return false;
            }
        };

        match self.backend.update_last_active(&identity.id, at).await {
            Ok(()) => {
                tracing::debug!(user_id = %identity.id, %at, "presence updated");
                true
            }
            Err(error) => {
                tracing::warn!(%error, user_id = %identity.id, "presence write failed");
                false
            }
        }
    }

    async fn on_signal(&self, signal: ActivitySignal) -> bool {
        let Some(at) = self.claim() else {
            tracing::trace!(?signal, "activity within interval");
            return false;
        };
        self.write(at).await
    }
}

pub struct ActivityHeartbeat<B> {
    tracker: Arc<Tracker<B>>,
    signals: broadcast::Sender<ActivitySignal>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl<B: RemoteBackend> ActivityHeartbeat<B> {
    pub fn new(backend: Arc<B>, clock: Arc<dyn Clock>, interval: Duration) -> Self {
        let (signals, _) = broadcast::channel(SIGNAL_BUFFER);
        Self {
            tracker: Arc::new(Tracker {
                backend,
                clock,
                interval: TimeDelta::from_std(interval).unwrap_or(TimeDelta::MAX),
                last_update: Mutex::new(None),
            }),
            signals,
            listener: Mutex::new(None),
        }
    }

    /// Start listening for activity. No-op if already tracking.
    ///
    /// Must be called within a Tokio runtime.
    pub fn start_tracking(&self) {
        let mut listener = self.listener.lock().unwrap_or_else(PoisonError::into_inner);
        if listener.as_ref().is_some_and(|task| !task.is_finished()) {
            return;
        }

        let tracker = Arc::clone(&self.tracker);
        let mut receiver = self.signals.subscribe();
        *listener = Some(tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(signal) => {
                        tracker.on_signal(signal).await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "activity listener lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }));
        tracing::debug!("activity tracking started");
    }

    /// Stop listening and drop the listener task.
    pub fn stop_tracking(&self) {
        let task = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.abort();
            tracing::debug!("activity tracking stopped");
        }
    }

    #[must_use]
    pub fn is_tracking(&self) -> bool {
        self.listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Publish an interaction. Returns `false` when nobody is listening.
    pub fn signal(&self, signal: ActivitySignal) -> bool {
        self.signals.send(signal).is_ok()
    }

    /// Handle one interaction inline. Returns whether a write succeeded.
    pub async fn record_activity(&self, signal: ActivitySignal) -> bool {
        self.tracker.on_signal(signal).await
    }

    /// Write presence now, regardless of the interval.
    pub async fn touch(&self) -> bool {
        let at = self.tracker.force_claim();
        self.tracker.write(at).await
    }

    #[must_use]
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        *self
            .tracker
            .last_update
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<B> Drop for ActivityHeartbeat<B> {
    fn drop(&mut self) {
        if let Some(task) = self
            .listener
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.abort();
        }
    }
}
