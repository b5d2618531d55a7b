//! Shared authentication state for one signed-in session.
//!
//! [`AuthContext`] is created at session start, cloned into every consumer,
//! and publishes [`AuthSnapshot`]s through a `watch` channel. Each
//! activation is tagged with a generation; a resolution that completes
//! after a newer one was started is discarded.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use haul_core::{Identity, Role, SessionStatus};
use serde::Serialize;
use tokio::sync::watch;

use crate::error::AuthError;
use crate::remote::RemoteBackend;
use crate::resolver::{ResolvedSession, SessionResolver, SessionSource};

/// What consumers see: `{user, role, loading, error}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthSnapshot {
    pub user: Option<Identity>,
    pub role: Option<Role>,
    pub loading: bool,
    pub error: Option<String>,
}

impl AuthSnapshot {
    /// State before the first resolution completes.
    #[must_use]
    pub const fn initializing() -> Self {
        Self {
            user: None,
            role: None,
            loading: true,
            error: None,
        }
    }

    #[must_use]
    pub fn resolved(session: ResolvedSession) -> Self {
        Self {
            user: session.user,
            role: session.role,
            loading: false,
            error: None,
        }
    }

    #[must_use]
    pub const fn failed(message: String) -> Self {
        Self {
            user: None,
            role: None,
            loading: false,
            error: Some(message),
        }
    }

    #[must_use]
    pub const fn status(&self) -> SessionStatus {
        SessionStatus::from_parts(self.user.as_ref(), self.role)
    }
}

struct Inner<B> {
    resolver: SessionResolver<B>,
    state: watch::Sender<AuthSnapshot>,
    generation: AtomicU64,
}

pub struct AuthContext<B> {
    inner: Arc<Inner<B>>,
}

impl<B> Clone for AuthContext<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: RemoteBackend> AuthContext<B> {
    /// Create a context in the initializing state without resolving.
    #[must_use]
    pub fn new(resolver: SessionResolver<B>) -> Self {
        let (state, _) = watch::channel(AuthSnapshot::initializing());
        Self {
            inner: Arc::new(Inner {
                resolver,
                state,
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Create a context and run the first resolution.
    pub async fn activate(resolver: SessionResolver<B>) -> Self {
        let context = Self::new(resolver);
        context.refresh().await;
        context
    }

    /// Re-run resolution (cache first) and publish the outcome.
    ///
    /// Safe to call concurrently: only the most recently started call's
    /// outcome is applied. Returns the snapshot current after this call.
    pub async fn refresh(&self) -> AuthSnapshot {
        self.run(false).await
    }

    /// Like [`Self::refresh`], but bypasses the session cache for this attempt.
    pub async fn refresh_fresh(&self) -> AuthSnapshot {
        self.run(true).await
    }

    async fn run(&self, fresh: bool) -> AuthSnapshot {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let resolver = &self.inner.resolver;
        self.inner.state.send_modify(|state| {
            if fresh {
                resolver.clear_cache();
            }
            state.loading = true;
            state.error = None;
        });

        let outcome = resolver.lookup(!fresh).await;

        // Cache writes happen under the state lock and only for the current
        // generation, so a sign-out or newer resolution is never overwritten.
        let applied = self.inner.state.send_if_modified(|state| {
            if self.inner.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            *state = match outcome {
                Ok(resolution) => {
                    if resolution.source == SessionSource::Backend {
                        resolver.persist(&resolution.session);
                    }
                    AuthSnapshot::resolved(resolution.session)
                }
                Err(error) => {
                    tracing::warn!(%error, "session resolution failed");
                    AuthSnapshot::failed(error.to_string())
                }
            };
            true
        });
        if !applied {
            tracing::debug!(generation, "discarding stale session resolution");
        }

        self.snapshot()
    }

    /// Clear the cached session and publish the signed-out state.
    ///
    /// Any resolution still in flight is invalidated and will neither publish
    /// nor write the cache.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::CacheError` if the cache cannot be cleared; the
    /// signed-out state is published regardless.
    pub fn sign_out(&self) -> Result<(), AuthError> {
        let mut cleared = Ok(());
        self.inner.state.send_modify(|state| {
            self.inner.generation.fetch_add(1, Ordering::SeqCst);
            cleared = self.inner.resolver.sign_out();
            *state = AuthSnapshot::resolved(ResolvedSession::signed_out());
        });
        cleared
    }

    #[must_use]
    pub fn snapshot(&self) -> AuthSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Receiver that observes every published snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.inner.state.subscribe()
    }

    /// Number of activations started so far (sign-out counts as one).
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn resolver(&self) -> &SessionResolver<B> {
        &self.inner.resolver
    }
}
