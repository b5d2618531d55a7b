use std::sync::Arc;

use haul_core::{Identity, Role, SessionStatus};
use serde::Serialize;

use crate::cache::SessionCache;
use crate::error::AuthError;
use crate::remote::RemoteBackend;

/// Outcome of a resolution: both absent when nobody is signed in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedSession {
    pub user: Option<Identity>,
    pub role: Option<Role>,
}

impl ResolvedSession {
    #[must_use]
    pub const fn signed_out() -> Self {
        Self {
            user: None,
            role: None,
        }
    }

    #[must_use]
    pub const fn status(&self) -> SessionStatus {
        SessionStatus::from_parts(self.user.as_ref(), self.role)
    }
}

/// Where a [`Resolution`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSource {
    Cache,
    Backend,
}

/// A looked-up session that has not yet been written back to the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub session: ResolvedSession,
    pub source: SessionSource,
}

/// Resolves the current identity and role, cache first.
///
/// A cache hit skips the network entirely, so a role changed remotely stays
/// invisible until the entry expires or [`Self::resolve_fresh`] is used.
#[derive(Debug)]
pub struct SessionResolver<B> {
    backend: Arc<B>,
    cache: SessionCache,
}

impl<B: RemoteBackend> SessionResolver<B> {
    pub const fn new(backend: Arc<B>, cache: SessionCache) -> Self {
        Self { backend, cache }
    }

    #[must_use]
    pub const fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    #[must_use]
    pub const fn cache(&self) -> &SessionCache {
        &self.cache
    }

    /// Resolve the session and write a backend answer through to the cache.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Remote` if either remote lookup fails. The cache is
    /// left as it was, and callers must treat the session as indeterminate
    /// rather than signed out.
    pub async fn resolve(&self) -> Result<ResolvedSession, AuthError> {
        let resolution = self.lookup(true).await?;
        if resolution.source == SessionSource::Backend {
            self.persist(&resolution.session);
        }
        Ok(resolution.session)
    }

    /// Drop the cached entry, then resolve against the backend.
    ///
    /// # Errors
    ///
    /// Same as [`Self::resolve`].
    pub async fn resolve_fresh(&self) -> Result<ResolvedSession, AuthError> {
        self.clear_cache();
        self.resolve().await
    }

    /// Look the session up without touching the cache file.
    ///
    /// With `use_cache`, a live cache entry is returned as is. Otherwise, and on
    /// a miss, the backend is asked for the identity and then its role.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Remote` if either remote lookup fails.
    pub async fn lookup(&self, use_cache: bool) -> Result<Resolution, AuthError> {
        if use_cache {
            if let Some(hit) = self.cache.read() {
                tracing::debug!(user_id = %hit.user.id, "session served from cache");
                return Ok(Resolution {
                    session: ResolvedSession {
                        user: Some(hit.user),
                        role: hit.role,
                    },
                    source: SessionSource::Cache,
                });
            }
        }

        let Some(user) = self.backend.current_identity().await? else {
            tracing::debug!("no current identity");
            return Ok(Resolution {
                session: ResolvedSession::signed_out(),
                source: SessionSource::Backend,
            });
        };

        let role = self.backend.profile_role(&user.id).await?;
        if role.is_none() {
            tracing::info!(user_id = %user.id, "identity has no profile role; awaiting approval");
        }

        Ok(Resolution {
            session: ResolvedSession {
                user: Some(user),
                role,
            },
            source: SessionSource::Backend,
        })
    }

    /// Write a backend answer to the cache: the entry for a signed-in user,
    /// no entry when signed out. Failures are logged.
    pub fn persist(&self, session: &ResolvedSession) {
        match &session.user {
            Some(user) => {
                if let Err(error) = self.cache.write(user, session.role) {
                    tracing::warn!(%error, "failed to persist session cache");
                }
            }
            None => self.clear_cache(),
        }
    }

    /// Forget the cached session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::CacheError` if the cache file cannot be removed.
    pub fn sign_out(&self) -> Result<(), AuthError> {
        self.cache.clear()
    }

    pub(crate) fn clear_cache(&self) {
        if let Err(error) = self.cache.clear() {
            tracing::warn!(%error, "failed to clear session cache");
        }
    }
}
