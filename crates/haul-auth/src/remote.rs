//! Contract of the hosted identity/profile backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use haul_core::{Identity, Role};

use crate::error::AuthError;

/// Remote identity provider plus profile store.
///
/// Every method fails with [`AuthError::Remote`] on transport or backend
/// failure. "Nobody signed in" and "no profile row" are `Ok(None)`.
pub trait RemoteBackend: Send + Sync + 'static {
    /// Identity behind the current credentials, if any.
    fn current_identity(&self)
    -> impl Future<Output = Result<Option<Identity>, AuthError>> + Send;

    /// Role stored on the profile record keyed by `identity_id`.
    fn profile_role(
        &self,
        identity_id: &str,
    ) -> impl Future<Output = Result<Option<Role>, AuthError>> + Send;

    /// Persist a last-active timestamp on the profile record.
    fn update_last_active(
        &self,
        identity_id: &str,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), AuthError>> + Send;
}
