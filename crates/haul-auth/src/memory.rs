//! In-process [`RemoteBackend`] for offline runs and tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use haul_core::{Identity, Role};

use crate::error::AuthError;
use crate::remote::RemoteBackend;

#[derive(Debug, Default)]
struct MemoryState {
    identity: Option<Identity>,
    roles: HashMap<String, Role>,
    identity_failure: Option<String>,
    role_failure: Option<String>,
    write_failure: Option<String>,
    identity_calls: usize,
    role_calls: usize,
    writes: Vec<(String, DateTime<Utc>)>,
}

/// Backend whose state lives in memory. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn sign_in(&self, identity: Identity) {
        self.state().identity = Some(identity);
    }

    pub fn sign_out(&self) {
        self.state().identity = None;
    }

    /// Assign (or with `None`, remove) the profile role for an identity.
    pub fn set_role(&self, identity_id: &str, role: Option<Role>) {
        let mut state = self.state();
        match role {
            Some(role) => state.roles.insert(identity_id.to_string(), role),
            None => state.roles.remove(identity_id),
        };
    }

    pub fn fail_identity_lookups(&self, message: Option<&str>) {
        self.state().identity_failure = message.map(str::to_string);
    }

    pub fn fail_role_lookups(&self, message: Option<&str>) {
        self.state().role_failure = message.map(str::to_string);
    }

    pub fn fail_writes(&self, message: Option<&str>) {
        self.state().write_failure = message.map(str::to_string);
    }

    #[must_use]
    pub fn identity_calls(&self) -> usize {
        self.state().identity_calls
    }

    #[must_use]
    pub fn role_calls(&self) -> usize {
        self.state().role_calls
    }

    /// Successful last-active writes, oldest first.
    #[must_use]
    pub fn writes(&self) -> Vec<(String, DateTime<Utc>)> {
        self.state().writes.clone()
    }
}

impl RemoteBackend for MemoryBackend {
    async fn current_identity(&self) -> Result<Option<Identity>, AuthError> {
        let mut state = self.state();
        state.identity_calls += 1;
        if let Some(message) = &state.identity_failure {
            return Err(AuthError::Remote(message.clone()));
        }
        Ok(state.identity.clone())
    }

    async fn profile_role(&self, identity_id: &str) -> Result<Option<Role>, AuthError> {
        let mut state = self.state();
        state.role_calls += 1;
        if let Some(message) = &state.role_failure {
            return Err(AuthError::Remote(message.clone()));
        }
        Ok(state.roles.get(identity_id).copied())
    }

    async fn update_last_active(&self, identity_id: &str, at: DateTime<Utc>) -> Result<(), AuthError> {
        let mut state = self.state();
        if let Some(message) = &state.write_failure {
            return Err(AuthError::Remote(message.clone()));
        }
        state.writes.push((identity_id.to_string(), at));
        Ok(())
    }
}
