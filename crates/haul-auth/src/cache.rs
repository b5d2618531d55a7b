//! Persisted snapshot of the last resolved session.
//!
//! One JSON file per namespace, `<dir>/<namespace>.session.json`, holding
//! `{version, user, role, timestamp}` with the timestamp in milliseconds
//! since the Unix epoch. Reads never fail: a missing, corrupt, outdated, or
//! expired entry is simply absent.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use haul_config::SessionConfig;
use haul_core::{Identity, Role};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::AuthError;

/// Bumped whenever the record layout changes; older entries read as absent.
pub const CACHE_SCHEMA_VERSION: u32 = 1;

/// Default lifetime of a cached session (30 minutes).
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Serialize, Deserialize)]
struct CacheRecord {
    version: u32,
    user: Identity,
    role: Option<Role>,
    timestamp: i64,
}

#[derive(Deserialize)]
struct VersionProbe {
    version: Option<u32>,
}

/// A cache hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedSession {
    pub user: Identity,
    pub role: Option<Role>,
    pub cached_at: DateTime<Utc>,
}

pub struct SessionCache {
    path: PathBuf,
    ttl_ms: i64,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for SessionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCache")
            .field("path", &self.path)
            .field("ttl_ms", &self.ttl_ms)
            .finish_non_exhaustive()
    }
}

impl SessionCache {
    pub fn new(dir: impl AsRef<Path>, namespace: &str, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{namespace}.session.json")),
            ttl_ms: i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX),
            clock,
        }
    }

    /// Build from the `[session]` config section.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotConfigured` if no cache directory can be determined.
    pub fn from_config(config: &SessionConfig, clock: Arc<dyn Clock>) -> Result<Self, AuthError> {
        let dir = config.resolved_cache_dir().ok_or_else(|| {
            AuthError::NotConfigured("no cache directory available; set session.cache_dir".into())
        })?;
        Ok(Self::new(
            dir,
            &config.namespace,
            Duration::from_secs(config.ttl_secs),
            clock,
        ))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The cached session, unless missing, malformed, outdated, or older than the TTL.
    #[must_use]
    pub fn read(&self) -> Option<CachedSession> {
        let raw = fs::read_to_string(&self.path).ok()?;

        let probe: VersionProbe = match serde_json::from_str(&raw) {
            Ok(probe) => probe,
            Err(error) => {
                tracing::debug!(%error, path = %self.path.display(), "ignoring malformed session cache");
                return None;
            }
        };
        if probe.version != Some(CACHE_SCHEMA_VERSION) {
            tracing::debug!(found = ?probe.version, expected = CACHE_SCHEMA_VERSION, "ignoring outdated session cache");
            return None;
        }

        let record: CacheRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(error) => {
                tracing::debug!(%error, "ignoring malformed session cache");
                return None;
            }
        };

        let Some(age_ms) = self
            .clock
            .now()
            .timestamp_millis()
            .checked_sub(record.timestamp)
            .filter(|age| *age >= 0)
        else {
            tracing::debug!(timestamp = record.timestamp, "ignoring session cache with bad timestamp");
            return None;
        };
        if age_ms > self.ttl_ms {
            tracing::debug!(age_ms, ttl_ms = self.ttl_ms, "session cache expired");
            return None;
        }

        Some(CachedSession {
            user: record.user,
            role: record.role,
            cached_at: DateTime::from_timestamp_millis(record.timestamp)?,
        })
    }

    /// Overwrite the entry with `{user, role}` stamped at the current time.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::CacheError` if the file cannot be written.
    pub fn write(&self, user: &Identity, role: Option<Role>) -> Result<(), AuthError> {
        let record = CacheRecord {
            version: CACHE_SCHEMA_VERSION,
            user: user.clone(),
            role,
            timestamp: self.clock.now().timestamp_millis(),
        };
        let json = serde_json::to_string(&record)
            .map_err(|e| AuthError::CacheError(format!("serialize: {e}")))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                AuthError::CacheError(format!("mkdir {}: {e}", parent.display()))
            })?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Err(e) = fs::set_permissions(parent, fs::Permissions::from_mode(0o700)) {
                    tracing::warn!("failed to chmod 0700 {}: {e}", parent.display());
                }
            }
        }

        fs::write(&self.path, json)
            .map_err(|e| AuthError::CacheError(format!("write {}: {e}", self.path.display())))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600)).map_err(|e| {
                AuthError::CacheError(format!("chmod {}: {e}", self.path.display()))
            })?;
        }

        Ok(())
    }

    /// Remove the entry. Removing an absent entry succeeds.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::CacheError` if an existing file cannot be removed.
    pub fn clear(&self) -> Result<(), AuthError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuthError::CacheError(format!(
                "remove {}: {e}",
                self.path.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::TimeDelta;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use tempfile::TempDir;

    fn cache_with_clock(dir: &TempDir) -> (SessionCache, ManualClock) {
        let clock = ManualClock::new(Utc::now());
        let cache = SessionCache::new(
            dir.path(),
            "haulage-test",
            DEFAULT_SESSION_TTL,
            Arc::new(clock.clone()),
        );
        (cache, clock)
    }

    fn driver() -> Identity {
        Identity::new("u-driver").with_email("driver@haulage.test", true)
    }

    #[test]
    fn write_then_read_returns_written_pair() {
        let dir = TempDir::new().expect("tmp dir");
        let (cache, clock) = cache_with_clock(&dir);

        cache.write(&driver(), Some(Role::Driver)).expect("write");
        clock.advance(TimeDelta::minutes(10));

        let hit = cache.read().expect("cache hit");
        assert_eq!(hit.user, driver());
        assert_eq!(hit.role, Some(Role::Driver));
    }

    #[test]
    fn unset_role_is_cached_as_none() {
        let dir = TempDir::new().expect("tmp dir");
        let (cache, _clock) = cache_with_clock(&dir);

        cache.write(&driver(), None).expect("write");
        assert_eq!(cache.read().expect("cache hit").role, None);
    }

    #[rstest]
    #[case(TimeDelta::milliseconds(1_800_000), true)]
    #[case(TimeDelta::milliseconds(1_800_001), false)]
    #[case(TimeDelta::hours(5), false)]
    fn ttl_boundary(#[case] age: TimeDelta, #[case] served: bool) {
        let dir = TempDir::new().expect("tmp dir");
        let (cache, clock) = cache_with_clock(&dir);

        cache.write(&driver(), Some(Role::Driver)).expect("write");
        clock.advance(age);
        assert_eq!(cache.read().is_some(), served);
    }

    #[test]
    fn clear_then_read_is_absent_and_idempotent() {
        let dir = TempDir::new().expect("tmp dir");
        let (cache, _clock) = cache_with_clock(&dir);

        cache.write(&driver(), Some(Role::Admin)).expect("write");
        cache.clear().expect("clear");
        assert!(cache.read().is_none());
        cache.clear().expect("second clear");
        assert!(cache.read().is_none());
    }

    #[test]
    fn malformed_entry_reads_as_absent() {
        let dir = TempDir::new().expect("tmp dir");
        let (cache, clock) = cache_with_clock(&dir);

        std::fs::write(cache.path(), "{not json").expect("write garbage");
        assert!(cache.read().is_none());

        std::fs::write(cache.path(), r#"{"version":1,"user":"nope"}"#).expect("write bad shape");
        assert!(cache.read().is_none());

        let overflowing = serde_json::json!({
            "version": CACHE_SCHEMA_VERSION,
            "user": {"id": "u-1"},
            "role": "admin",
            "timestamp": i64::MIN,
        });
        std::fs::write(cache.path(), overflowing.to_string()).expect("write");
        assert!(cache.read().is_none());

        let from_the_future = serde_json::json!({
            "version": CACHE_SCHEMA_VERSION,
            "user": {"id": "u-1"},
            "role": "admin",
            "timestamp": clock.now().timestamp_millis() + 60_000,
        });
        std::fs::write(cache.path(), from_the_future.to_string()).expect("write");
        assert!(cache.read().is_none());
    }

    #[test]
    fn schema_version_mismatch_reads_as_absent() {
        let dir = TempDir::new().expect("tmp dir");
        let (cache, clock) = cache_with_clock(&dir);

        let stale = serde_json::json!({
            "version": 0,
            "user": {"id": "u-1"},
            "role": "admin",
            "timestamp": clock.now().timestamp_millis(),
        });
        std::fs::write(cache.path(), stale.to_string()).expect("write");
        assert!(cache.read().is_none());

        let unversioned = serde_json::json!({
            "user": {"id": "u-1"},
            "role": "admin",
            "timestamp": clock.now().timestamp_millis(),
        });
        std::fs::write(cache.path(), unversioned.to_string()).expect("write");
        assert!(cache.read().is_none());
    }

    #[test]
    fn namespace_selects_file() {
        let dir = TempDir::new().expect("tmp dir");
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(Utc::now()));
        let ops = SessionCache::new(dir.path(), "ops", DEFAULT_SESSION_TTL, Arc::clone(&clock));
        let portal = SessionCache::new(dir.path(), "portal", DEFAULT_SESSION_TTL, clock);

        ops.write(&driver(), Some(Role::Driver)).expect("write");
        assert!(ops.read().is_some());
        assert!(portal.read().is_none());
        assert!(ops.path().ends_with("ops.session.json"));
    }
}
