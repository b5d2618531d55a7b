//! Session cache configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default cache lifetime: 30 minutes.
const fn default_ttl_secs() -> u64 {
    1800
}

fn default_namespace() -> String {
    "haulage".into()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Seconds a cached session stays valid.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Directory for the cache file. Empty means the platform cache dir.
    #[serde(default)]
    pub cache_dir: String,

    /// Prefix of the cache file name, so several apps can share a directory.
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            cache_dir: String::new(),
            namespace: default_namespace(),
        }
    }
}

impl SessionConfig {
    /// Resolve the cache directory, falling back to `<cache_dir>/haulage`.
    pub fn resolved_cache_dir(&self) -> Option<PathBuf> {
        if self.cache_dir.is_empty() {
            dirs::cache_dir().map(|p| p.join("haulage"))
        } else {
            Some(PathBuf::from(&self.cache_dir))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = SessionConfig::default();
        assert_eq!(config.ttl_secs, 1800);
        assert_eq!(config.namespace, "haulage");
        assert!(config.cache_dir.is_empty());
    }

    #[test]
    fn explicit_cache_dir_wins() {
        let config = SessionConfig {
            cache_dir: "/tmp/haul-cache".into(),
            ..Default::default()
        };
        assert_eq!(
            config.resolved_cache_dir(),
            Some(PathBuf::from("/tmp/haul-cache"))
        );
    }
}
