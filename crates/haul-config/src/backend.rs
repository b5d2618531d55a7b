//! Hosted backend (auth + REST) configuration.

use serde::{Deserialize, Serialize};

fn default_profiles_table() -> String {
    "profiles".into()
}

fn default_role_column() -> String {
    "role".into()
}

fn default_last_active_column() -> String {
    "last_active".into()
}

/// Default HTTP timeout in seconds.
const fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Project URL (e.g., `https://abc123.example-backend.co`).
    #[serde(default)]
    pub url: String,

    /// Public (anonymous) API key sent as the `apikey` header.
    #[serde(default)]
    pub anon_key: String,

    /// Table holding one profile row per identity.
    #[serde(default = "default_profiles_table")]
    pub profiles_table: String,

    /// Column of the profile row holding the role.
    #[serde(default = "default_role_column")]
    pub role_column: String,

    /// Column of the profile row receiving heartbeat timestamps.
    #[serde(default = "default_last_active_column")]
    pub last_active_column: String,

    /// Per-request timeout, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            profiles_table: default_profiles_table(),
            role_column: default_role_column(),
            last_active_column: default_last_active_column(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl BackendConfig {
    /// Check if the backend URL and anonymous key are both set.
    pub fn is_configured(&self) -> bool {
        !self.url.is_empty() && !self.anon_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_not_configured() {
        let config = BackendConfig::default();
        assert!(!config.is_configured());
        assert_eq!(config.profiles_table, "profiles");
        assert_eq!(config.timeout_secs, 10);
    }

    #[test]
    fn configured_when_url_and_key_set() {
        let config = BackendConfig {
            url: "https://haul.example-backend.co".into(),
            anon_key: "anon-123".into(),
            ..Default::default()
        };
        assert!(config.is_configured());
    }

    #[test]
    fn not_configured_without_key() {
        let config = BackendConfig {
            url: "https://haul.example-backend.co".into(),
            ..Default::default()
        };
        assert!(!config.is_configured());
    }
}
