//! # haul-config
//!
//! Layered configuration loading for Haulage using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`HAUL_*` prefix, `__` as separator)
//! 2. Project-level `.haulage/config.toml`
//! 3. User-level `~/.config/haulage/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `HAUL_BACKEND__URL` -> `backend.url`,
//! `HAUL_SESSION__TTL_SECS` -> `session.ttl_secs`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use haul_config::HaulConfig;
//!
//! let config = HaulConfig::load_with_dotenv().expect("config");
//! config.validate().expect("valid config");
//!
//! if config.backend.is_configured() {
//!     println!("Backend: {}", config.backend.url);
//! }
//! ```

mod backend;
mod error;
mod guard;
mod heartbeat;
mod session;

pub use backend::BackendConfig;
pub use error::ConfigError;
pub use guard::GuardConfig;
pub use heartbeat::HeartbeatConfig;
pub use session::SessionConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HaulConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub guard: GuardConfig,
    #[serde(default)]
    pub heartbeat: HeartbeatConfig,
}

impl HaulConfig {
    /// Load configuration from TOML files and environment variables.
    ///
    /// Does NOT call `dotenvy`; use [`Self::load_with_dotenv`] for `.env` support.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Figment` if a source cannot be read or a value
    /// has the wrong type.
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment().extract().map_err(ConfigError::from)
    }

    /// Load configuration after reading the nearest `.env` file.
    ///
    /// A missing `.env` is not an error.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can add providers on top.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(".haulage/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("HAUL_").split("__"))
    }

    /// Reject values that would make the session gate misbehave.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.ttl_secs == 0 {
            return Err(invalid("session.ttl_secs", "must be greater than zero"));
        }
        if self.session.namespace.trim().is_empty() {
            return Err(invalid("session.namespace", "must not be empty"));
        }
        if self.heartbeat.interval_secs == 0 {
            return Err(invalid("heartbeat.interval_secs", "must be greater than zero"));
        }
        for (field, route) in [
            ("guard.public_route", &self.guard.public_route),
            ("guard.dashboard_route", &self.guard.dashboard_route),
        ] {
            if !route.starts_with('/') {
                return Err(invalid(field, "must start with '/'"));
            }
        }
        Ok(())
    }

    /// Require the backend section, for commands that talk to the network.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotConfigured` if `backend.url` or
    /// `backend.anon_key` is empty.
    pub fn require_backend(&self) -> Result<&BackendConfig, ConfigError> {
        if self.backend.is_configured() {
            Ok(&self.backend)
        } else {
            Err(ConfigError::NotConfigured {
                section: "backend".into(),
            })
        }
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("haulage").join("config.toml"))
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.into(),
        reason: reason.into(),
    }
}
