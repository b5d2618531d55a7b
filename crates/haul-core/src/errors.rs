//! Cross-cutting error types for Haulage.
//!
//! Domain-specific errors (`AuthError`, `ConfigError`) live in their own
//! crates and converge into `anyhow` in `haul-cli`.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A role string did not match any known permission class.
    #[error("Unknown role: {0}")]
    InvalidRole(String),
}
