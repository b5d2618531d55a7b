use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AuthError;

const DEFAULT_KEYRING_SERVICE: &str = "haulage";
const KEYRING_USER: &str = "backend-access-token";
const TOKEN_ENV_VAR: &str = "HAUL_AUTH__ACCESS_TOKEN";
const CREDENTIALS_FILE_NAME: &str = "credentials";

/// Which tier an access token was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Keyring,
    Env,
    File,
}

impl TokenSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Keyring => "keyring",
            Self::Env => "env",
            Self::File => "file",
        }
    }
}

/// Persisted backend access token.
///
/// Load priority: keyring → `HAUL_AUTH__ACCESS_TOKEN` env → credentials file.
#[derive(Debug, Clone)]
pub struct TokenStore {
    keyring_service: Option<String>,
    file_path: PathBuf,
}

impl TokenStore {
    #[must_use]
    pub fn new(keyring_service: impl Into<String>, file_path: impl Into<PathBuf>) -> Self {
        Self {
            keyring_service: Some(keyring_service.into()),
            file_path: file_path.into(),
        }
    }

    /// Store without the keyring tier (headless machines, tests).
    #[must_use]
    pub fn file_only(file_path: impl Into<PathBuf>) -> Self {
        Self {
            keyring_service: None,
            file_path: file_path.into(),
        }
    }

    /// `~/.haulage/credentials`, keyring service from `HAUL_KEYRING_SERVICE`
    /// (default `"haulage"`).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenStoreError` if the home directory is unknown.
    pub fn default_location() -> Result<Self, AuthError> {
        let file_path = dirs::home_dir()
            .map(|h| h.join(".haulage").join(CREDENTIALS_FILE_NAME))
            .ok_or_else(|| {
                AuthError::TokenStoreError(
                    "home directory not found; cannot store credentials".into(),
                )
            })?;
        let service = std::env::var("HAUL_KEYRING_SERVICE")
            .unwrap_or_else(|_| DEFAULT_KEYRING_SERVICE.to_string());
        Ok(Self::new(service, file_path))
    }

    #[must_use]
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Store a token in the OS keychain, falling back to the credentials file.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenStoreError` if file storage fails.
    pub fn store(&self, token: &str) -> Result<(), AuthError> {
        if let Some(entry) = self.keyring_entry() {
            match entry.set_password(token) {
                Ok(()) => return Ok(()),
                Err(error) => {
                    tracing::warn!(%error, "keyring store failed; falling back to file");
                }
            }
        }
        self.store_file(token)
    }

    #[must_use]
    pub fn load(&self) -> Option<String> {
        self.load_with_source().map(|(token, _)| token)
    }

    /// Token together with the tier it came from.
    #[must_use]
    pub fn load_with_source(&self) -> Option<(String, TokenSource)> {
        if let Some(token) = self
            .keyring_entry()
            .and_then(|entry| entry.get_password().ok())
            .filter(|t| !t.is_empty())
        {
            return Some((token, TokenSource::Keyring));
        }

        if let Some(token) = std::env::var(TOKEN_ENV_VAR).ok().filter(|t| !t.is_empty()) {
            return Some((token, TokenSource::Env));
        }

        self.load_file().map(|token| (token, TokenSource::File))
    }

    /// Delete the token from keyring and file. Missing entries are not errors.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenStoreError` if the credentials file cannot be removed.
    pub fn delete(&self) -> Result<(), AuthError> {
        if let Some(entry) = self.keyring_entry() {
            let _ = entry.delete_credential();
        }

        if self.file_path.exists() {
            fs::remove_file(&self.file_path).map_err(|e| {
                AuthError::TokenStoreError(format!(
                    "failed to delete {}: {e}",
                    self.file_path.display()
                ))
            })?;
        }
        Ok(())
    }

    fn keyring_entry(&self) -> Option<keyring::Entry> {
        let service = self.keyring_service.as_deref()?;
        match keyring::Entry::new(service, KEYRING_USER) {
            Ok(entry) => Some(entry),
            Err(error) => {
                tracing::debug!(%error, "keyring unavailable");
                None
            }
        }
    }

    fn store_file(&self, token: &str) -> Result<(), AuthError> {
        let path = &self.file_path;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                AuthError::TokenStoreError(format!("mkdir {}: {e}", parent.display()))
            })?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Err(e) = fs::set_permissions(parent, fs::Permissions::from_mode(0o700)) {
                    tracing::warn!("failed to chmod 0700 {}: {e}", parent.display());
                }
            }
        }
        fs::write(path, token)
            .map_err(|e| AuthError::TokenStoreError(format!("write {}: {e}", path.display())))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|e| {
                AuthError::TokenStoreError(format!("chmod {}: {e}", path.display()))
            })?;
        }

        Ok(())
    }

    fn load_file(&self) -> Option<String> {
        fs::read_to_string(&self.file_path)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
}
