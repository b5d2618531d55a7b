use serde::{Deserialize, Serialize};

/// Authenticated account as reported by the hosted identity provider.
///
/// Only a projection: the provider owns the record, Haulage never mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Provider-issued user id. Also the key of the profile record.
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Whether the account's email address has been confirmed.
    #[serde(default)]
    pub email_confirmed: bool,
}

impl Identity {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
            email_confirmed: false,
        }
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>, confirmed: bool) -> Self {
        self.email = Some(email.into());
        self.email_confirmed = confirmed;
        self
    }
}
