//! [`RemoteBackend`] over the hosted backend's HTTP API.
//!
//! Identity comes from the auth endpoint (`/auth/v1/user`); roles and
//! presence live on a REST-exposed profiles table (`/rest/v1/<table>`).
//! Every request carries the project's anonymous key as `apikey` and the
//! signed-in user's access token as a bearer token.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use haul_config::BackendConfig;
use haul_core::{Identity, Role};
use reqwest::{Response, StatusCode};
use serde::Deserialize;

use crate::error::AuthError;
use crate::remote::RemoteBackend;
use crate::token_store::TokenStore;

#[derive(Debug, Deserialize)]
struct UserRecord {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_confirmed_at: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RestBackend {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    profiles_table: String,
    role_column: String,
    last_active_column: String,
    tokens: TokenStore,
}

impl RestBackend {
    /// Build from the `[backend]` config section.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotConfigured` if the URL or anonymous key is
    /// missing, or `AuthError::Remote` if the HTTP client cannot be built.
    pub fn from_config(config: &BackendConfig, tokens: TokenStore) -> Result<Self, AuthError> {
        if !config.is_configured() {
            return Err(AuthError::NotConfigured(
                "set backend.url and backend.anon_key (HAUL_BACKEND__URL, HAUL_BACKEND__ANON_KEY)"
                    .into(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AuthError::Remote(format!("build http client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            profiles_table: config.profiles_table.clone(),
            role_column: config.role_column.clone(),
            last_active_column: config.last_active_column.clone(),
            tokens,
        })
    }

    #[must_use]
    pub const fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Token for calls made after the identity lookup. Losing it mid-session
    /// is a backend failure, not a sign-out.
    fn access_token(&self) -> Result<String, AuthError> {
        self.tokens
            .load()
            .ok_or_else(|| AuthError::Remote("no access token".into()))
    }

    fn profile_url(&self, identity_id: &str) -> String {
        format!(
            "{}/rest/v1/{}?id=eq.{}",
            self.base_url,
            urlencoding::encode(&self.profiles_table),
            urlencoding::encode(identity_id)
        )
    }

    fn parse_role(&self, row: &HashMap<String, serde_json::Value>) -> Option<Role> {
        match row.get(&self.role_column) {
            Some(serde_json::Value::String(raw)) => match raw.parse::<Role>() {
                Ok(role) => Some(role),
                Err(error) => {
                    tracing::warn!(%error, "treating unrecognised profile role as unset");
                    None
                }
            },
            Some(serde_json::Value::Null) | None => None,
            Some(other) => {
                tracing::warn!(value = %other, "treating non-string profile role as unset");
                None
            }
        }
    }
}

async fn ensure_success(resp: Response, what: &str) -> Result<Response, AuthError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    Err(AuthError::Remote(format!("{what}: HTTP {status}: {body}")))
}

impl RemoteBackend for RestBackend {
    async fn current_identity(&self) -> Result<Option<Identity>, AuthError> {
        let Some(token) = self.tokens.load() else {
            tracing::debug!("no access token stored; treating as signed out");
            return Ok(None);
        };

        let resp = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| AuthError::Remote(format!("get user: {e}")))?;

        if matches!(resp.status(), StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            tracing::debug!(status = %resp.status(), "access token rejected; treating as signed out");
            return Ok(None);
        }

        let user: UserRecord = ensure_success(resp, "get user")
            .await?
            .json()
            .await
            .map_err(|e| AuthError::Remote(format!("parse user: {e}")))?;

        Ok(Some(Identity {
            id: user.id,
            email: user.email,
            email_confirmed: user.email_confirmed_at.is_some(),
        }))
    }

    async fn profile_role(&self, identity_id: &str) -> Result<Option<Role>, AuthError> {
        let token = self.access_token()?;
        let url = format!(
            "{}&select={}",
            self.profile_url(identity_id),
            urlencoding::encode(&self.role_column)
        );

        let resp = self
            .client
            .get(url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| AuthError::Remote(format!("get profile: {e}")))?;

        let rows: Vec<HashMap<String, serde_json::Value>> = ensure_success(resp, "get profile")
            .await?
            .json()
            .await
            .map_err(|e| AuthError::Remote(format!("parse profile: {e}")))?;

        Ok(rows.first().and_then(|row| self.parse_role(row)))
    }

    async fn update_last_active(&self, identity_id: &str, at: DateTime<Utc>) -> Result<(), AuthError> {
        let token = self.access_token()?;
        let mut body = serde_json::Map::new();
        body.insert(
            self.last_active_column.clone(),
            serde_json::Value::String(at.to_rfc3339()),
        );

        let resp = self
            .client
            .patch(self.profile_url(identity_id))
            .header("apikey", &self.anon_key)
            .header("Prefer", "return=minimal")
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AuthError::Remote(format!("update last active: {e}")))?;

        ensure_success(resp, "update last active").await?;
        Ok(())
    }
}
