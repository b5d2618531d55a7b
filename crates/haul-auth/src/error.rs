use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("remote backend error: {0}")]
    Remote(String),

    #[error("token store error: {0}")]
    TokenStoreError(String),

    #[error("session cache error: {0}")]
    CacheError(String),

    #[error("not configured: {0}")]
    NotConfigured(String),
}
