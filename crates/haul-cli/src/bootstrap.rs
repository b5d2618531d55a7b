use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use haul_auth::{
    ActivityHeartbeat, AuthContext, AuthSnapshot, RestBackend, SessionCache, SessionResolver,
    SystemClock, TokenStore,
};
use haul_config::HaulConfig;

pub fn load_config() -> anyhow::Result<HaulConfig> {
    let config = HaulConfig::load_with_dotenv().context("failed to load configuration")?;
    config.validate()?;
    Ok(config)
}

pub fn token_store() -> anyhow::Result<TokenStore> {
    TokenStore::default_location().map_err(anyhow::Error::from)
}

pub fn session_cache(config: &HaulConfig) -> anyhow::Result<SessionCache> {
    SessionCache::from_config(&config.session, Arc::new(SystemClock)).map_err(anyhow::Error::from)
}

pub fn backend(config: &HaulConfig) -> anyhow::Result<Arc<RestBackend>> {
    config.require_backend()?;
    let backend = RestBackend::from_config(&config.backend, token_store()?)?;
    Ok(Arc::new(backend))
}

/// Start an auth context and run its first resolution.
///
/// With `fresh`, the cached session is dropped and the backend is asked.
pub async fn activate_session(
    config: &HaulConfig,
    fresh: bool,
) -> anyhow::Result<(AuthContext<RestBackend>, AuthSnapshot)> {
    let resolver = SessionResolver::new(backend(config)?, session_cache(config)?);
    let context = if fresh {
        let context = AuthContext::new(resolver);
        context.refresh_fresh().await;
        context
    } else {
        AuthContext::activate(resolver).await
    };
    let snapshot = context.snapshot();
    Ok((context, snapshot))
}

pub fn heartbeat(config: &HaulConfig) -> anyhow::Result<ActivityHeartbeat<RestBackend>> {
    Ok(ActivityHeartbeat::new(
        backend(config)?,
        Arc::new(SystemClock),
        Duration::from_secs(config.heartbeat.interval_secs),
    ))
}
