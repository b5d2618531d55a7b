use haul_auth::AuthSnapshot;
use haul_config::HaulConfig;
use haul_core::SessionStatus;
use haul_core::enums::AWAITING_APPROVAL_ROUTE;
use serde::Serialize;

use crate::bootstrap;
use crate::cli::GlobalFlags;
use crate::cli::subcommands::{AuthCommands, AuthLoginArgs, AuthStatusArgs};
use crate::output::output;

#[derive(Serialize)]
struct AuthLoginResponse {
    stored: bool,
    token_source: Option<&'static str>,
}

#[derive(Serialize)]
struct AuthLogoutResponse {
    cleared: bool,
}

#[derive(Serialize)]
struct AuthStatusResponse {
    #[serde(flatten)]
    snapshot: AuthSnapshot,
    status: &'static str,
    landing_route: Option<&'static str>,
    token_source: Option<&'static str>,
    cache_path: String,
}

/// Handle `haul auth <subcommand>`.
pub async fn handle(
    action: &AuthCommands,
    flags: &GlobalFlags,
    config: &HaulConfig,
) -> anyhow::Result<()> {
    match action {
        AuthCommands::Login(args) => login(args, flags, config),
        AuthCommands::Logout => logout(flags, config),
        AuthCommands::Status(args) => status(args, flags, config).await,
    }
}

fn login(args: &AuthLoginArgs, flags: &GlobalFlags, config: &HaulConfig) -> anyhow::Result<()> {
    let tokens = bootstrap::token_store()?;
    tokens.store(args.token.trim())?;
    // A new token may belong to a different account.
    bootstrap::session_cache(config)?.clear()?;

    let response = AuthLoginResponse {
        stored: true,
        token_source: tokens.load_with_source().map(|(_, source)| source.as_str()),
    };
    output(&response, flags.format)
}

fn logout(flags: &GlobalFlags, config: &HaulConfig) -> anyhow::Result<()> {
    bootstrap::token_store()?.delete()?;
    bootstrap::session_cache(config)?.clear()?;
    output(&AuthLogoutResponse { cleared: true }, flags.format)
}

async fn status(
    args: &AuthStatusArgs,
    flags: &GlobalFlags,
    config: &HaulConfig,
) -> anyhow::Result<()> {
    let (context, snapshot) = bootstrap::activate_session(config, args.fresh).await?;

    let status = snapshot.status();
    let response = AuthStatusResponse {
        landing_route: match status {
            SessionStatus::Active(role) => Some(role.landing_route()),
            SessionStatus::AwaitingApproval => Some(AWAITING_APPROVAL_ROUTE),
            SessionStatus::SignedOut => None,
        },
        status: status.as_str(),
        token_source: context
            .resolver()
            .backend()
            .tokens()
            .load_with_source()
            .map(|(_, source)| source.as_str()),
        cache_path: context.resolver().cache().path().display().to_string(),
        snapshot,
    };
    output(&response, flags.format)
}
