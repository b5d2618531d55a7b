use haul_auth::{GuardDecision, GuardRoutes, decide};
use haul_config::HaulConfig;
use haul_core::Role;
use serde::Serialize;

use crate::bootstrap;
use crate::cli::GlobalFlags;
use crate::cli::subcommands::GuardArgs;
use crate::output::output;

#[derive(Serialize)]
struct GuardResponse {
    required_role: Role,
    #[serde(flatten)]
    decision: GuardDecision,
    redirect_delay_ms: Option<u64>,
}

/// Handle `haul guard <role>`.
pub async fn handle(args: &GuardArgs, flags: &GlobalFlags, config: &HaulConfig) -> anyhow::Result<()> {
    let (_context, snapshot) = bootstrap::activate_session(config, args.fresh).await?;

    let routes = GuardRoutes::from(&config.guard);
    let decision = decide(args.role, &snapshot, &routes);
    let redirect_delay_ms = matches!(decision, GuardDecision::Redirecting { .. })
        .then_some(config.guard.redirect_delay_ms);

    output(
        &GuardResponse {
            required_role: args.role,
            decision,
            redirect_delay_ms,
        },
        flags.format,
    )
}
