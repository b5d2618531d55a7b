use haul_config::HaulConfig;
use serde::Serialize;

use crate::bootstrap;
use crate::cli::GlobalFlags;
use crate::cli::subcommands::PresenceCommands;
use crate::output::output;

#[derive(Serialize)]
struct PresenceResponse {
    written: bool,
    at: Option<String>,
    note: Option<&'static str>,
}

/// Handle `haul presence <subcommand>`.
pub async fn handle(
    action: &PresenceCommands,
    flags: &GlobalFlags,
    config: &HaulConfig,
) -> anyhow::Result<()> {
    match action {
        PresenceCommands::Touch => touch(flags, config).await,
    }
}

async fn touch(flags: &GlobalFlags, config: &HaulConfig) -> anyhow::Result<()> {
    let response = if config.heartbeat.enabled {
        let heartbeat = bootstrap::heartbeat(config)?;
        let written = heartbeat.touch().await;
        PresenceResponse {
            written,
            at: heartbeat.last_update().map(|at| at.to_rfc3339()),
            note: (!written).then_some("presence write skipped or failed; see logs"),
        }
    } else {
        PresenceResponse {
            written: false,
            at: None,
            note: Some("heartbeat disabled (heartbeat.enabled = false)"),
        }
    };
    output(&response, flags.format)
}
