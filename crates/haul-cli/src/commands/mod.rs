mod auth;
mod guard;
mod presence;

use haul_config::HaulConfig;

use crate::cli::{Commands, GlobalFlags};

pub async fn dispatch(
    command: Commands,
    flags: &GlobalFlags,
    config: &HaulConfig,
) -> anyhow::Result<()> {
    match command {
        Commands::Auth { action } => auth::handle(&action, flags, config).await,
        Commands::Guard(args) => guard::handle(&args, flags, config).await,
        Commands::Presence { action } => presence::handle(&action, flags, config).await,
    }
}
