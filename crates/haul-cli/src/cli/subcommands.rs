use clap::{Args, Subcommand};
use haul_core::Role;

/// Authentication commands.
#[derive(Clone, Debug, Subcommand)]
pub enum AuthCommands {
    /// Store a backend access token for subsequent commands.
    Login(AuthLoginArgs),
    /// Delete the stored token and the cached session.
    Logout,
    /// Resolve the current session and show it.
    Status(AuthStatusArgs),
}

#[derive(Clone, Debug, Args)]
pub struct AuthLoginArgs {
    /// Access token issued by the backend's auth endpoint.
    #[arg(long)]
    pub token: String,
}

#[derive(Clone, Debug, Args)]
pub struct AuthStatusArgs {
    /// Ignore the session cache and ask the backend.
    #[arg(long)]
    pub fresh: bool,
}

#[derive(Clone, Debug, Args)]
pub struct GuardArgs {
    /// Role the protected screen requires (admin, dispatcher, driver, inventory_staff, client).
    pub role: Role,

    /// Ignore the session cache and ask the backend.
    #[arg(long)]
    pub fresh: bool,
}

/// Presence commands.
#[derive(Clone, Debug, Subcommand)]
pub enum PresenceCommands {
    /// Write a last-active timestamp for the signed-in user now.
    Touch,
}
