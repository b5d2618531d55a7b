use clap::{Parser, Subcommand};

pub mod global;
pub mod subcommands;

pub use global::{GlobalFlags, OutputFormat};
use subcommands::{AuthCommands, GuardArgs, PresenceCommands};

/// Top-level CLI parser for the `haul` binary.
#[derive(Debug, Parser)]
#[command(name = "haul", version, about = "Haulage - session gate for logistics operations")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, raw
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Sign in, sign out, and inspect the session.
    Auth {
        #[command(subcommand)]
        action: AuthCommands,
    },
    /// Evaluate the role guard for a protected screen.
    Guard(GuardArgs),
    /// Presence heartbeat.
    Presence {
        #[command(subcommand)]
        action: PresenceCommands,
    },
}

impl Cli {
    #[must_use]
    pub const fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
        }
    }
}
