//! Command-line interface definitions and parsing

use clap::{Parser, Subcommand};

use trigger_core::ModeKind;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log advertisements instead of transmitting them
    #[arg(long)]
    pub dry_run: bool,

    /// Print controller events as JSON lines
    #[arg(long)]
    pub json: bool,

    /// Bluetooth adapter to advertise from (e.g. hci0)
    #[arg(short, long)]
    pub adapter: Option<String>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// One original payload followed by a burst of randomly fuzzed ones, repeating
    Burst {
        /// Stop after this many seconds instead of waiting for Ctrl+C
        #[arg(short, long)]
        duration_secs: Option<u64>,
    },
    /// Count the fuzz value up by one on every transmission
    Sweep {
        /// Stop after this many seconds instead of waiting for Ctrl+C
        #[arg(short, long)]
        duration_secs: Option<u64>,
    },
    /// Advertise the original payload once until stopped
    Single {
        /// Stop after this many seconds instead of waiting for Ctrl+C
        #[arg(short, long)]
        duration_secs: Option<u64>,
    },
    /// Read mode commands from stdin (burst, sweep, single, stop, status, quit)
    Interactive,
}

impl Commands {
    /// Mode entered by a one-shot command, `None` for interactive mode
    pub fn mode(&self) -> Option<(ModeKind, Option<u64>)> {
        match *self {
            Commands::Burst { duration_secs } => Some((ModeKind::Burst, duration_secs)),
            Commands::Sweep { duration_secs } => Some((ModeKind::Sweep, duration_secs)),
            Commands::Single { duration_secs } => Some((ModeKind::Single, duration_secs)),
            Commands::Interactive => None,
        }
    }
}
