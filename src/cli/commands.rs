//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Singer tap for the Oracle Simphony BI API
#[derive(Parser, Debug)]
#[command(name = "tap-simphony")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Inline config JSON
    #[arg(long, global = true, conflicts_with = "config")]
    pub config_json: Option<String>,

    /// State file (JSON), updated in place as bookmarks advance
    #[arg(short, long, global = true)]
    pub state: Option<PathBuf>,

    /// Inline state JSON
    #[arg(long, global = true, conflicts_with = "state")]
    pub state_json: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Print the configuration schema
    Spec,

    /// Authenticate against the identity provider
    Check,

    /// Print the stream catalog
    Discover,

    /// Read data from streams
    Read {
        /// Streams to sync (comma-separated, empty = all)
        #[arg(long)]
        streams: Option<String>,
    },
}

impl Commands {
    /// Name of the command, used to report failures
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Spec => "spec",
            Commands::Check => "check",
            Commands::Discover => "discover",
            Commands::Read { .. } => "read",
        }
    }
}
