//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - scan: list leftover views without touching them
//! - drop: drop leftover views, retrying until done or stalled
//! - connections: list configured connections

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use viewsweep::sweep::SweepOptions;

/// viewsweep - find and drop leftover pipeline views
#[derive(Parser, Debug)]
#[command(name = "viewsweep")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Report leftover views without dropping them
    Scan {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Drop leftover views
    Drop {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// List configured connections
    Connections,
}

/// Where to sweep and how to report it
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Connection name from the config file
    #[arg(short = 'C', long)]
    pub connection: String,

    /// Only look at this schema
    #[arg(short, long)]
    pub schema: Option<String>,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl TargetArgs {
    pub fn to_options(&self, perform_deletion: bool) -> SweepOptions {
        SweepOptions {
            connection_name: self.connection.clone(),
            schema_filter: self.schema.clone(),
            perform_deletion,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}
