//! CLI module for viewsweep - command-line interface and subcommands.

pub mod commands;

pub use commands::{Cli, Commands, OutputFormat, TargetArgs};
