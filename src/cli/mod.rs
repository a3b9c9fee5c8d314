//! CLI module - Command-line interface definitions and handlers
//!
//! Uses clap v4 with derive macros for argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod commands;
pub mod output;
pub mod progress;

/// npcm - Merge NPC overrides across a load order
#[derive(Parser, Debug)]
#[command(name = "npcm")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Emit JSON on stdout and JSON logs on stderr
    #[arg(long, global = true)]
    pub robot: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file path (default: ~/.config/npcm/config.toml, then ./npcm.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve, check and merge every NPC in a load order
    Build(commands::build::BuildArgs),

    /// Run the pre-build checks without merging
    Check(commands::check::CheckArgs),

    /// Show the active compatibility rules
    Rules(commands::rules::RulesArgs),

    /// Show the override chain and per-group winners for one NPC
    Inspect(commands::inspect::InspectArgs),
}
