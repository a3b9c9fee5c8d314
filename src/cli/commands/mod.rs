//! CLI command implementations
//!
//! Each subcommand has its own module with:
//! - Args struct for command-line arguments
//! - `run()` function to execute the command

use std::path::Path;
use std::sync::Arc;

use crate::app::AppContext;
use crate::build::stages::BuildServices;
use crate::build::{ArchiveProvider, BuildChecker, JsonOutputWriter};
use crate::cli::Commands;
use crate::compat::npc_rule_set;
use crate::error::Result;
use crate::npc::NpcAnalysis;
use crate::records::{AnalysisProvider, LoadOrder};
use crate::source::LoadOrderFile;

pub mod build;
pub mod check;
pub mod inspect;
pub mod rules;

pub fn run(ctx: &AppContext, command: &Commands) -> Result<()> {
    match command {
        Commands::Build(args) => build::run(ctx, args),
        Commands::Check(args) => check::run(ctx, args),
        Commands::Rules(args) => rules::run(ctx, args),
        Commands::Inspect(args) => inspect::run(ctx, args),
    }
}

pub(crate) fn load_source(path: &Path) -> Result<Arc<LoadOrderFile>> {
    Ok(Arc::new(LoadOrderFile::load(path)?))
}

/// Wires the configured rules, checks and JSON writer around `source`.
pub(crate) fn services(ctx: &AppContext, source: &Arc<LoadOrderFile>) -> BuildServices {
    let provider: Arc<dyn AnalysisProvider<NpcAnalysis>> = source.clone();
    let load_order: Arc<dyn LoadOrder> = source.clone();
    let archives: Arc<dyn ArchiveProvider> = source.clone();
    let checker = BuildChecker::standard(
        Arc::clone(&load_order),
        archives,
        &ctx.config.checks.disabled,
    )
    .with_suppressions(ctx.config.suppressions());
    BuildServices {
        provider,
        load_order,
        rules: Arc::new(npc_rule_set(&ctx.config.compatibility.disabled_rules)),
        checker: Arc::new(checker),
        writer: Arc::new(JsonOutputWriter),
    }
}
