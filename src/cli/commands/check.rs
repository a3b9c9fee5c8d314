//! npcm check - Pre-build checks without merging

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use itertools::Itertools;
use serde::Serialize;

use super::{load_source, services};
use crate::app::AppContext;
use crate::build::checks::PreBuildReport;
use crate::build::stages::{PreBuildChecks, ResolveChains};
use crate::build::{BuildPipeline, BuildSettings, BuildState};
use crate::cli::output::{emit_json, robot_ok};
use crate::cli::progress::ProgressReporter;
use crate::error::{NpcError, Result};

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Load-order file describing plugins, bad archives and NPC analyses
    pub load_order: PathBuf,

    /// Exit with an error when any warning remains after suppressions
    #[arg(long)]
    pub strict: bool,
}

#[derive(Serialize)]
struct CheckReport<'a> {
    npcs: usize,
    excluded: usize,
    checks: Vec<&'a str>,
    #[serde(flatten)]
    report: &'a PreBuildReport,
}

pub fn run(ctx: &AppContext, args: &CheckArgs) -> Result<()> {
    let source = load_source(&args.load_order)?;
    let services = services(ctx, &source);
    let checker = services.checker.clone();
    let pipeline = BuildPipeline::new()
        .stage(ResolveChains {
            provider: services.provider,
            load_order: services.load_order,
            rules: services.rules,
        })
        .stage(PreBuildChecks {
            checker: services.checker,
        });

    let reporter = ProgressReporter::new(ctx.robot_mode, ctx.quiet);
    let tracker = reporter.track(pipeline.tasks());
    let state = pipeline
        .start(BuildState::new(BuildSettings::from_config(&ctx.config)))?
        .wait();
    tracker.join();
    let state = state.into_result()?;

    if ctx.robot_mode {
        emit_json(&robot_ok(CheckReport {
            npcs: state.profile.len(),
            excluded: state.excluded.len(),
            checks: checker.check_names().collect(),
            report: &state.report,
        }))?;
    } else if !ctx.quiet {
        println!("{}", "npcm check - Pre-build Checks".bold());
        println!();
        println!(
            "Checked {} NPC(s) ({} excluded) with: {}",
            state.profile.len(),
            state.excluded.len(),
            checker.check_names().join(", ")
        );
        if state.report.has_warnings() {
            for warning in &state.report.warnings {
                println!("{} {warning}", "!".yellow());
            }
        } else {
            println!("{} No warnings", "✓".green());
        }
        for master in &state.report.masters {
            println!("  master: {}", master.plugin_name);
        }
    }

    if args.strict && state.report.has_warnings() {
        return Err(NpcError::BuildBlocked(format!(
            "{} pre-build warning(s)",
            state.report.warnings.len()
        )));
    }
    Ok(())
}
