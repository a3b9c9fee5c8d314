//! npcm build - Resolve, check, merge and write every NPC

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use itertools::Itertools;
use serde::Serialize;

use super::{load_source, services};
use crate::app::AppContext;
use crate::build::checks::MasterDependency;
use crate::build::stages::standard_pipeline;
use crate::build::{BuildSettings, BuildState, BuildSummary, BuildWarning, WigSafetyPolicy};
use crate::cli::output::{emit_json, robot_ok_with_warnings};
use crate::cli::progress::ProgressReporter;
use crate::error::{NpcError, Result};
use crate::records::RecordKey;

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Load-order file describing plugins, bad archives and NPC analyses
    pub load_order: PathBuf,

    /// Output directory (overrides build.output_dir)
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Output plugin name (overrides build.output_plugin_name)
    #[arg(long)]
    pub plugin_name: Option<String>,

    /// Wig safety policy: warn or block (overrides build.wig_safety)
    #[arg(long)]
    pub wig_safety: Option<WigSafetyPolicy>,
}

#[derive(Serialize)]
struct BuildReport<'a> {
    summary: Option<&'a BuildSummary>,
    masters: &'a [MasterDependency],
    warnings: &'a [BuildWarning],
    excluded: &'a [RecordKey],
}

pub fn run(ctx: &AppContext, args: &BuildArgs) -> Result<()> {
    let settings = settings(ctx, args)?;
    let source = load_source(&args.load_order)?;
    let pipeline = standard_pipeline(services(ctx, &source));

    let reporter = ProgressReporter::new(ctx.robot_mode, ctx.quiet);
    let tracker = reporter.track(pipeline.tasks());
    let outcome = pipeline.start(BuildState::new(settings))?.wait();
    tracker.join();
    let state = outcome.into_result()?;

    if ctx.robot_mode {
        let report = BuildReport {
            summary: state.summary.as_ref(),
            masters: &state.report.masters,
            warnings: &state.report.warnings,
            excluded: &state.excluded,
        };
        let messages = state.report.warnings.iter().map(ToString::to_string).collect();
        return emit_json(&robot_ok_with_warnings(report, messages));
    }

    if !ctx.quiet {
        print_human(&state);
    }
    Ok(())
}

fn settings(ctx: &AppContext, args: &BuildArgs) -> Result<BuildSettings> {
    let mut settings = BuildSettings::from_config(&ctx.config);
    if let Some(dir) = &args.output {
        settings.output_dir = dir.clone();
    }
    if let Some(name) = &args.plugin_name {
        if name.trim().is_empty() {
            return Err(NpcError::Argument("--plugin-name must not be empty".into()));
        }
        settings.output_plugin_name = name.clone();
    }
    if let Some(policy) = args.wig_safety {
        settings.wig_safety = policy;
    }
    Ok(settings)
}

fn print_human(state: &BuildState) {
    for warning in &state.report.warnings {
        println!("{} {warning}", "!".yellow());
    }
    if let Some(summary) = &state.summary {
        println!(
            "{} Merged {} NPC(s), {} excluded by compatibility rules",
            "✓".green(),
            summary.npc_count.to_string().bold(),
            summary.excluded_count
        );
        println!("  FaceGen required: {}", summary.face_gen_count);
        if summary.wig_warning_count > 0 {
            println!(
                "  {} {} wig warning(s)",
                "!".yellow(),
                summary.wig_warning_count
            );
        }
        if let Some(path) = &summary.output_path {
            println!("  Output: {}", path.display().to_string().cyan());
        }
    }
    if !state.report.masters.is_empty() {
        let masters = state.report.masters.iter().map(|m| &m.plugin_name).join(", ");
        println!("  Masters: {masters}");
    }
}
