//! The standard build stages and the state they share.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::checks::{BuildChecker, PreBuildReport};
use super::output::OutputWriter;
use super::pipeline::{BuildPipeline, Stage};
use super::task::TaskContext;
use super::{BuildSettings, Profile, WigSafetyPolicy};
use crate::compat::CompatibilityRuleSet;
use crate::error::{NpcError, Result};
use crate::npc::{MergedNpc, Npc, NpcAnalysis};
use crate::records::{AnalysisProvider, ChainResolver, LoadOrder, RecordKey};

/// State threaded through every stage of a build.
#[derive(Debug, Clone, Default)]
pub struct BuildState {
    pub settings: BuildSettings,
    pub profile: Profile,
    /// NPCs rejected by the compatibility rules.
    pub excluded: Vec<RecordKey>,
    pub report: PreBuildReport,
    pub merged: Vec<MergedNpc>,
    pub output_path: Option<PathBuf>,
    pub summary: Option<BuildSummary>,
}

impl BuildState {
    #[must_use]
    pub fn new(settings: BuildSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSummary {
    pub npc_count: usize,
    pub excluded_count: usize,
    pub face_gen_count: usize,
    pub warning_count: usize,
    pub wig_warning_count: usize,
    pub output_path: Option<PathBuf>,
    pub finished_at: DateTime<Utc>,
}

/// External services the standard stages read from.
#[derive(Clone)]
pub struct BuildServices {
    pub provider: Arc<dyn AnalysisProvider<NpcAnalysis>>,
    pub load_order: Arc<dyn LoadOrder>,
    pub rules: Arc<CompatibilityRuleSet<NpcAnalysis>>,
    pub checker: Arc<BuildChecker>,
    pub writer: Arc<dyn OutputWriter>,
}

/// Resolve chains, pre-build checks, merge, write output, report.
pub fn standard_pipeline(services: BuildServices) -> BuildPipeline<BuildState> {
    BuildPipeline::new()
        .stage(ResolveChains {
            provider: services.provider,
            load_order: services.load_order,
            rules: services.rules,
        })
        .stage(PreBuildChecks {
            checker: services.checker,
        })
        .stage(MergeNpcs)
        .stage(WriteOutput {
            writer: services.writer,
        })
        .stage(Report)
}

/// Builds one [`Npc`] per supported record from the eligible override chains.
pub struct ResolveChains {
    pub provider: Arc<dyn AnalysisProvider<NpcAnalysis>>,
    pub load_order: Arc<dyn LoadOrder>,
    pub rules: Arc<CompatibilityRuleSet<NpcAnalysis>>,
}

impl Stage<BuildState> for ResolveChains {
    fn name(&self) -> &str {
        "Resolve override chains"
    }

    fn run(&self, state: &mut BuildState, ctx: &TaskContext<'_>) -> Result<()> {
        let keys = self.provider.record_keys();
        ctx.set_item_count(keys.len());
        let resolver = ChainResolver::new(self.provider.as_ref(), self.load_order.as_ref());
        for key in keys {
            ctx.next_item(&key.to_string())?;
            let Some(chain) = resolver.resolve(&key)? else {
                continue;
            };
            if self.rules.is_supported(&chain.winner().analysis) {
                state.profile.npcs.push(Npc::from_chain(&chain));
            } else {
                state.excluded.push(key);
            }
        }
        info!(
            npcs = state.profile.len(),
            excluded = state.excluded.len(),
            "Resolved override chains"
        );
        Ok(())
    }
}

pub struct PreBuildChecks {
    pub checker: Arc<BuildChecker>,
}

impl Stage<BuildState> for PreBuildChecks {
    fn name(&self) -> &str {
        "Pre-build checks"
    }

    fn run(&self, state: &mut BuildState, ctx: &TaskContext<'_>) -> Result<()> {
        ctx.set_item_count(1);
        ctx.next_item("Checking profile")?;
        state.report = self.checker.check_all(&state.profile, &state.settings);
        for warning in &state.report.warnings {
            warn!(
                id = ?warning.id,
                plugin = warning.plugin_name.as_deref().unwrap_or_default(),
                "{}",
                warning.message
            );
        }
        Ok(())
    }
}

/// Merges every NPC in parallel and enforces the wig safety policy.
pub struct MergeNpcs;

impl Stage<BuildState> for MergeNpcs {
    fn name(&self) -> &str {
        "Merge NPCs"
    }

    fn run(&self, state: &mut BuildState, ctx: &TaskContext<'_>) -> Result<()> {
        let npcs = &state.profile.npcs;
        ctx.set_item_count(npcs.len());
        let merged = npcs
            .par_iter()
            .map(|npc| -> Result<MergedNpc> {
                ctx.next_item(&npc.label())?;
                Ok(npc.merge())
            })
            .collect::<Result<Vec<_>>>()?;

        let unsafe_wigs: Vec<&MergedNpc> = merged
            .iter()
            .filter(|m| !m.wig_warnings.is_empty())
            .collect();
        if let Some(first) = unsafe_wigs.first() {
            match state.settings.wig_safety {
                WigSafetyPolicy::Block => {
                    return Err(NpcError::BuildBlocked(format!(
                        "{} NPC(s) would lose a wig while bald, starting with {} ({})",
                        unsafe_wigs.len(),
                        first.editor_id,
                        first.key
                    )));
                }
                WigSafetyPolicy::Warn => {
                    for npc in &unsafe_wigs {
                        warn!(npc = %npc.key, editor_id = %npc.editor_id, "Bald NPC may lose its wig");
                    }
                }
            }
        }

        state.merged = merged;
        Ok(())
    }
}

pub struct WriteOutput {
    pub writer: Arc<dyn OutputWriter>,
}

impl Stage<BuildState> for WriteOutput {
    fn name(&self) -> &str {
        "Write output"
    }

    fn run(&self, state: &mut BuildState, ctx: &TaskContext<'_>) -> Result<()> {
        ctx.set_item_count(1);
        ctx.next_item(&state.settings.output_plugin_name)?;
        let path = self.writer.write(&state.settings, &state.merged)?;
        state.output_path = Some(path);
        Ok(())
    }
}

pub struct Report;

impl Stage<BuildState> for Report {
    fn name(&self) -> &str {
        "Report"
    }

    fn run(&self, state: &mut BuildState, ctx: &TaskContext<'_>) -> Result<()> {
        ctx.checkpoint()?;
        let summary = BuildSummary {
            npc_count: state.merged.len(),
            excluded_count: state.excluded.len(),
            face_gen_count: state.merged.iter().filter(|m| m.face_gen_required).count(),
            warning_count: state.report.warnings.len(),
            wig_warning_count: state.merged.iter().map(|m| m.wig_warnings.len()).sum(),
            output_path: state.output_path.clone(),
            finished_at: Utc::now(),
        };
        info!(
            npcs = summary.npc_count,
            excluded = summary.excluded_count,
            face_gen = summary.face_gen_count,
            warnings = summary.warning_count,
            "Build finished"
        );
        state.summary = Some(summary);
        Ok(())
    }
}
