//! Build orchestration
//!
//! - [`checks`]: pre-build validation producing warnings
//! - [`signal`] / [`task`]: observable task state and progress
//! - [`pipeline`]: ordered, cancellable execution of build stages
//! - [`stages`]: the standard merge stages
//! - [`output`]: persisting the merged result

pub mod checks;
pub mod output;
pub mod pipeline;
pub mod signal;
pub mod stages;
pub mod task;
pub mod warnings;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{NpcError, Result};
use crate::npc::Npc;
use crate::records::{RecordKeyLike, keys_equal};

pub use checks::{ArchiveProvider, BuildCheck, BuildChecker, PreBuildReport};
pub use output::{JsonOutputWriter, OutputWriter};
pub use pipeline::{BuildOutcome, BuildPipeline, BuildRun, Stage};
pub use signal::Signal;
pub use stages::{BuildState, BuildSummary};
pub use task::{BuildTask, BuildTaskState, TaskContext};
pub use warnings::{BuildWarning, BuildWarningId};

/// NPCs selected for the build.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    pub npcs: Vec<Npc>,
}

impl Profile {
    #[must_use]
    pub const fn new(npcs: Vec<Npc>) -> Self {
        Self { npcs }
    }

    #[must_use]
    pub fn get<K: RecordKeyLike + ?Sized>(&self, key: &K) -> Option<&Npc> {
        self.npcs.iter().find(|npc| keys_equal(*npc, key))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.npcs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.npcs.is_empty()
    }
}

/// What to do when a bald NPC would lose its wig.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WigSafetyPolicy {
    #[default]
    Warn,
    Block,
}

impl fmt::Display for WigSafetyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Warn => "warn",
            Self::Block => "block",
        })
    }
}

impl FromStr for WigSafetyPolicy {
    type Err = NpcError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "warn" => Ok(Self::Warn),
            "block" => Ok(Self::Block),
            other => Err(NpcError::Config(format!(
                "invalid wig safety policy '{other}' (expected warn or block)"
            ))),
        }
    }
}

/// Settings fixed for the duration of one build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSettings {
    pub output_plugin_name: String,
    pub output_dir: PathBuf,
    pub enable_dewiggify: bool,
    pub wig_safety: WigSafetyPolicy,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl BuildSettings {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            output_plugin_name: config.build.output_plugin_name.clone(),
            output_dir: config.build.output_dir.clone(),
            enable_dewiggify: config.build.enable_dewiggify,
            wig_safety: config.build.wig_safety,
        }
    }
}
