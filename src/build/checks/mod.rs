//! Pre-build checks
//!
//! A check inspects the profile and settings and yields warnings; it never
//! mutates either. [`BuildChecker`] runs every check in parallel and folds
//! the results into a [`PreBuildReport`].

mod bad_archives;
mod missing_plugins;
mod orphaned_npcs;
mod wig_conversions;

use std::collections::HashMap;
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::warnings::{BuildWarning, BuildWarningId};
use super::{BuildSettings, Profile};
use crate::npc::AttributeGroup;
use crate::records::{LoadOrder, eq_ignore_case};

pub use bad_archives::{ArchiveProvider, BadArchives};
pub use missing_plugins::MissingPlugins;
pub use orphaned_npcs::OrphanedNpcs;
pub use wig_conversions::WigConversions;

/// Lazily produced warnings of one check.
pub type Warnings<'a> = Box<dyn Iterator<Item = BuildWarning> + 'a>;

pub trait BuildCheck: Send + Sync {
    fn name(&self) -> &str;

    fn run<'a>(&'a self, profile: &'a Profile, settings: &'a BuildSettings) -> Warnings<'a>;
}

/// A plugin the output will depend on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterDependency {
    pub plugin_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreBuildReport {
    pub masters: Vec<MasterDependency>,
    pub warnings: Vec<BuildWarning>,
}

impl PreBuildReport {
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Runs the configured checks and applies per-plugin suppressions.
pub struct BuildChecker {
    checks: Vec<Box<dyn BuildCheck>>,
    load_order: Arc<dyn LoadOrder>,
    /// Case-folded plugin name to suppressed ids.
    suppressions: HashMap<String, Vec<BuildWarningId>>,
}

impl BuildChecker {
    pub fn new(load_order: Arc<dyn LoadOrder>) -> Self {
        Self {
            checks: Vec::new(),
            load_order,
            suppressions: HashMap::new(),
        }
    }

    /// The four standard checks minus any named in `disabled`.
    pub fn standard(
        load_order: Arc<dyn LoadOrder>,
        archives: Arc<dyn ArchiveProvider>,
        disabled: &[String],
    ) -> Self {
        let all: Vec<Box<dyn BuildCheck>> = vec![
            Box::new(BadArchives::new(archives, Arc::clone(&load_order))),
            Box::new(MissingPlugins::new(Arc::clone(&load_order))),
            Box::new(OrphanedNpcs::new(Arc::clone(&load_order))),
            Box::new(WigConversions),
        ];
        let mut checker = Self::new(load_order);
        for check in all {
            if disabled.iter().any(|d| eq_ignore_case(d, check.name())) {
                debug!(check = %check.name(), "Check disabled by configuration");
                continue;
            }
            checker.checks.push(check);
        }
        checker
    }

    #[must_use]
    pub fn with_check(mut self, check: Box<dyn BuildCheck>) -> Self {
        self.checks.push(check);
        self
    }

    #[must_use]
    pub fn with_suppressions<I, S>(mut self, suppressions: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<BuildWarningId>)>,
        S: AsRef<str>,
    {
        for (plugin, ids) in suppressions {
            self.suppressions
                .entry(plugin.as_ref().to_lowercase())
                .or_default()
                .extend(ids);
        }
        self
    }

    pub fn check_names(&self) -> impl Iterator<Item = &str> {
        self.checks.iter().map(|c| c.name())
    }

    pub fn check_all(&self, profile: &Profile, settings: &BuildSettings) -> PreBuildReport {
        let mut warnings: Vec<BuildWarning> = self
            .checks
            .par_iter()
            .flat_map_iter(|check| {
                let found: Vec<BuildWarning> = check.run(profile, settings).collect();
                debug!(check = %check.name(), warnings = found.len(), "Check finished");
                found
            })
            .filter(|w| !self.is_suppressed(w))
            .collect();
        warnings.sort_by(|a, b| a.id.cmp(&b.id).then_with(|| a.plugin_name.cmp(&b.plugin_name)));

        let masters = self.masters(profile);
        info!(
            checks = self.checks.len(),
            warnings = warnings.len(),
            masters = masters.len(),
            "Pre-build checks complete"
        );
        PreBuildReport { masters, warnings }
    }

    fn is_suppressed(&self, warning: &BuildWarning) -> bool {
        let (Some(id), Some(plugin)) = (warning.id, warning.plugin_name.as_deref()) else {
            return false;
        };
        self.suppressions
            .get(&plugin.to_lowercase())
            .is_some_and(|ids| ids.contains(&id))
    }

    /// Transitive masters of every default plugin, then the default plugins
    /// themselves, without duplicates.
    fn masters(&self, profile: &Profile) -> Vec<MasterDependency> {
        let mut defaults: Vec<&str> = Vec::new();
        for npc in &profile.npcs {
            let plugin = npc.resolve_winner(AttributeGroup::Behavior);
            if !defaults.iter().any(|p| eq_ignore_case(p, plugin)) {
                defaults.push(plugin);
            }
        }

        let mut names: Vec<String> = Vec::new();
        let candidates = defaults
            .iter()
            .flat_map(|p| self.load_order.all_masters(p))
            .chain(defaults.iter().map(ToString::to_string));
        for name in candidates {
            if !names.iter().any(|n| eq_ignore_case(n, &name)) {
                names.push(name);
            }
        }
        names
            .into_iter()
            .map(|plugin_name| MasterDependency { plugin_name })
            .collect()
    }
}

impl std::fmt::Debug for BuildChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildChecker")
            .field("checks", &self.check_names().collect::<Vec<_>>())
            .field("suppressions", &self.suppressions)
            .finish_non_exhaustive()
    }
}
