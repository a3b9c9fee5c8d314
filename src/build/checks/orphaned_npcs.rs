use std::sync::Arc;

use super::{BuildCheck, Warnings};
use crate::build::warnings::{BuildWarning, BuildWarningId, messages};
use crate::build::{BuildSettings, Profile};
use crate::records::{LoadOrder, RecordKeyLike, eq_ignore_case};

/// Warns once per NPC base plugin that is no longer in the load order.
pub struct OrphanedNpcs {
    load_order: Arc<dyn LoadOrder>,
}

impl OrphanedNpcs {
    pub fn new(load_order: Arc<dyn LoadOrder>) -> Self {
        Self { load_order }
    }
}

impl BuildCheck for OrphanedNpcs {
    fn name(&self) -> &str {
        "OrphanedNpcs"
    }

    fn run<'a>(&'a self, profile: &'a Profile, _settings: &'a BuildSettings) -> Warnings<'a> {
        let installed = self.load_order.plugins();
        let mut orphaned: Vec<&str> = Vec::new();
        for npc in &profile.npcs {
            let base = npc.base_plugin_name();
            if installed.iter().any(|p| eq_ignore_case(p, base))
                || orphaned.iter().any(|p| eq_ignore_case(p, base))
            {
                continue;
            }
            orphaned.push(base);
        }
        Box::new(orphaned.into_iter().map(|plugin| {
            BuildWarning::new(
                BuildWarningId::MasterPluginRemoved,
                messages::master_plugin_removed(plugin),
            )
            .with_plugin(plugin)
        }))
    }
}
