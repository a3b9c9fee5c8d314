use std::sync::Arc;

use super::{BuildCheck, Warnings};
use crate::build::warnings::{BuildWarning, BuildWarningId, messages};
use crate::build::{BuildSettings, Profile};
use crate::npc::AttributeGroup;
use crate::records::{LoadOrder, RecordKeyLike, eq_ignore_case};

/// Warns when an NPC's resolved default or face plugin is not enabled.
pub struct MissingPlugins {
    load_order: Arc<dyn LoadOrder>,
}

impl MissingPlugins {
    pub fn new(load_order: Arc<dyn LoadOrder>) -> Self {
        Self { load_order }
    }
}

impl BuildCheck for MissingPlugins {
    fn name(&self) -> &str {
        "MissingPlugins"
    }

    fn run<'a>(&'a self, profile: &'a Profile, _settings: &'a BuildSettings) -> Warnings<'a> {
        Box::new(profile.npcs.iter().flat_map(move |npc| {
            let default_plugin = npc.resolve_winner(AttributeGroup::Behavior);
            let face_plugin = npc.resolve_winner(AttributeGroup::Face);
            let mut found = Vec::new();
            for (field, plugin) in [("default", default_plugin), ("face", face_plugin)] {
                if field == "face" && eq_ignore_case(plugin, default_plugin) {
                    continue;
                }
                // Orphaned masters are reported separately.
                if npc.is_declared_by(plugin) || self.load_order.is_enabled(plugin) {
                    continue;
                }
                found.push(
                    BuildWarning::new(
                        BuildWarningId::SelectedPluginRemoved,
                        messages::selected_plugin_removed(&npc.editor_id, &npc.name, field, plugin),
                    )
                    .with_record(npc.key.clone())
                    .with_plugin(plugin),
                );
            }
            found
        }))
    }
}
