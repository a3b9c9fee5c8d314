//! Winner resolution, FaceGen significance and wig safety for one NPC.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::face::NpcFaceData;
use super::model::{AttributeGroup, Npc, NpcOverride};
use crate::records::{RecordKey, eq_ignore_case};

/// Marks each face-editing override whose face differs, for FaceGen purposes,
/// from the nearest preceding face data (the master's when none precedes it).
pub fn compute_face_gen_significance(
    master_face_data: Option<&NpcFaceData>,
    overrides: &mut [NpcOverride],
) {
    let mut previous = master_face_data.cloned();
    for link in overrides.iter_mut() {
        let Some(face) = &link.face_data else {
            link.face_overrides_affect_face_gen = false;
            continue;
        };
        link.face_overrides_affect_face_gen = previous
            .as_ref()
            .is_none_or(|prev| !face.face_gen_eq(prev));
        previous = Some(face.clone());
    }
}

/// A face plugin whose bald wig would not survive into the target plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WigSafetyWarning {
    pub npc_key: RecordKey,
    pub face_plugin: String,
    pub target_plugin: String,
    pub target_group: AttributeGroup,
    pub wig_model_name: Option<String>,
}

impl Npc {
    /// Last non-ITPO override that changes `group`; `None` when the group is
    /// unmodified and the master's value stands.
    #[must_use]
    pub fn winning_override(&self, group: AttributeGroup) -> Option<&NpcOverride> {
        self.overrides
            .iter()
            .rev()
            .find(|x| !x.is_itpo() && x.modifies(group))
    }

    /// Plugin whose value wins for `group`.
    #[must_use]
    pub fn resolve_winner(&self, group: AttributeGroup) -> &str {
        self.winning_override(group)
            .map_or(self.master_plugin_name(), |x| x.plugin_name.as_str())
    }

    /// Checks whether taking body/outfits from another plugin would strip a
    /// bald NPC's wig. Never fails; callers choose whether to block.
    #[must_use]
    pub fn assess_wig_safety(&self) -> Vec<WigSafetyWarning> {
        let face_plugin = self.resolve_winner(AttributeGroup::Face);
        let Some(face_wig) = self.link(face_plugin).and_then(|x| x.wig.as_ref()) else {
            return Vec::new();
        };
        if !face_wig.is_bald {
            return Vec::new();
        }

        let mut warnings: Vec<WigSafetyWarning> = Vec::new();
        for group in [AttributeGroup::Body, AttributeGroup::Outfits] {
            let target = self.resolve_winner(group);
            if eq_ignore_case(target, face_plugin)
                || warnings
                    .iter()
                    .any(|w| eq_ignore_case(&w.target_plugin, target))
            {
                continue;
            }
            let compatible = self
                .link(target)
                .and_then(|x| x.wig.as_ref())
                .is_some_and(|w| w.is_compatible_with(face_wig));
            if compatible {
                continue;
            }
            debug!(
                npc = %self.key,
                face_plugin = %face_plugin,
                target_plugin = %target,
                group = %group,
                "Bald NPC would lose its wig"
            );
            warnings.push(WigSafetyWarning {
                npc_key: self.key.clone(),
                face_plugin: face_plugin.to_string(),
                target_plugin: target.to_string(),
                target_group: group,
                wig_model_name: face_wig.model_name.clone(),
            });
        }
        warnings
    }

    /// Final merged view of this NPC.
    #[must_use]
    pub fn merge(&self) -> MergedNpc {
        let face = self.winning_override(AttributeGroup::Face);
        MergedNpc {
            key: self.key.clone(),
            editor_id: self.editor_id.clone(),
            name: self.name.clone(),
            behavior_plugin: self.resolve_winner(AttributeGroup::Behavior).to_string(),
            body_plugin: self.resolve_winner(AttributeGroup::Body).to_string(),
            face_plugin: self.resolve_winner(AttributeGroup::Face).to_string(),
            outfits_plugin: self.resolve_winner(AttributeGroup::Outfits).to_string(),
            face_data: face
                .and_then(|x| x.face_data.clone())
                .or_else(|| self.master_face_data.clone()),
            face_gen_required: face.is_some_and(|x| x.face_overrides_affect_face_gen),
            wig_warnings: self.assess_wig_safety(),
        }
    }
}

/// Merge decision for one NPC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedNpc {
    pub key: RecordKey,
    pub editor_id: String,
    pub name: String,
    pub behavior_plugin: String,
    pub body_plugin: String,
    pub face_plugin: String,
    pub outfits_plugin: String,
    pub face_data: Option<NpcFaceData>,
    /// Whether the winning face edit needs its own FaceGen mesh.
    pub face_gen_required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub wig_warnings: Vec<WigSafetyWarning>,
}

impl MergedNpc {
    #[must_use]
    pub fn winner(&self, group: AttributeGroup) -> &str {
        match group {
            AttributeGroup::Behavior => &self.behavior_plugin,
            AttributeGroup::Body => &self.body_plugin,
            AttributeGroup::Face => &self.face_plugin,
            AttributeGroup::Outfits => &self.outfits_plugin,
        }
    }
}
