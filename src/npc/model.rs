//! NPC analyses, overrides and the per-NPC model built from an override chain.

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::face::NpcFaceData;
use super::merge::compute_face_gen_significance;
use crate::records::{RecordAnalysisChain, RecordKey, RecordKeyLike, eq_ignore_case};

/// Wig worn by an NPC through its worn-armor slot.
///
/// `is_bald` answers "would this NPC have no hair head part if the wig were
/// removed". It is a heuristic and only ever drives warnings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpcWigInfo {
    pub key: RecordKey,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub is_bald: bool,
}

impl NpcWigInfo {
    /// Same wig record, or same model (case-insensitive).
    #[must_use]
    pub fn is_compatible_with(&self, other: &Self) -> bool {
        if self.key == other.key {
            return true;
        }
        match (&self.model_name, &other.model_name) {
            (Some(a), Some(b)) => eq_ignore_case(a, b),
            _ => false,
        }
    }
}

/// What the analysis provider reports for one NPC record in one plugin.
///
/// `behavior`, `body` and `outfits` are opaque digests of those attribute
/// groups; two plugins agree on a group iff the digests are equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcAnalysis {
    pub key: RecordKey,
    #[serde(default)]
    pub editor_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_female: bool,
    #[serde(default)]
    pub is_child: bool,
    #[serde(default = "default_true")]
    pub can_use_face_gen: bool,
    #[serde(default)]
    pub behavior: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub outfits: String,
    #[serde(default)]
    pub face_data: Option<NpcFaceData>,
    #[serde(default)]
    pub wig: Option<NpcWigInfo>,
}

const fn default_true() -> bool {
    true
}

impl RecordKeyLike for NpcAnalysis {
    fn base_plugin_name(&self) -> &str {
        self.key.base_plugin_name()
    }

    fn local_form_id_hex(&self) -> &str {
        self.key.local_form_id_hex()
    }
}

/// Attribute groups resolved independently during a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeGroup {
    Behavior,
    Body,
    Face,
    Outfits,
}

impl AttributeGroup {
    pub const ALL: [Self; 4] = [Self::Behavior, Self::Body, Self::Face, Self::Outfits];
}

impl std::fmt::Display for AttributeGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Behavior => "behavior",
            Self::Body => "body",
            Self::Face => "face",
            Self::Outfits => "outfits",
        };
        f.write_str(name)
    }
}

/// One plugin's contribution to one NPC.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NpcOverride {
    pub plugin_name: String,
    #[serde(default)]
    pub modifies_behavior: bool,
    #[serde(default)]
    pub modifies_body: bool,
    #[serde(default)]
    pub modifies_outfits: bool,
    /// Present only when the face differs from the comparison record.
    #[serde(default)]
    pub face_data: Option<NpcFaceData>,
    #[serde(default)]
    pub face_overrides_affect_face_gen: bool,
    #[serde(default)]
    pub wig: Option<NpcWigInfo>,
    /// Plugin whose override this one duplicates exactly.
    #[serde(default)]
    pub itpo_plugin_name: Option<String>,
}

impl NpcOverride {
    #[must_use]
    pub fn new(plugin_name: impl Into<String>) -> Self {
        Self {
            plugin_name: plugin_name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn modifies_face(&self) -> bool {
        self.face_data.is_some()
    }

    /// Identical to a previous override; contributes nothing new.
    #[must_use]
    pub fn is_itpo(&self) -> bool {
        self.itpo_plugin_name
            .as_deref()
            .is_some_and(|name| !name.is_empty())
    }

    #[must_use]
    pub const fn modifies(&self, group: AttributeGroup) -> bool {
        match group {
            AttributeGroup::Behavior => self.modifies_behavior,
            AttributeGroup::Body => self.modifies_body,
            AttributeGroup::Face => self.modifies_face(),
            AttributeGroup::Outfits => self.modifies_outfits,
        }
    }
}

/// Merge model for one NPC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Npc {
    pub key: RecordKey,
    pub editor_id: String,
    pub name: String,
    pub is_female: bool,
    /// The declaring plugin's entry. Never modifies anything itself.
    pub master: NpcOverride,
    pub master_face_data: Option<NpcFaceData>,
    /// Every other chain link, in load order.
    pub overrides: Vec<NpcOverride>,
}

impl Npc {
    /// Builds the model from an NPC's override chain.
    #[must_use]
    pub fn from_chain(chain: &RecordAnalysisChain<NpcAnalysis>) -> Self {
        let master = chain.master();
        let master_index = chain.master_index();
        let winner = &chain.winner().analysis;

        let mut overrides = Vec::with_capacity(chain.len().saturating_sub(1));
        for (index, link) in chain.iter().enumerate() {
            if index == master_index {
                continue;
            }
            let previous = index.checked_sub(1).map(|i| &chain[i]);
            let itpo_plugin_name = previous
                .filter(|p| p.analysis == link.analysis)
                .map(|p| p.plugin_name.clone());
            // ITPOs are compared against the master so they can't be mistaken
            // for a change when picking winners.
            let comparison = match previous {
                Some(p) if itpo_plugin_name.is_none() => &p.analysis,
                _ => &master.analysis,
            };
            if let Some(itpo) = &itpo_plugin_name {
                trace!(record = %chain.key(), plugin = %link.plugin_name, itpo = %itpo, "Identical to previous override");
            }

            let analysis = &link.analysis;
            let face_changed = match (&analysis.face_data, &comparison.face_data) {
                (Some(a), Some(b)) => !a.full_eq(b),
                (None, None) => false,
                _ => true,
            };
            overrides.push(NpcOverride {
                plugin_name: link.plugin_name.clone(),
                modifies_behavior: analysis.behavior != comparison.behavior,
                modifies_body: analysis.body != comparison.body,
                modifies_outfits: analysis.outfits != comparison.outfits,
                face_data: if face_changed {
                    analysis.face_data.clone()
                } else {
                    None
                },
                face_overrides_affect_face_gen: false,
                wig: analysis.wig.clone(),
                itpo_plugin_name,
            });
        }

        let master_face_data = master.analysis.face_data.clone();
        compute_face_gen_significance(master_face_data.as_ref(), &mut overrides);

        Self {
            key: chain.key().clone(),
            editor_id: winner.editor_id.clone(),
            name: winner.name.clone(),
            is_female: winner.is_female,
            master: NpcOverride {
                wig: master.analysis.wig.clone(),
                ..NpcOverride::new(master.plugin_name.clone())
            },
            master_face_data,
            overrides,
        }
    }

    /// Label used in logs and warnings: `EditorId 'Name'`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} '{}'", self.editor_id, self.name)
    }

    #[must_use]
    pub fn master_plugin_name(&self) -> &str {
        &self.master.plugin_name
    }

    /// Master first, then every override in load order.
    pub fn links(&self) -> impl Iterator<Item = &NpcOverride> {
        std::iter::once(&self.master).chain(self.overrides.iter())
    }

    /// The link contributed by `plugin_name`, if any.
    #[must_use]
    pub fn link(&self, plugin_name: &str) -> Option<&NpcOverride> {
        self.links()
            .find(|x| eq_ignore_case(&x.plugin_name, plugin_name))
    }
}

impl RecordKeyLike for Npc {
    fn base_plugin_name(&self) -> &str {
        self.key.base_plugin_name()
    }

    fn local_form_id_hex(&self) -> &str {
        self.key.local_form_id_hex()
    }
}
