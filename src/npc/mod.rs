//! NPC merge model
//!
//! Value types for one NPC's overrides and the rules that decide, per
//! attribute group, which plugin's edit wins.

pub mod face;
pub mod merge;
pub mod model;

pub use face::{NpcFaceData, NpcFaceMorphs, NpcFaceParts, NpcFaceTint, NpcFaceTintColor, NpcSkinTone};
pub use merge::{MergedNpc, WigSafetyWarning, compute_face_gen_significance};
pub use model::{AttributeGroup, Npc, NpcAnalysis, NpcOverride, NpcWigInfo};
