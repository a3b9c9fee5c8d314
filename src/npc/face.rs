//! Face data value types and their two equality relations.
//!
//! Full equality compares every field. FaceGen equality only compares fields
//! that are baked into the generated face mesh; skin tone, hair colour and the
//! face texture set can change without regenerating it.

use serde::{Deserialize, Serialize};

use crate::records::RecordKey;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpcSkinTone {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

/// The 18 face morph sliders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NpcFaceMorphs {
    pub nose_long_short: f32,
    pub nose_up_down: f32,
    pub jaw_up_down: f32,
    pub jaw_narrow_wide: f32,
    pub jaw_forward_back: f32,
    pub cheeks_up_down: f32,
    pub cheeks_forward_back: f32,
    pub eyes_up_down: f32,
    pub eyes_in_out: f32,
    pub brows_up_down: f32,
    pub brows_in_out: f32,
    pub brows_forward_back: f32,
    pub lips_up_down: f32,
    pub lips_in_out: f32,
    pub chin_thin_wide: f32,
    pub chin_up_down: f32,
    pub chin_underbite_overbite: f32,
    pub eyes_forward_back: f32,
}

/// Nose, eyes and mouth style indices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpcFaceParts {
    pub nose: u32,
    pub eyes: u32,
    pub mouth: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpcFaceTintColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NpcFaceTint {
    pub layer: u32,
    pub color: NpcFaceTintColor,
    pub value: f32,
}

/// Appearance-related data of one NPC record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NpcFaceData {
    pub head_part_ids: Vec<RecordKey>,
    pub hair_color_id: Option<RecordKey>,
    pub face_texture_set_id: Option<RecordKey>,
    pub skin_tone: NpcSkinTone,
    pub face_morphs: NpcFaceMorphs,
    pub face_parts: NpcFaceParts,
    pub face_tints: Vec<NpcFaceTint>,
}

impl NpcFaceData {
    /// Every field equal.
    #[must_use]
    pub fn full_eq(&self, other: &Self) -> bool {
        self.face_gen_eq(other)
            && self.skin_tone == other.skin_tone
            && self.hair_color_id == other.hair_color_id
            && self.face_texture_set_id == other.face_texture_set_id
    }

    /// Equal in every field that affects the generated face mesh.
    #[must_use]
    pub fn face_gen_eq(&self, other: &Self) -> bool {
        self.head_part_ids == other.head_part_ids
            && self.face_morphs == other.face_morphs
            && self.face_parts == other.face_parts
            && self.face_tints == other.face_tints
    }
}
