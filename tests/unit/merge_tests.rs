use npc_merge::npc::{AttributeGroup, Npc, NpcAnalysis, NpcOverride, NpcWigInfo};
use npc_merge::records::{AnalysisProvider, ChainResolver, RecordKey};

use crate::fixture;

fn lydia() -> Npc {
    let file = fixture();
    let chain = ChainResolver::<NpcAnalysis>::new(&file, &file)
        .resolve(&RecordKey::parse("0a2c94:SKYRIM.ESM").unwrap())
        .unwrap()
        .unwrap();
    Npc::from_chain(&chain)
}

#[test]
fn disabled_plugins_are_left_out_of_the_chain() {
    let npc = lydia();
    let plugins: Vec<&str> = npc.links().map(|l| l.plugin_name.as_str()).collect();
    assert_eq!(plugins, vec!["Skyrim.esm", "Update.esm", "FaceMod.esp", "Patch.esp"]);
}

#[test]
fn identical_override_is_marked_itpo() {
    let npc = lydia();
    let patch = npc.link("patch.esp").unwrap();
    assert!(patch.is_itpo());
    assert_eq!(patch.itpo_plugin_name.as_deref(), Some("FaceMod.esp"));
    assert!(!npc.link("FaceMod.esp").unwrap().is_itpo());
}

#[test]
fn winners_skip_itpo_and_fall_back_to_master() {
    let merged = lydia().merge();
    assert_eq!(merged.winner(AttributeGroup::Behavior), "Update.esm");
    assert_eq!(merged.winner(AttributeGroup::Face), "FaceMod.esp");
    assert_eq!(merged.winner(AttributeGroup::Body), "Skyrim.esm");
    assert_eq!(merged.winner(AttributeGroup::Outfits), "Skyrim.esm");
    assert!(merged.face_gen_required);
    assert_eq!(merged.face_data.unwrap().face_parts.nose, 3);
    assert_eq!(merged.editor_id, "HousecarlWhiterun");
}

#[test]
fn record_from_missing_base_uses_first_link_as_master() {
    let file = fixture();
    let key = RecordKey::new("Gone.esp", "0D0001");
    assert!(file.record_keys().contains(&key));
    let chain = ChainResolver::<NpcAnalysis>::new(&file, &file)
        .resolve(&key)
        .unwrap()
        .unwrap();
    assert_eq!(chain.master().plugin_name, "Update.esm");
    let npc = Npc::from_chain(&chain);
    assert_eq!(npc.resolve_winner(AttributeGroup::Face), "Update.esm");
}

fn wig(id: &str, model: &str, is_bald: bool) -> NpcWigInfo {
    NpcWigInfo {
        key: RecordKey::new("Wigs.esp", id),
        model_name: Some(model.to_string()),
        is_bald,
    }
}

#[test]
fn bald_face_with_unmatched_body_wig_warns() {
    let npc = Npc {
        key: RecordKey::new("Skyrim.esm", "000123"),
        editor_id: "Bald".into(),
        name: "Bald".into(),
        is_female: false,
        master: NpcOverride::new("Skyrim.esm"),
        master_face_data: None,
        overrides: vec![
            NpcOverride {
                face_data: Some(Default::default()),
                wig: Some(wig("000001", "hair/long.nif", true)),
                ..NpcOverride::new("Face.esp")
            },
            NpcOverride {
                modifies_body: true,
                modifies_outfits: true,
                wig: Some(wig("000002", "hair/short.nif", false)),
                ..NpcOverride::new("Body.esp")
            },
        ],
    };
    let warnings = npc.assess_wig_safety();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].face_plugin, "Face.esp");
    assert_eq!(warnings[0].target_plugin, "Body.esp");
    assert_eq!(warnings[0].target_group, AttributeGroup::Body);

    let mut compatible = npc.clone();
    compatible.overrides[1].wig = Some(wig("000002", "HAIR/LONG.NIF", false));
    assert!(compatible.assess_wig_safety().is_empty());
}
