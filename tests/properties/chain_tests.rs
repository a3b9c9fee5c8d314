//! Override chain and winner resolution invariants.

use npc_merge::npc::{AttributeGroup, Npc, NpcOverride};
use npc_merge::records::{RecordAnalysisChain, RecordKey, RecordKeyLike, Sourced};
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct Analysis(RecordKey);

impl RecordKeyLike for Analysis {
    fn base_plugin_name(&self) -> &str {
        self.0.base_plugin_name()
    }

    fn local_form_id_hex(&self) -> &str {
        self.0.local_form_id_hex()
    }
}

fn plugin_names(len: usize) -> Vec<String> {
    (0..len).map(|i| format!("Plugin{i}.esp")).collect()
}

fn link(index: usize, flags: (bool, bool, bool, bool)) -> NpcOverride {
    let (behavior, body, outfits, itpo) = flags;
    NpcOverride {
        modifies_behavior: behavior,
        modifies_body: body,
        modifies_outfits: outfits,
        itpo_plugin_name: itpo.then(|| format!("Plugin{index}.esp")),
        ..NpcOverride::new(format!("Plugin{}.esp", index + 1))
    }
}

proptest! {
    #[test]
    fn master_is_declaring_plugin_and_winner_is_last(len in 1usize..8, base in 0usize..10) {
        let plugins = plugin_names(len);
        let base_name = format!("Plugin{base}.esp");
        let key = RecordKey::new(base_name.to_uppercase(), "000001");
        let chain = RecordAnalysisChain::new(
            plugins.iter().map(|p| Sourced::new(p.clone(), Analysis(key.clone()))),
        )
        .unwrap();

        let expected_master = if base < len { base } else { 0 };
        prop_assert_eq!(chain.master_index(), expected_master);
        prop_assert_eq!(&chain.winner().plugin_name, &plugins[len - 1]);
        prop_assert_eq!(chain.len(), len);
        for plugin in &plugins {
            prop_assert!(chain.contains(&plugin.to_lowercase()));
        }
    }

    #[test]
    fn winner_is_last_non_itpo_modifier(flags in prop::collection::vec(any::<(bool, bool, bool, bool)>(), 0..8)) {
        let npc = Npc {
            key: RecordKey::new("Plugin0.esp", "000001"),
            editor_id: "Prop".into(),
            name: "Prop".into(),
            is_female: false,
            master: NpcOverride::new("Plugin0.esp"),
            master_face_data: None,
            overrides: flags.iter().enumerate().map(|(i, f)| link(i, *f)).collect(),
        };

        for (group, pick) in [
            (AttributeGroup::Behavior, 0usize),
            (AttributeGroup::Body, 1),
            (AttributeGroup::Outfits, 2),
        ] {
            let expected = flags
                .iter()
                .enumerate()
                .rev()
                .find(|(_, f)| {
                    let modifies = [f.0, f.1, f.2][pick];
                    modifies && !f.3
                })
                .map_or_else(|| "Plugin0.esp".to_string(), |(i, _)| format!("Plugin{}.esp", i + 1));
            prop_assert_eq!(npc.resolve_winner(group), expected.as_str());
        }
    }
}
