use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use npc_merge::compat::{CompatibilityRule, CompatibilityRuleSet, npc_rule_set};
use npc_merge::npc::NpcAnalysis;
use npc_merge::{NpcError, Result};

fn analysis(json: serde_json::Value) -> NpcAnalysis {
    serde_json::from_value(json).unwrap()
}

struct Counting {
    name: &'static str,
    result: fn() -> Result<bool>,
    calls: Arc<AtomicUsize>,
}

impl CompatibilityRule<NpcAnalysis> for Counting {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "counts calls"
    }

    fn is_supported(&self, _record: &NpcAnalysis) -> Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.result)()
    }
}

#[test]
fn standard_rules_reject_children_and_non_facegen() {
    let rules = npc_rule_set(&[]);
    let adult = analysis(serde_json::json!({ "key": "000001:Skyrim.esm" }));
    let child = analysis(serde_json::json!({ "key": "000002:Skyrim.esm", "is_child": true }));
    let no_face_gen =
        analysis(serde_json::json!({ "key": "000003:Skyrim.esm", "can_use_face_gen": false }));
    assert!(rules.is_supported(&adult));
    assert!(!rules.is_supported(&child));
    assert!(!rules.is_supported(&no_face_gen));
}

#[test]
fn disabling_a_rule_lets_records_through() {
    let rules = npc_rule_set(&["nochildren".to_string()]);
    let child = analysis(serde_json::json!({ "key": "000002:Skyrim.esm", "is_child": true }));
    assert!(rules.is_supported(&child));
    assert_eq!(rules.rule_names().collect::<Vec<_>>(), vec!["FaceGenHead"]);
}

#[test]
fn rule_error_counts_as_unsupported_and_stops_the_chain() {
    let calls: Vec<Arc<AtomicUsize>> = (0..3).map(|_| Arc::new(AtomicUsize::new(0))).collect();
    let rules = CompatibilityRuleSet::new(|npc: &NpcAnalysis| Ok(npc.editor_id.clone()))
        .add(Counting {
            name: "Pass",
            result: || Ok(true),
            calls: Arc::clone(&calls[0]),
        })
        .add(Counting {
            name: "Broken",
            result: || Err(NpcError::Argument("boom".into())),
            calls: Arc::clone(&calls[1]),
        })
        .add(Counting {
            name: "Never",
            result: || Ok(false),
            calls: Arc::clone(&calls[2]),
        });

    let record = analysis(serde_json::json!({ "key": "000001:Skyrim.esm" }));
    assert!(!rules.is_supported(&record));
    let counts: Vec<usize> = calls.iter().map(|c| c.load(Ordering::SeqCst)).collect();
    assert_eq!(counts, vec![1, 1, 0]);
}

#[test]
fn failing_name_selector_does_not_change_the_verdict() {
    let rules = CompatibilityRuleSet::new(|_: &NpcAnalysis| -> Result<String> {
        Err(NpcError::Argument("no name".into()))
    })
    .add(Counting {
        name: "Reject",
        result: || Ok(false),
        calls: Arc::new(AtomicUsize::new(0)),
    });
    let record = analysis(serde_json::json!({ "key": "000001:Skyrim.esm" }));
    assert!(!rules.is_supported(&record));
}

#[test]
fn report_lists_rules_in_order() {
    let report = npc_rule_set(&[]).report_configuration();
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(lines[0], "Compatibility rules:");
    assert!(lines[1].starts_with("  - NoChildren: "));
    assert!(lines[2].starts_with("  - FaceGenHead: "));
}
