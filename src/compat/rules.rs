//! Standard rules over NPC analyses.

use tracing::{Level, debug};

use super::{CompatibilityRule, CompatibilityRuleSet};
use crate::error::Result;
use crate::npc::NpcAnalysis;
use crate::records::eq_ignore_case;

/// Children use a separate head pipeline and are never merged.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoChildrenRule;

impl CompatibilityRule<NpcAnalysis> for NoChildrenRule {
    fn name(&self) -> &str {
        "NoChildren"
    }

    fn description(&self) -> &str {
        "Child NPCs are excluded"
    }

    fn log_level(&self) -> Level {
        Level::WARN
    }

    fn is_supported(&self, record: &NpcAnalysis) -> Result<bool> {
        Ok(!record.is_child)
    }
}

/// The NPC's race must use FaceGen heads.
#[derive(Debug, Default, Clone, Copy)]
pub struct FaceGenHeadRule;

impl CompatibilityRule<NpcAnalysis> for FaceGenHeadRule {
    fn name(&self) -> &str {
        "FaceGenHead"
    }

    fn description(&self) -> &str {
        "NPC race must support FaceGen heads"
    }

    fn log_level(&self) -> Level {
        Level::DEBUG
    }

    fn is_supported(&self, record: &NpcAnalysis) -> Result<bool> {
        Ok(record.can_use_face_gen)
    }
}

/// Standard rules minus those named in `disabled` (case-insensitive).
pub fn standard_rules(disabled: &[String]) -> Vec<Box<dyn CompatibilityRule<NpcAnalysis>>> {
    let all: Vec<Box<dyn CompatibilityRule<NpcAnalysis>>> =
        vec![Box::new(NoChildrenRule), Box::new(FaceGenHeadRule)];
    all.into_iter()
        .filter(|rule| {
            let off = disabled.iter().any(|d| eq_ignore_case(d, rule.name()));
            if off {
                debug!(rule = %rule.name(), "Compatibility rule disabled by configuration");
            }
            !off
        })
        .collect()
}

/// Rule set for NPCs, labelled `EditorId 'Name'` in logs.
pub fn npc_rule_set(disabled: &[String]) -> CompatibilityRuleSet<NpcAnalysis> {
    CompatibilityRuleSet::new(|npc: &NpcAnalysis| Ok(format!("{} '{}'", npc.editor_id, npc.name)))
        .add_range(standard_rules(disabled))
}
