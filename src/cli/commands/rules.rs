//! npcm rules - Show the active compatibility rules

use clap::Args;
use serde_json::json;

use crate::app::AppContext;
use crate::cli::output::{emit_json, robot_ok};
use crate::compat::npc_rule_set;
use crate::error::Result;

#[derive(Args, Debug)]
pub struct RulesArgs {}

pub fn run(ctx: &AppContext, _args: &RulesArgs) -> Result<()> {
    let rules = npc_rule_set(&ctx.config.compatibility.disabled_rules);
    let report = rules.report_configuration();
    if ctx.robot_mode {
        let names: Vec<&str> = rules.rule_names().collect();
        return emit_json(&robot_ok(json!({
            "rules": names,
            "disabled": ctx.config.compatibility.disabled_rules,
            "report": report,
        })));
    }
    println!("{report}");
    Ok(())
}
