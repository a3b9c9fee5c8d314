//! npcm inspect - Override chain and per-group winners for one NPC

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use itertools::Itertools;
use serde::Serialize;

use super::load_source;
use crate::app::AppContext;
use crate::cli::output::{emit_json, robot_ok};
use crate::compat::npc_rule_set;
use crate::error::{NpcError, Result};
use crate::npc::{AttributeGroup, MergedNpc, Npc, NpcAnalysis, NpcOverride};
use crate::records::{ChainResolver, RecordKey};

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Load-order file describing plugins, bad archives and NPC analyses
    pub load_order: PathBuf,

    /// Record key as `<formid>:<plugin>`, e.g. 013BBD:Skyrim.esm
    pub key: String,
}

#[derive(Serialize)]
struct Inspection<'a> {
    supported: bool,
    chain: Vec<&'a NpcOverride>,
    merged: &'a MergedNpc,
}

pub fn run(ctx: &AppContext, args: &InspectArgs) -> Result<()> {
    let key = RecordKey::parse(&args.key)?;
    let source = load_source(&args.load_order)?;
    let chain = ChainResolver::<NpcAnalysis>::new(&*source, &*source)
        .resolve(&key)?
        .ok_or_else(|| NpcError::NotFound(key.to_string()))?;
    let supported = npc_rule_set(&ctx.config.compatibility.disabled_rules)
        .is_supported(&chain.winner().analysis);
    let npc = Npc::from_chain(&chain);
    let merged = npc.merge();

    if ctx.robot_mode {
        return emit_json(&robot_ok(Inspection {
            supported,
            chain: npc.links().collect(),
            merged: &merged,
        }));
    }

    println!("{} ({})", npc.label().bold(), npc.key);
    if !supported {
        println!("{} excluded by compatibility rules", "!".yellow());
    }
    println!();
    println!("{}", "Override chain".bold());
    for link in npc.links() {
        println!("  {}", describe_link(link));
    }
    println!();
    println!("{}", "Winners".bold());
    for group in AttributeGroup::ALL {
        println!("  {group:<8} {}", merged.winner(group).cyan());
    }
    if merged.face_gen_required {
        println!("  FaceGen mesh required");
    }
    for warning in &merged.wig_warnings {
        println!(
            "{} wig '{}' from {} is not compatible with {} ({})",
            "!".yellow(),
            warning.wig_model_name.as_deref().unwrap_or("?"),
            warning.face_plugin,
            warning.target_plugin,
            warning.target_group
        );
    }
    Ok(())
}

fn describe_link(link: &NpcOverride) -> String {
    if let Some(itpo) = link.itpo_plugin_name.as_deref().filter(|_| link.is_itpo()) {
        return format!("{} {}", link.plugin_name, format!("(identical to {itpo})").dimmed());
    }
    let groups = AttributeGroup::ALL
        .into_iter()
        .filter(|g| link.modifies(*g))
        .join(", ");
    if groups.is_empty() {
        link.plugin_name.clone()
    } else {
        format!("{} [{groups}]", link.plugin_name)
    }
}
