use std::sync::Arc;

use npc_merge::build::stages::{BuildServices, BuildState, standard_pipeline};
use npc_merge::build::{
    ArchiveProvider, BuildChecker, BuildSettings, BuildWarningId, JsonOutputWriter, Profile,
};
use npc_merge::compat::npc_rule_set;
use npc_merge::npc::{Npc, NpcAnalysis};
use npc_merge::records::{AnalysisProvider, ChainResolver, LoadOrder};
use npc_merge::source::LoadOrderFile;
use tempfile::TempDir;

use crate::fixture;

fn profile(file: &LoadOrderFile) -> Profile {
    let rules = npc_rule_set(&[]);
    let chains = ChainResolver::<NpcAnalysis>::new(file, file)
        .resolve_all()
        .unwrap();
    Profile::new(
        chains
            .iter()
            .filter(|c| rules.is_supported(&c.winner().analysis))
            .map(Npc::from_chain)
            .collect(),
    )
}

fn checker(file: Arc<LoadOrderFile>) -> BuildChecker {
    let load_order: Arc<dyn LoadOrder> = file.clone();
    let archives: Arc<dyn ArchiveProvider> = file;
    BuildChecker::standard(load_order, archives, &[])
}

#[test]
fn fixture_report_orders_warnings_by_id() {
    let file = Arc::new(fixture());
    let report = checker(Arc::clone(&file)).check_all(&profile(&file), &BuildSettings::default());

    let ids: Vec<_> = report.warnings.iter().map(|w| w.id).collect();
    assert_eq!(
        ids,
        vec![
            Some(BuildWarningId::MasterPluginRemoved),
            Some(BuildWarningId::BadArchive)
        ]
    );
    assert_eq!(report.warnings[0].plugin_name.as_deref(), Some("Gone.esp"));
    assert_eq!(report.warnings[1].plugin_name, None);
    assert!(report.warnings[1].message.contains("FaceMod - Textures.bsa"));

    let masters: Vec<&str> = report.masters.iter().map(|m| m.plugin_name.as_str()).collect();
    assert_eq!(masters, vec!["Skyrim.esm", "Update.esm"]);
}

#[test]
fn suppressions_are_per_plugin() {
    let file = Arc::new(fixture());
    let report = checker(Arc::clone(&file))
        .with_suppressions([("gone.ESP", vec![BuildWarningId::MasterPluginRemoved])])
        .check_all(&profile(&file), &BuildSettings::default());
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].id, Some(BuildWarningId::BadArchive));
}

#[test]
fn bad_archive_warnings_cannot_be_suppressed_by_plugin() {
    let file = Arc::new(fixture());
    let report = checker(Arc::clone(&file))
        .with_suppressions([("FaceMod.esp", vec![BuildWarningId::BadArchive])])
        .check_all(&profile(&file), &BuildSettings::default());
    assert_eq!(report.warnings.len(), 2);
}

#[test]
fn disabled_checks_are_skipped() {
    let file = Arc::new(fixture());
    let load_order: Arc<dyn LoadOrder> = file.clone();
    let archives: Arc<dyn ArchiveProvider> = file.clone();
    let checker = BuildChecker::standard(load_order, archives, &["badarchives".to_string()]);
    assert!(!checker.check_names().any(|n| n == "BadArchives"));
    let report = checker.check_all(&profile(&file), &BuildSettings::default());
    assert!(
        report
            .warnings
            .iter()
            .all(|w| w.id != Some(BuildWarningId::BadArchive))
    );
}

#[test]
fn standard_pipeline_writes_output_and_summary() {
    let temp = TempDir::new().unwrap();
    let file = Arc::new(fixture());
    let provider: Arc<dyn AnalysisProvider<NpcAnalysis>> = file.clone();
    let load_order: Arc<dyn LoadOrder> = file.clone();
    let services = BuildServices {
        provider,
        load_order,
        rules: Arc::new(npc_rule_set(&[])),
        checker: Arc::new(checker(Arc::clone(&file))),
        writer: Arc::new(JsonOutputWriter),
    };
    let settings = BuildSettings {
        output_dir: temp.path().to_path_buf(),
        ..BuildSettings::default()
    };

    let state = standard_pipeline(services)
        .run(BuildState::new(settings))
        .into_result()
        .unwrap();

    let summary = state.summary.unwrap();
    assert_eq!(summary.npc_count, 2);
    assert_eq!(summary.excluded_count, 1);
    assert_eq!(summary.face_gen_count, 1);
    assert_eq!(summary.warning_count, 2);
    let path = summary.output_path.unwrap();
    assert!(path.exists());
    assert_eq!(path, temp.path().join("NPC Appearances Merged.json"));
}
