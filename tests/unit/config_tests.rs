use npc_merge::build::{BuildSettings, BuildWarningId, WigSafetyPolicy};
use npc_merge::config::Config;
use tempfile::TempDir;

#[test]
fn explicit_config_feeds_build_settings() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("npcm.toml");
    std::fs::write(
        &path,
        r#"
[build]
output_plugin_name = "Faces.esp"
output_dir = "out"
enable_dewiggify = false
wig_safety = "block"

[checks]
disabled = ["WigConversions"]

[checks.suppressions]
"FaceMod.esp" = ["BadArchive"]

[compatibility]
disabled_rules = ["NoChildren"]
"#,
    )
    .unwrap();

    let config = Config::load(Some(&path), temp.path()).unwrap();
    let settings = BuildSettings::from_config(&config);
    assert_eq!(settings.output_plugin_name, "Faces.esp");
    assert_eq!(settings.output_dir, std::path::PathBuf::from("out"));
    assert!(!settings.enable_dewiggify);
    assert_eq!(settings.wig_safety, WigSafetyPolicy::Block);

    assert_eq!(config.checks.disabled, vec!["WigConversions"]);
    assert_eq!(config.compatibility.disabled_rules, vec!["NoChildren"]);
    let suppressions: Vec<_> = config.suppressions().collect();
    assert_eq!(
        suppressions,
        vec![("FaceMod.esp", vec![BuildWarningId::BadArchive])]
    );
}

#[test]
fn invalid_wig_policy_is_a_config_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("bad.toml");
    std::fs::write(&path, "[build]\nwig_safety = \"sometimes\"\n").unwrap();
    assert!(Config::load(Some(&path), temp.path()).is_err());
}
