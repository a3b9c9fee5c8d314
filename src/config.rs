use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::build::{BuildWarningId, WigSafetyPolicy};
use crate::error::{NpcError, Result};

/// Project-local config file name, looked up in the working directory.
pub const PROJECT_CONFIG_FILE: &str = "npcm.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub checks: ChecksConfig,
    #[serde(default)]
    pub compatibility: CompatibilityConfig,
}

impl Config {
    /// Loads the explicit file (or `NPCM_CONFIG`) if given, otherwise the
    /// global file followed by the project file, then applies environment
    /// overrides.
    pub fn load(explicit_path: Option<&Path>, project_root: &Path) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| env_string("NPCM_CONFIG").map(PathBuf::from));

        if let Some(path) = explicit {
            let patch = Self::load_patch(&path)?.ok_or_else(|| {
                NpcError::MissingConfig(format!("config file {} not found", path.display()))
            })?;
            config.merge_patch(patch);
        } else {
            if let Some(global) = Self::load_global()? {
                config.merge_patch(global);
            }
            if let Some(project) = Self::load_project(project_root)? {
                config.merge_patch(project);
            }
        }

        config.apply_env_overrides()?;

        Ok(config)
    }

    /// Path of the global config file, if the platform has a config dir.
    pub fn global_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("npcm").join("config.toml"))
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        let Some(path) = Self::global_path() else {
            debug!("No platform config directory; skipping global config");
            return Ok(None);
        };
        Self::load_patch(&path)
    }

    fn load_project(project_root: &Path) -> Result<Option<ConfigPatch>> {
        Self::load_patch(&project_root.join(PROJECT_CONFIG_FILE))
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| NpcError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| NpcError::Config(format!("parse config {}: {err}", path.display())))?;
        debug!(path = %path.display(), "Loaded config file");
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.build {
            self.build.merge(patch);
        }
        if let Some(patch) = patch.checks {
            self.checks.merge(patch);
        }
        if let Some(patch) = patch.compatibility {
            self.compatibility.merge(patch);
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(value) = env_bool("NPCM_DEWIGGIFY") {
            self.build.enable_dewiggify = value;
        }
        if let Some(value) = env_string("NPCM_WIG_SAFETY") {
            self.build.wig_safety = value.parse()?;
        }
        if let Some(value) = env_string("NPCM_OUTPUT_PLUGIN") {
            if value.trim().is_empty() {
                return Err(NpcError::Config(
                    "NPCM_OUTPUT_PLUGIN must not be empty".to_string(),
                ));
            }
            self.build.output_plugin_name = value;
        }
        Ok(())
    }

    /// Suppressions keyed by plugin name, as the build checker expects them.
    pub fn suppressions(&self) -> impl Iterator<Item = (&str, Vec<BuildWarningId>)> {
        self.checks
            .suppressions
            .iter()
            .map(|(plugin, ids)| (plugin.as_str(), ids.clone()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfig {
    pub output_plugin_name: String,
    pub output_dir: PathBuf,
    pub enable_dewiggify: bool,
    pub wig_safety: WigSafetyPolicy,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output_plugin_name: "NPC Appearances Merged.esp".to_string(),
            output_dir: PathBuf::from("npcm-output"),
            enable_dewiggify: true,
            wig_safety: WigSafetyPolicy::Warn,
        }
    }
}

impl BuildConfig {
    fn merge(&mut self, patch: BuildPatch) {
        if let Some(value) = patch.output_plugin_name {
            self.output_plugin_name = value;
        }
        if let Some(value) = patch.output_dir {
            self.output_dir = value;
        }
        if let Some(value) = patch.enable_dewiggify {
            self.enable_dewiggify = value;
        }
        if let Some(value) = patch.wig_safety {
            self.wig_safety = value;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecksConfig {
    /// Check names to skip.
    #[serde(default)]
    pub disabled: Vec<String>,
    /// Plugin name to warning ids ignored for that plugin.
    #[serde(default)]
    pub suppressions: BTreeMap<String, Vec<BuildWarningId>>,
}

impl ChecksConfig {
    fn merge(&mut self, patch: ChecksPatch) {
        if let Some(values) = patch.disabled {
            self.disabled = merge_unique(values, &self.disabled);
        }
        if let Some(suppressions) = patch.suppressions {
            for (plugin, ids) in suppressions {
                let entry = self.suppressions.entry(plugin).or_default();
                for id in ids {
                    if !entry.contains(&id) {
                        entry.push(id);
                    }
                }
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityConfig {
    #[serde(default)]
    pub disabled_rules: Vec<String>,
}

impl CompatibilityConfig {
    fn merge(&mut self, patch: CompatibilityPatch) {
        if let Some(values) = patch.disabled_rules {
            self.disabled_rules = merge_unique(values, &self.disabled_rules);
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigPatch {
    pub build: Option<BuildPatch>,
    pub checks: Option<ChecksPatch>,
    pub compatibility: Option<CompatibilityPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct BuildPatch {
    pub output_plugin_name: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub enable_dewiggify: Option<bool>,
    pub wig_safety: Option<WigSafetyPolicy>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ChecksPatch {
    pub disabled: Option<Vec<String>>,
    pub suppressions: Option<BTreeMap<String, Vec<BuildWarningId>>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CompatibilityPatch {
    pub disabled_rules: Option<Vec<String>>,
}

fn merge_unique(values: Vec<String>, existing: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in existing.iter().cloned().chain(values) {
        if !out.iter().any(|v| v.eq_ignore_ascii_case(&value)) {
            out.push(value);
        }
    }
    out
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key).ok().map(|value| {
        matches!(
            value.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}
