//! File-backed analysis source.
//!
//! A load-order file is a JSON document describing the plugins in load
//! order, archives known to be bad, and every plugin's analysis of every NPC
//! record it touches:
//!
//! ```json
//! {
//!   "plugins": [{ "name": "Skyrim.esm" }, { "name": "Mod.esp", "masters": ["Skyrim.esm"] }],
//!   "bad_archives": ["Data/Broken.bsa"],
//!   "records": [{ "plugin_name": "Skyrim.esm", "analysis": { "key": "013BBD:Skyrim.esm" } }]
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::build::ArchiveProvider;
use crate::error::{NpcError, Result};
use crate::npc::NpcAnalysis;
use crate::records::{AnalysisProvider, LoadOrder, RecordKey, Sourced, eq_ignore_case};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginEntry {
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub masters: Vec<String>,
}

const fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadOrderFile {
    #[serde(default)]
    pub plugins: Vec<PluginEntry>,
    #[serde(default)]
    pub bad_archives: Vec<String>,
    #[serde(default)]
    pub records: Vec<Sourced<NpcAnalysis>>,
    /// Record key to indices into `records`, sorted by load order.
    #[serde(skip)]
    index: OnceLock<HashMap<RecordKey, Vec<usize>>>,
    #[serde(skip)]
    keys: OnceLock<Vec<RecordKey>>,
}

impl LoadOrderFile {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(NpcError::Argument(format!(
                "load order file {} does not exist",
                path.display()
            )));
        }
        let raw = std::fs::read_to_string(path)?;
        let file = Self::from_json(&raw)?;
        debug!(
            path = %path.display(),
            plugins = file.plugins.len(),
            records = file.records.len(),
            "Loaded load order file"
        );
        Ok(file)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let file: Self = serde_json::from_str(raw)?;
        file.validate()?;
        Ok(file)
    }

    fn validate(&self) -> Result<()> {
        for (i, plugin) in self.plugins.iter().enumerate() {
            if plugin.name.trim().is_empty() {
                return Err(NpcError::Argument(format!("plugin #{i} has an empty name")));
            }
            if self.plugins[..i]
                .iter()
                .any(|p| eq_ignore_case(&p.name, &plugin.name))
            {
                return Err(NpcError::Argument(format!(
                    "plugin {} is listed more than once",
                    plugin.name
                )));
            }
        }
        Ok(())
    }

    fn plugin(&self, name: &str) -> Option<&PluginEntry> {
        self.plugins.iter().find(|p| eq_ignore_case(&p.name, name))
    }

    fn load_index(&self, name: &str) -> usize {
        self.plugins
            .iter()
            .position(|p| eq_ignore_case(&p.name, name))
            .unwrap_or(usize::MAX)
    }

    fn index(&self) -> &HashMap<RecordKey, Vec<usize>> {
        self.index.get_or_init(|| {
            let mut index: HashMap<RecordKey, Vec<usize>> = HashMap::new();
            for (i, record) in self.records.iter().enumerate() {
                if self.plugin(&record.plugin_name).is_none() {
                    warn!(
                        plugin = %record.plugin_name,
                        record = %record.analysis.key,
                        "Record from plugin missing from the load order"
                    );
                }
                index.entry(record.analysis.key.clone()).or_default().push(i);
            }
            for indices in index.values_mut() {
                indices.sort_by_key(|&i| self.load_index(&self.records[i].plugin_name));
            }
            index
        })
    }
}

impl AnalysisProvider<NpcAnalysis> for LoadOrderFile {
    fn record_keys(&self) -> Vec<RecordKey> {
        self.keys
            .get_or_init(|| {
                let mut keys: Vec<RecordKey> = Vec::new();
                let mut seen = std::collections::HashSet::new();
                for record in &self.records {
                    if seen.insert(record.analysis.key.clone()) {
                        keys.push(record.analysis.key.clone());
                    }
                }
                keys
            })
            .clone()
    }

    fn analyses(&self, key: &RecordKey) -> Vec<Sourced<NpcAnalysis>> {
        self.index()
            .get(key)
            .map(|indices| indices.iter().map(|&i| self.records[i].clone()).collect())
            .unwrap_or_default()
    }
}

impl LoadOrder for LoadOrderFile {
    fn plugins(&self) -> Vec<String> {
        self.plugins.iter().map(|p| p.name.clone()).collect()
    }

    fn is_enabled(&self, plugin_name: &str) -> bool {
        self.plugin(plugin_name).is_some_and(|p| p.enabled)
    }

    fn masters(&self, plugin_name: &str) -> Vec<String> {
        self.plugin(plugin_name)
            .map(|p| p.masters.clone())
            .unwrap_or_default()
    }
}

impl ArchiveProvider for LoadOrderFile {
    fn bad_archive_paths(&self) -> Vec<String> {
        self.bad_archives.clone()
    }
}
