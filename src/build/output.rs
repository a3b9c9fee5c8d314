//! Persisting the merged result.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::BuildSettings;
use crate::error::{NpcError, Result};
use crate::npc::MergedNpc;

pub trait OutputWriter: Send + Sync {
    /// Writes `merged` and returns the path of the written artifact.
    fn write(&self, settings: &BuildSettings, merged: &[MergedNpc]) -> Result<PathBuf>;
}

/// On-disk layout of the merge output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeDocument {
    pub plugin_name: String,
    pub generated_at: DateTime<Utc>,
    pub npcs: Vec<MergedNpc>,
}

impl MergeDocument {
    pub fn read(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Writes `<output_dir>/<plugin stem>.json`.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonOutputWriter;

impl JsonOutputWriter {
    /// Path the document for `settings` is written to.
    pub fn output_path(settings: &BuildSettings) -> Result<PathBuf> {
        let stem = Path::new(&settings.output_plugin_name)
            .file_stem()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                NpcError::Argument(format!(
                    "output plugin name '{}' has no file stem",
                    settings.output_plugin_name
                ))
            })?;
        Ok(settings
            .output_dir
            .join(format!("{}.json", stem.to_string_lossy())))
    }
}

impl OutputWriter for JsonOutputWriter {
    fn write(&self, settings: &BuildSettings, merged: &[MergedNpc]) -> Result<PathBuf> {
        let path = Self::output_path(settings)?;
        fs::create_dir_all(&settings.output_dir)?;
        let document = MergeDocument {
            plugin_name: settings.output_plugin_name.clone(),
            generated_at: Utc::now(),
            npcs: merged.to_vec(),
        };
        let json = serde_json::to_string_pretty(&document)?;
        fs::write(&path, json)?;
        info!(path = %path.display(), npcs = merged.len(), "Wrote merge output");
        Ok(path)
    }
}
