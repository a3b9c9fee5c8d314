//! Build warnings and their message texts.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::records::RecordKey;

/// Stable warning identifiers, used for suppression and ordering.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum BuildWarningId {
    MasterPluginRemoved,
    SelectedPluginRemoved,
    BadArchive,
    WigNotMatchedBald,
    WigConversionDisabled,
}

impl fmt::Display for BuildWarningId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A non-fatal problem found before or during a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildWarning {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<BuildWarningId>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_key: Option<RecordKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin_name: Option<String>,
}

impl BuildWarning {
    pub fn new(id: BuildWarningId, message: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            message: message.into(),
            record_key: None,
            plugin_name: None,
        }
    }

    #[must_use]
    pub fn with_record(mut self, key: RecordKey) -> Self {
        self.record_key = Some(key);
        self
    }

    #[must_use]
    pub fn with_plugin(mut self, plugin_name: impl Into<String>) -> Self {
        self.plugin_name = Some(plugin_name.into());
        self
    }
}

impl fmt::Display for BuildWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "[{id}] {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

pub mod messages {
    fn npc_label(editor_id: &str, name: &str) -> String {
        format!("{editor_id} '{name}'")
    }

    #[must_use]
    pub fn bad_archive(archive_name: &str) -> String {
        format!(
            "Archive {archive_name} is known to be corrupt or unreadable. \
             Face assets it contains cannot be used in the merge."
        )
    }

    #[must_use]
    pub fn master_plugin_removed(plugin_name: &str) -> String {
        format!("NPC master plugin {plugin_name} is no longer installed.")
    }

    #[must_use]
    pub fn selected_plugin_removed(
        editor_id: &str,
        name: &str,
        field_name: &str,
        plugin_name: &str,
    ) -> String {
        format!(
            "{} references missing or disabled {plugin_name} for its {field_name} plugin selection.",
            npc_label(editor_id, name)
        )
    }

    #[must_use]
    pub fn wig_not_matched_bald(
        editor_id: &str,
        name: &str,
        plugin_name: &str,
        model_name: &str,
        target_plugin: &str,
    ) -> String {
        format!(
            "{} in face plugin {plugin_name} has no hair and uses a wig with model name '{model_name}', \
             which {target_plugin} does not carry. This NPC will be bald.",
            npc_label(editor_id, name)
        )
    }

    #[must_use]
    pub fn wig_conversion_disabled(
        editor_id: &str,
        name: &str,
        plugin_name: &str,
        is_bald: bool,
    ) -> String {
        let outcome = if is_bald {
            "be bald"
        } else {
            "revert to their default hair"
        };
        format!(
            "{} in face plugin {plugin_name} uses a wig, and you have de-wiggification disabled. \
             This character will {outcome}.",
            npc_label(editor_id, name)
        )
    }
}
