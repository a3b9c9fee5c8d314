use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use super::{BuildCheck, Warnings};
use crate::build::warnings::{BuildWarning, BuildWarningId, messages};
use crate::build::{BuildSettings, Profile};
use crate::npc::{AttributeGroup, Npc};
use crate::records::LoadOrder;

/// Read-only view of the game's archives.
pub trait ArchiveProvider: Send + Sync {
    /// Paths of archives known to be unreadable, in a stable order.
    fn bad_archive_paths(&self) -> Vec<String>;

    /// Base names (no extension) of the archives that may hold face assets
    /// for `npc` when its face comes from `face_plugin`.
    fn face_archives(&self, _npc: &Npc, face_plugin: &str) -> Vec<String> {
        let base = file_stem(face_plugin);
        vec![format!("{base} - Textures"), base]
    }
}

fn file_stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map_or_else(|| path.to_string(), |s| s.to_string_lossy().into_owned())
}

fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map_or_else(|| path.to_string(), |s| s.to_string_lossy().into_owned())
}

/// Warns about bad archives that an enabled face plugin actually relies on.
pub struct BadArchives {
    archives: Arc<dyn ArchiveProvider>,
    load_order: Arc<dyn LoadOrder>,
}

impl BadArchives {
    pub fn new(archives: Arc<dyn ArchiveProvider>, load_order: Arc<dyn LoadOrder>) -> Self {
        Self {
            archives,
            load_order,
        }
    }

    /// Case-folded base names of the archives enabled face plugins rely on.
    fn referenced(&self, profile: &Profile) -> HashSet<String> {
        let mut referenced = HashSet::new();
        for npc in &profile.npcs {
            let face_plugin = npc.resolve_winner(AttributeGroup::Face);
            if !self.load_order.is_enabled(face_plugin) {
                continue;
            }
            referenced.extend(
                self.archives
                    .face_archives(npc, face_plugin)
                    .iter()
                    .map(|archive| archive.to_lowercase()),
            );
        }
        referenced
    }
}

impl BuildCheck for BadArchives {
    fn name(&self) -> &str {
        "BadArchives"
    }

    fn run<'a>(&'a self, profile: &'a Profile, _settings: &'a BuildSettings) -> Warnings<'a> {
        let bad = self.archives.bad_archive_paths();
        if bad.is_empty() {
            return Box::new(std::iter::empty());
        }
        let referenced = self.referenced(profile);
        let mut emitted: Vec<String> = Vec::new();
        // No plugin is attached: the report keeps these in the supplied order.
        Box::new(bad.into_iter().filter_map(move |path| {
            let stem = file_stem(&path).to_lowercase();
            if !referenced.contains(&stem) || emitted.contains(&stem) {
                return None;
            }
            emitted.push(stem);
            Some(BuildWarning::new(
                BuildWarningId::BadArchive,
                messages::bad_archive(&file_name(&path)),
            ))
        }))
    }
}
