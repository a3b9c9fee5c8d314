//! Unit test suite entry point.

mod checks_tests;
mod compat_tests;
mod config_tests;
mod merge_tests;
mod pipeline_tests;

use std::path::PathBuf;

use npc_merge::source::LoadOrderFile;

pub fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/load_order.json")
}

pub fn fixture() -> LoadOrderFile {
    LoadOrderFile::load(&fixture_path()).unwrap()
}
