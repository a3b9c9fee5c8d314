pub mod app;
pub mod build;
pub mod cli;
pub mod compat;
pub mod config;
pub mod error;
pub mod npc;
pub mod records;
pub mod source;

pub use error::{NpcError, Result};

/// Package version from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
