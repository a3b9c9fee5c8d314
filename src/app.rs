//! Application context shared by every command.

use std::path::PathBuf;

use crate::cli::Cli;
use crate::config::Config;
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: Config,
    /// Explicit config path from `--config`, if any.
    pub config_path: Option<PathBuf>,
    pub robot_mode: bool,
    pub verbosity: u8,
    pub quiet: bool,
}

impl AppContext {
    /// Loads configuration using the current directory as project root.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let project_root = std::env::current_dir()?;
        let config = Config::load(cli.config.as_deref(), &project_root)?;
        Ok(Self {
            config,
            config_path: cli.config.clone(),
            robot_mode: cli.robot,
            verbosity: cli.verbose,
            quiet: cli.quiet,
        })
    }

    #[must_use]
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            config_path: None,
            robot_mode: false,
            verbosity: 0,
            quiet: false,
        }
    }
}
