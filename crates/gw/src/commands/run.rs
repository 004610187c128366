//! `gw run` command implementation.

use std::path::{Path, PathBuf};

use clap::Args;
use gw_config::{CliSettings, Config};
use gw_notify::RunMode;

use crate::cycle::check_once;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the run command.
#[derive(Args)]
pub(crate) struct RunArgs {
    /// Directory holding the baselines (overrides config).
    #[arg(long)]
    state_dir: Option<PathBuf>,

    /// Send the full current results and attendance even without changes.
    #[arg(long)]
    force_snapshot: bool,
}

impl RunArgs {
    /// Execute the run command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or any step of the check
    /// fails.
    pub(crate) fn execute(self, config_path: Option<&Path>) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            state_dir: self.state_dir,
            interval_minutes: None,
        };
        let config = Config::load(config_path, Some(&cli_settings))?;

        let mode = if self.force_snapshot {
            RunMode::ForceSnapshot
        } else {
            RunMode::Normal
        };

        let outcome = check_once(&config, mode)?;
        output.outcome(&outcome);
        Ok(())
    }
}
