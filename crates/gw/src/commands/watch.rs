//! `gw watch` command implementation.

use std::path::{Path, PathBuf};
use std::thread;

use clap::Args;
use gw_config::{CliSettings, Config};
use gw_notify::RunMode;
use tracing::info;

use crate::cycle::check_once;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the watch command.
#[derive(Args)]
pub(crate) struct WatchArgs {
    /// Directory holding the baselines (overrides config).
    #[arg(long)]
    state_dir: Option<PathBuf>,

    /// Minutes between checks (overrides config).
    #[arg(short, long)]
    interval: Option<u64>,
}

impl WatchArgs {
    /// Execute the watch command.
    ///
    /// Only a configuration error ends the loop. A failed check is reported
    /// and retried at the next tick; Ctrl-C stops the process.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails.
    pub(crate) fn execute(self, config_path: Option<&Path>) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            state_dir: self.state_dir,
            interval_minutes: self.interval,
        };
        let config = Config::load(config_path, Some(&cli_settings))?;
        let interval = config.schedule.interval();

        output.info(&format!(
            "Watching {} every {} minute(s), press Ctrl-C to stop",
            config.portal.base_url, config.schedule.interval_minutes
        ));

        loop {
            match check_once(&config, RunMode::Normal) {
                Ok(outcome) => output.outcome(&outcome),
                Err(err) => output.failure(&err),
            }
            info!(next_in_secs = interval.as_secs(), "Waiting for next check");
            thread::sleep(interval);
        }
    }
}
