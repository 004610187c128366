//! CLI error types.

use gw_baseline::StateError;
use gw_config::ConfigError;
use gw_notify::NotifyError;
use gw_portal::PortalError;
use gw_snapshot::SnapshotError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Portal(#[from] PortalError),

    #[error("{0}")]
    Snapshot(#[from] SnapshotError),

    #[error("{0}")]
    State(#[from] StateError),

    #[error("{0}")]
    Notify(#[from] NotifyError),
}

impl CliError {
    /// What the user should look at first.
    pub(crate) fn hint(&self) -> &'static str {
        match self {
            Self::Config(_) => "check gradewatch.toml and the environment variables it references",
            Self::Portal(PortalError::Authentication(_)) => {
                "the portal rejected the login: check credentials.identifier and credentials.secret"
            }
            Self::Portal(PortalError::Network(e)) if e.is_timeout() => {
                "the portal did not answer in time: retry later or raise portal.read_timeout_secs"
            }
            Self::Portal(PortalError::Network(_)) => {
                "could not reach the portal: check the network and portal.base_url"
            }
            Self::Portal(PortalError::HttpStatus { .. }) => {
                "the portal returned an error page: it may be down for maintenance"
            }
            Self::Portal(PortalError::SessionExpired { .. }) => {
                "the portal keeps ending the session: retry later"
            }
            Self::Portal(PortalError::Protocol(_) | PortalError::Parse(_)) | Self::Snapshot(_) => {
                "the portal layout changed: compare [portal.login] and the table ids with the live pages"
            }
            Self::State(_) => "check that the state directory is writable",
            Self::Notify(_) => {
                "check the [mail] settings; baselines were already updated, so this change will not be sent again"
            }
        }
    }
}
