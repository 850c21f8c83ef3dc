use crate::updater::Phase;
use thiserror::Error;

/// Failures surfaced at the check and install boundaries.
///
/// Collaborators report `anyhow` errors; they are folded into one of these variants before they
/// reach the UI, the CLI or the wake handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpdateError {
    #[error("Configuration error, missing {}", .0.join(", "))]
    ConfigurationMissing(Vec<String>),
    #[error("Check failed: {0}")]
    FetchFailed(String),
    #[error("No installer asset found in the latest release")]
    NoInstallerAsset,
    #[error("Download failed: {0}")]
    DownloadFailed(String),
    #[error("Could not open the installer: {0}")]
    InstallLaunchFailed(String),
    #[error("Busy, currently {0}")]
    Busy(Phase),
}

impl UpdateError {
    /// Whether repeating the same operation later can succeed.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, UpdateError::ConfigurationMissing(_) | UpdateError::NoInstallerAsset)
    }
}
