use crate::error::UpdateError;
use crate::release::{ReleaseInfo, VersionTag};

/// Outcome of one check, recomputed wholesale every time
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReconciliationState {
    #[default]
    Unknown,
    UpToDate,
    UpdateAvailable,
    NoInstallerAsset,
    FetchFailed,
}

/// Tags are compared for equality only: any difference counts as an update, an empty slot is a
/// first install.
pub fn reconcile(stored: Option<&VersionTag>, release: &ReleaseInfo) -> ReconciliationState {
    if release.installer_asset.is_none() {
        return ReconciliationState::NoInstallerAsset;
    }

    match stored {
        None => ReconciliationState::UpdateAvailable,
        Some(tag) if *tag == release.tag => ReconciliationState::UpToDate,
        Some(_) => ReconciliationState::UpdateAvailable,
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckReport {
    pub state: ReconciliationState,
    /// `None` means nothing was ever installed through this app
    pub stored: Option<VersionTag>,
    pub release: Option<ReleaseInfo>,
    pub message: String,
    /// set when the check did not end in an installable verdict
    pub failure: Option<UpdateError>,
}

impl CheckReport {
    pub fn fetched(stored: Option<VersionTag>, release: ReleaseInfo) -> Self {
        let state = reconcile(stored.as_ref(), &release);
        let message = match state {
            ReconciliationState::UpToDate => {
                "You already have the latest registered version.".to_string()
            }
            ReconciliationState::UpdateAvailable => format!("New version ({}) available!", release.tag),
            _ => format!("Error: no installer found in release {}.", release.tag),
        };

        let failure =
            (state == ReconciliationState::NoInstallerAsset).then_some(UpdateError::NoInstallerAsset);

        CheckReport { state, stored, release: Some(release), message, failure }
    }

    pub fn failed(stored: Option<VersionTag>, reason: impl std::fmt::Display) -> Self {
        let failure = UpdateError::FetchFailed(reason.to_string());
        CheckReport {
            state: ReconciliationState::FetchFailed,
            stored,
            release: None,
            message: failure.to_string(),
            failure: Some(failure),
        }
    }

    pub fn latest_tag(&self) -> Option<&VersionTag> {
        self.release.as_ref().map(|r| &r.tag)
    }

    pub fn is_first_install(&self) -> bool {
        self.stored.is_none()
    }
}
