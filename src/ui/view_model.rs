use crate::error::UpdateError;
use crate::release::VersionTag;
use crate::updater::reconcile::ReconciliationState;
use crate::updater::{Phase, Snapshot};
use std::fmt;

const NO_VERSION_LABEL: &str = "None";
const CHECKING_LABEL: &str = "Checking...";
const UNKNOWN_LABEL: &str = "Unknown";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PrimaryAction {
    Install,
    Update,
    Reinstall(VersionTag),
}

impl fmt::Display for PrimaryAction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PrimaryAction::Install => write!(f, "Install"),
            PrimaryAction::Update => write!(f, "Update"),
            PrimaryAction::Reinstall(tag) => write!(f, "Reinstall ({tag})"),
        }
    }
}

/// What the installer screen shows, derived from an updater snapshot
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScreenView {
    pub stored_version: String,
    pub latest_version: String,
    pub status: String,
    pub checking: bool,
    pub downloading: bool,
    pub progress: u8,
    pub primary_action: Option<PrimaryAction>,
    pub recheck_enabled: bool,
}

impl ScreenView {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let idle = snapshot.phase == Phase::Idle;
        let report = snapshot.report.as_ref();

        let stored_version = match report {
            Some(r) => r.stored.as_ref().map_or(NO_VERSION_LABEL.to_string(), VersionTag::to_string),
            None => String::new(),
        };
        let latest_version = match report {
            Some(r) => match (r.latest_tag(), r.state) {
                (Some(tag), _) => tag.to_string(),
                (None, ReconciliationState::FetchFailed) => UNKNOWN_LABEL.to_string(),
                (None, _) => CHECKING_LABEL.to_string(),
            },
            None => CHECKING_LABEL.to_string(),
        };

        let primary_action = match report {
            Some(r) if idle && r.state == ReconciliationState::UpdateAvailable => {
                Some(if r.is_first_install() { PrimaryAction::Install } else { PrimaryAction::Update })
            }
            Some(r) if idle && r.state == ReconciliationState::UpToDate => r
                .latest_tag()
                .filter(|tag| !tag.as_str().is_empty())
                .map(|tag| PrimaryAction::Reinstall(tag.clone())),
            _ => None,
        };

        ScreenView {
            stored_version,
            latest_version,
            status: snapshot.status.clone(),
            checking: snapshot.phase == Phase::Checking,
            downloading: snapshot.phase == Phase::Downloading,
            progress: snapshot.progress.unwrap_or(0),
            primary_action,
            recheck_enabled: idle,
        }
    }

    /// Nothing can be checked or installed without configuration.
    pub fn configuration_error(err: &UpdateError) -> Self {
        ScreenView {
            latest_version: UNKNOWN_LABEL.to_string(),
            status: format!("{err}. Check the build environment."),
            ..ScreenView::default()
        }
    }

    pub fn primary_label(&self) -> Option<String> {
        self.primary_action.as_ref().map(PrimaryAction::to_string)
    }

    pub fn shows_reinstall(&self) -> bool {
        matches!(self.primary_action, Some(PrimaryAction::Reinstall(_)))
    }
}
