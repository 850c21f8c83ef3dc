//! Coordinates checks and installs against the single persisted version record.
//!
//! Both operations are single-flight and share one phase: a check may only start while the
//! updater is idle, a second check arriving meanwhile waits for the running one and gets its
//! report. An install is rejected unless the updater is idle.

pub mod progress;
pub mod reconcile;

use crate::common::fs::ensure_dir;
use crate::common::{error, info};
use crate::config::Config;
use crate::error::UpdateError;
use crate::launcher::{platform_launcher, Launcher};
use crate::release::github::GithubClient;
use crate::release::{Downloader, ReleaseFetcher, ReleaseInfo, VersionTag};
use crate::updater::progress::DownloadSession;
use crate::updater::reconcile::{CheckReport, ReconciliationState};
use crate::version_store::{FileVersionStore, VersionStore};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

pub const ARTIFACT_FILE_NAME: &str = "zenith_app.apk";
const STARTING_STATUS: &str = "Starting...";
const CHECKING_STATUS: &str = "Checking for updates...";
const DOWNLOADING_STATUS: &str = "Downloading...";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Checking,
    Downloading,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::Checking => write!(f, "checking"),
            Phase::Downloading => write!(f, "downloading"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpdateEvent {
    PhaseChanged(Phase),
    Checked(CheckReport),
    Progress(u8),
    Installed(VersionTag),
    Failed(UpdateError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&UpdateEvent) + Send + Sync>;

/// Everything a screen needs to render itself
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub phase: Phase,
    pub report: Option<CheckReport>,
    pub progress: Option<u8>,
    pub status: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackgroundFetchResult {
    NewData,
    NoData,
    Failed,
}

#[derive(Default)]
struct Inner {
    phase: Phase,
    report: Option<CheckReport>,
    checks_completed: u64,
    download: Option<DownloadSession>,
    status: String,
}

pub struct Updater {
    fetcher: Arc<dyn ReleaseFetcher>,
    store: Arc<dyn VersionStore>,
    downloader: Arc<dyn Downloader>,
    launcher: Arc<dyn Launcher>,
    artifact_path: PathBuf,
    inner: Mutex<Inner>,
    settled: Condvar,
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
    next_subscription: AtomicU64,
}

impl Updater {
    pub fn create(
        fetcher: Arc<dyn ReleaseFetcher>,
        store: Arc<dyn VersionStore>,
        downloader: Arc<dyn Downloader>,
        launcher: Arc<dyn Launcher>,
        data_dir: &Path,
    ) -> Self {
        Updater {
            fetcher,
            store,
            downloader,
            launcher,
            artifact_path: data_dir.join(ARTIFACT_FILE_NAME),
            inner: Mutex::new(Inner { status: STARTING_STATUS.to_string(), ..Inner::default() }),
            settled: Condvar::new(),
            listeners: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(0),
        }
    }

    /// GitHub for releases and downloads, the file record in `config.data_dir` and the launcher
    /// of the current platform.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let github = Arc::new(GithubClient::create(config)?);
        let store = Arc::new(FileVersionStore::create(&config.data_dir)?);
        Ok(Self::create(
            github.clone(),
            store,
            github,
            Arc::from(platform_launcher()),
            &config.data_dir,
        ))
    }

    pub fn artifact_path(&self) -> &Path {
        &self.artifact_path
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&UpdateEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.lock_listeners().push((id, Arc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.lock_listeners();
        let before = listeners.len();
        listeners.retain(|(i, _)| *i != id);
        listeners.len() != before
    }

    pub fn snapshot(&self) -> Snapshot {
        let inner = self.lock_inner();
        Snapshot {
            phase: inner.phase,
            report: inner.report.clone(),
            progress: inner.download.as_ref().and_then(DownloadSession::percent),
            status: inner.status.clone(),
        }
    }

    /// Reads the record, fetches the latest release and derives the reconciliation state.
    ///
    /// Fetch problems are part of the report (`FetchFailed`); the only error is `Busy` while a
    /// download is running.
    pub fn check(&self) -> Result<CheckReport, UpdateError> {
        let mut inner = self.lock_inner();
        match inner.phase {
            Phase::Checking => {
                let seen = inner.checks_completed;
                let inner = self
                    .settled
                    .wait_while(inner, |i| i.checks_completed == seen)
                    .unwrap_or_else(PoisonError::into_inner);
                return inner.report.clone().ok_or(UpdateError::Busy(Phase::Checking));
            }
            Phase::Downloading => return Err(UpdateError::Busy(Phase::Downloading)),
            Phase::Idle => {}
        }
        inner.phase = Phase::Checking;
        inner.status = CHECKING_STATUS.to_string();
        drop(inner);
        self.emit(&UpdateEvent::PhaseChanged(Phase::Checking));

        let report = self.run_check();
        info(format!(
            "check finished: {:?}, stored {:?}, latest {:?}",
            report.state,
            report.stored.as_ref().map(VersionTag::as_str),
            report.latest_tag().map(VersionTag::as_str),
        ));

        let mut inner = self.lock_inner();
        inner.phase = Phase::Idle;
        inner.status = report.message.clone();
        inner.report = Some(report.clone());
        inner.checks_completed += 1;
        drop(inner);
        self.settled.notify_all();

        self.emit(&UpdateEvent::Checked(report.clone()));
        self.emit(&UpdateEvent::PhaseChanged(Phase::Idle));
        Ok(report)
    }

    /// Downloads the installer of `release`, opens it and records its tag.
    ///
    /// The tag is written only after the download completed and the installer was opened.
    /// Installing the tag that is already recorded is allowed (reinstall).
    pub fn install(&self, release: &ReleaseInfo) -> Result<PathBuf, UpdateError> {
        let url = match release.installer_asset_url() {
            Some(url) => url.to_string(),
            None => return Err(self.reject(UpdateError::NoInstallerAsset)),
        };

        {
            let mut inner = self.lock_inner();
            if inner.phase != Phase::Idle {
                let phase = inner.phase;
                drop(inner);
                return Err(self.reject(UpdateError::Busy(phase)));
            }
            inner.phase = Phase::Downloading;
            inner.status = DOWNLOADING_STATUS.to_string();
            inner.download = Some(DownloadSession::new(release.tag.clone()));
        }
        self.emit(&UpdateEvent::PhaseChanged(Phase::Downloading));

        let result = self.run_install(release, &url);

        {
            let mut inner = self.lock_inner();
            inner.phase = Phase::Idle;
            inner.download = None;
            inner.status = match &result {
                Ok(_) => format!("Download finished, installer for {} opened.", release.tag),
                Err(e) => e.to_string(),
            };
        }
        self.settled.notify_all();
        self.emit(&UpdateEvent::PhaseChanged(Phase::Idle));

        match result {
            Ok(path) => {
                info(format!("installed {} from {path:?}", release.tag));
                self.emit(&UpdateEvent::Installed(release.tag.clone()));
                if let Err(e) = self.check() {
                    error(format!("Follow-up check after install failed: {e}"));
                }
                Ok(path)
            }
            Err(e) => {
                error(format!("Install of {} failed: {e}", release.tag));
                self.emit(&UpdateEvent::Failed(e.clone()));
                Err(e)
            }
        }
    }

    /// Installs the release seen by the last check.
    pub fn install_latest(&self) -> Result<PathBuf, UpdateError> {
        let release = self.lock_inner().report.as_ref().and_then(|r| r.release.clone());
        match release {
            Some(release) => self.install(&release),
            None => Err(self.reject(UpdateError::NoInstallerAsset)),
        }
    }

    /// Check triggered without user interaction: never writes anything and never fails loudly.
    pub fn background_check(&self) -> BackgroundFetchResult {
        match self.check() {
            Ok(report) => match report.state {
                ReconciliationState::UpdateAvailable => {
                    let tag = report.latest_tag().map(VersionTag::to_string).unwrap_or_default();
                    info(format!("New version found in background: {tag}"));
                    BackgroundFetchResult::NewData
                }
                ReconciliationState::FetchFailed => {
                    error(format!("Background check failed: {}", report.message));
                    BackgroundFetchResult::Failed
                }
                _ => {
                    info("No new version found in background");
                    BackgroundFetchResult::NoData
                }
            },
            Err(e) => {
                info(format!("Background check skipped: {e}"));
                BackgroundFetchResult::NoData
            }
        }
    }

    fn run_check(&self) -> CheckReport {
        let stored = match self.store.get() {
            Ok(stored) => stored,
            Err(e) => return CheckReport::failed(None, format!("Could not read installed version: {e:#}")),
        };

        match self.fetcher.fetch_latest() {
            Ok(release) => CheckReport::fetched(stored, release),
            Err(e) => CheckReport::failed(stored, format!("{e:#}")),
        }
    }

    fn run_install(&self, release: &ReleaseInfo, url: &str) -> Result<PathBuf, UpdateError> {
        let target = self.artifact_path.clone();
        if let Some(parent) = target.parent() {
            ensure_dir(parent).map_err(|e| UpdateError::DownloadFailed(format!("{e:#}")))?;
        }

        self.downloader
            .download(url, &target, &mut |written, expected| self.record_progress(written, expected))
            .map_err(|e| UpdateError::DownloadFailed(format!("{e:#}")))?;

        let completed = self.lock_inner().download.as_mut().and_then(DownloadSession::complete);
        if let Some(percent) = completed {
            self.emit(&UpdateEvent::Progress(percent));
        }

        self.launcher
            .launch(&target)
            .map_err(|e| UpdateError::InstallLaunchFailed(format!("{e:#}")))?;

        self.store.set(&release.tag).map_err(|e| {
            UpdateError::DownloadFailed(format!("Could not record installed version: {e:#}"))
        })?;
        Ok(target)
    }

    fn record_progress(&self, written: u64, expected: Option<u64>) {
        let percent = self.lock_inner().download.as_mut().and_then(|s| s.advance(written, expected));
        if let Some(percent) = percent {
            self.emit(&UpdateEvent::Progress(percent));
        }
    }

    /// Publishes a refused operation; the status line is left alone while something else runs.
    fn reject(&self, err: UpdateError) -> UpdateError {
        {
            let mut inner = self.lock_inner();
            if inner.phase == Phase::Idle {
                inner.status = err.to_string();
            }
        }
        self.emit(&UpdateEvent::Failed(err.clone()));
        err
    }

    fn emit(&self, event: &UpdateEvent) {
        let listeners: Vec<Listener> =
            self.lock_listeners().iter().map(|(_, l)| Arc::clone(l)).collect();
        for listener in listeners {
            listener(event);
        }
    }

    fn lock_inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_listeners(&self) -> MutexGuard<'_, Vec<(SubscriptionId, Listener)>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
