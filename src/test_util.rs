#![cfg(test)]
use crate::launcher::Launcher;
use crate::release::{Downloader, InstallerAsset, ReleaseFetcher, ReleaseInfo, VersionTag};
use crate::updater::Updater;
use crate::version_store::VersionStore;
use anyhow::bail;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub(crate) fn release(tag: &str, with_apk: bool) -> ReleaseInfo {
    ReleaseInfo {
        tag: VersionTag::from(tag),
        installer_asset: with_apk.then(|| InstallerAsset {
            name: format!("zenith-{tag}.apk"),
            url: format!("https://example.com/{tag}/zenith.apk"),
        }),
    }
}

/// Answers every fetch with the same result, optionally waiting for a go signal first
pub(crate) struct FakeFetcher {
    result: Mutex<Result<ReleaseInfo, String>>,
    gate: Option<Mutex<Receiver<()>>>,
    pub(crate) calls: AtomicUsize,
}

impl FakeFetcher {
    pub(crate) fn ok(release: ReleaseInfo) -> Self {
        FakeFetcher { result: Mutex::new(Ok(release)), gate: None, calls: AtomicUsize::new(0) }
    }

    pub(crate) fn failing(reason: &str) -> Self {
        FakeFetcher {
            result: Mutex::new(Err(reason.to_string())),
            gate: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn gated(release: ReleaseInfo, gate: Receiver<()>) -> Self {
        FakeFetcher {
            result: Mutex::new(Ok(release)),
            gate: Some(Mutex::new(gate)),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn set(&self, release: ReleaseInfo) {
        *self.result.lock().unwrap() = Ok(release);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ReleaseFetcher for FakeFetcher {
    fn fetch_latest(&self) -> anyhow::Result<ReleaseInfo> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            let _ = gate.lock().unwrap().recv();
        }
        match &*self.result.lock().unwrap() {
            Ok(release) => Ok(release.clone()),
            Err(reason) => bail!("{reason}"),
        }
    }
}

/// Replays progress steps, then writes the artifact or fails
pub(crate) struct FakeDownloader {
    steps: Vec<(u64, Option<u64>)>,
    fail_with: Option<String>,
    pub(crate) urls: Mutex<Vec<String>>,
}

impl FakeDownloader {
    pub(crate) fn ok(steps: Vec<(u64, Option<u64>)>) -> Self {
        FakeDownloader { steps, fail_with: None, urls: Mutex::new(vec![]) }
    }

    pub(crate) fn failing(steps: Vec<(u64, Option<u64>)>, reason: &str) -> Self {
        FakeDownloader { steps, fail_with: Some(reason.to_string()), urls: Mutex::new(vec![]) }
    }
}

impl Downloader for FakeDownloader {
    fn download(
        &self,
        url: &str,
        target: &Path,
        progress: &mut dyn FnMut(u64, Option<u64>),
    ) -> anyhow::Result<()> {
        self.urls.lock().unwrap().push(url.to_string());
        for (written, expected) in &self.steps {
            progress(*written, *expected);
        }
        if let Some(reason) = &self.fail_with {
            bail!("{reason}");
        }
        fs::write(target, b"apk")?;
        Ok(())
    }
}

/// In-process version slot
#[derive(Debug, Default)]
pub(crate) struct MemoryVersionStore {
    slot: Mutex<Option<VersionTag>>,
}

impl MemoryVersionStore {
    pub(crate) fn with_tag(tag: impl Into<VersionTag>) -> Self {
        MemoryVersionStore { slot: Mutex::new(Some(tag.into())) }
    }
}

impl VersionStore for MemoryVersionStore {
    fn get(&self) -> anyhow::Result<Option<VersionTag>> {
        Ok(self.slot.lock().unwrap().clone())
    }

    fn set(&self, tag: &VersionTag) -> anyhow::Result<()> {
        *self.slot.lock().unwrap() = Some(tag.clone());
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeLauncher {
    fail: bool,
    pub(crate) launched: Mutex<Vec<PathBuf>>,
}

impl FakeLauncher {
    pub(crate) fn failing() -> Self {
        FakeLauncher { fail: true, launched: Mutex::new(vec![]) }
    }

    pub(crate) fn count(&self) -> usize {
        self.launched.lock().unwrap().len()
    }
}

impl Launcher for FakeLauncher {
    fn launch(&self, artifact: &Path) -> anyhow::Result<()> {
        if self.fail {
            bail!("No activity found to handle the intent");
        }
        self.launched.lock().unwrap().push(artifact.to_path_buf());
        Ok(())
    }
}

pub(crate) struct Harness {
    pub(crate) updater: Arc<Updater>,
    pub(crate) fetcher: Arc<FakeFetcher>,
    pub(crate) store: Arc<MemoryVersionStore>,
    pub(crate) launcher: Arc<FakeLauncher>,
    _dir: TempDir,
}

impl Harness {
    pub(crate) fn create(
        fetcher: FakeFetcher,
        stored: Option<&str>,
        downloader: FakeDownloader,
        launcher: FakeLauncher,
    ) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(fetcher);
        let store = Arc::new(stored.map(|t| MemoryVersionStore::with_tag(t)).unwrap_or_default());
        let launcher = Arc::new(launcher);
        let updater = Arc::new(Updater::create(
            fetcher.clone(),
            store.clone(),
            Arc::new(downloader),
            launcher.clone(),
            dir.path(),
        ));
        Harness { updater, fetcher, store, launcher, _dir: dir }
    }

    pub(crate) fn stored(&self) -> Option<VersionTag> {
        self.store.get().unwrap()
    }
}
