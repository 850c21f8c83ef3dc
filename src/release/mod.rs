//! Release metadata and the seams towards the release hosting service

pub mod github;
mod github_api_definition;

use std::fmt;
use std::path::Path;

/// Opaque release identifier. Only equality is meaningful, tags are never ordered.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VersionTag(String);

impl VersionTag {
    pub fn new(tag: impl Into<String>) -> Self {
        VersionTag(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for VersionTag {
    fn from(tag: &str) -> Self {
        VersionTag::new(tag)
    }
}

impl From<String> for VersionTag {
    fn from(tag: String) -> Self {
        VersionTag(tag)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstallerAsset {
    pub name: String,
    pub url: String,
}

/// The latest published release as seen by one check
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReleaseInfo {
    pub tag: VersionTag,
    pub installer_asset: Option<InstallerAsset>,
}

impl ReleaseInfo {
    pub fn installer_asset_url(&self) -> Option<&str> {
        self.installer_asset.as_ref().map(|a| a.url.as_str())
    }
}

/// Fetches the latest release. A non-success status must be an error mentioning the status code.
pub trait ReleaseFetcher: Send + Sync {
    fn fetch_latest(&self) -> anyhow::Result<ReleaseInfo>;
}

/// Streams an installer asset to `target`, calling `progress(bytes_written, bytes_expected)`
/// after every chunk. `target` must only exist once the download completed.
pub trait Downloader: Send + Sync {
    fn download(
        &self,
        url: &str,
        target: &Path,
        progress: &mut dyn FnMut(u64, Option<u64>),
    ) -> anyhow::Result<()>;
}
