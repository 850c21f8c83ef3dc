use crate::common::fs::{ensure_dir, resolve_path, set_permissions};
use crate::release::VersionTag;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const INSTALLED_VERSION_KEY: &str = "zenith_installed_version";
pub const VERSION_RECORD_FILE: &str = "installed_version.toml";

/// Durable single slot holding the tag of the last installed release
pub trait VersionStore: Send + Sync {
    fn get(&self) -> anyhow::Result<Option<VersionTag>>;
    fn set(&self, tag: &VersionTag) -> anyhow::Result<()>;
}

#[derive(Debug, Default, Deserialize, Serialize, PartialEq)]
struct VersionRecord {
    #[serde(rename = "zenith_installed_version", skip_serializing_if = "Option::is_none")]
    installed: Option<String>,
}

/// Keeps the slot in a TOML file readable by the owner only
#[derive(Debug)]
pub struct FileVersionStore {
    path: PathBuf,
}

impl FileVersionStore {
    pub fn create(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = resolve_path(data_dir);
        ensure_dir(&data_dir)?;
        Ok(FileVersionStore { path: data_dir.join(VERSION_RECORD_FILE) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl VersionStore for FileVersionStore {
    fn get(&self) -> anyhow::Result<Option<VersionTag>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("Could not read {:?}", self.path)),
        };

        let record: VersionRecord = toml::from_str(&raw)
            .with_context(|| format!("Could not parse version record {:?}", self.path))?;
        Ok(record.installed.filter(|t| !t.is_empty()).map(VersionTag::from))
    }

    fn set(&self, tag: &VersionTag) -> anyhow::Result<()> {
        let record = VersionRecord { installed: Some(tag.to_string()) };
        let toml_str = toml::to_string(&record).context("Could not serialize version record")?;

        let tmp_path = self.path.with_extension("toml.tmp");
        fs::write(&tmp_path, toml_str).with_context(|| format!("Could not write {tmp_path:?}"))?;
        set_permissions(&tmp_path, 0o600)?;
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("Could not move {tmp_path:?} to {:?}", self.path))
    }
}
