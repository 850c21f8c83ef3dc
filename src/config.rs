//! Configuration of the installer: repository coordinates, credential and local paths.
//! Values come from CLI arguments, the boot environment or from values baked in at build time,
//! in that order.

use crate::common::fs::get_data_dir;
use crate::error::UpdateError;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use std::{env, fmt};

pub const REPO_OWNER_VAR: &str = "ZENITH_REPO_OWNER";
pub const REPO_NAME_VAR: &str = "ZENITH_REPO_NAME";
pub const TOKEN_VAR: &str = "ZENITH_GITHUB_TOKEN";

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_ASSET_SUFFIX: &str = ".apk";
/// Background checks never run more often than every 15 minutes
pub const MIN_WAKE_INTERVAL: Duration = Duration::from_secs(15 * 60);

#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub repo_owner: String,
    pub repo_name: String,
    pub token: String,
    pub api_base: String,
    pub asset_suffix: String,
    pub data_dir: PathBuf,
    pub wake_interval: Duration,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("repo_owner", &self.repo_owner)
            .field("repo_name", &self.repo_name)
            .field("token", &"***")
            .field("api_base", &self.api_base)
            .field("asset_suffix", &self.asset_suffix)
            .field("data_dir", &self.data_dir)
            .field("wake_interval", &self.wake_interval)
            .finish()
    }
}

impl Config {
    /// Reads the repository coordinates and the credential from the boot environment, falling
    /// back to the values baked in at build time.
    pub fn from_env(data_dir: PathBuf) -> Result<Self, UpdateError> {
        Self::from_lookup(data_dir, |name| env::var(name).ok().or_else(|| baked(name)))
    }

    /// Every missing (or empty) value is reported at once.
    pub fn from_lookup<F>(data_dir: PathBuf, lookup: F) -> Result<Self, UpdateError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        match (value(REPO_OWNER_VAR), value(REPO_NAME_VAR), value(TOKEN_VAR)) {
            (Some(repo_owner), Some(repo_name), Some(token)) => Ok(Config {
                repo_owner,
                repo_name,
                token,
                api_base: DEFAULT_API_BASE.to_string(),
                asset_suffix: DEFAULT_ASSET_SUFFIX.to_string(),
                data_dir,
                wake_interval: MIN_WAKE_INTERVAL,
            }),
            (owner, name, token) => {
                let missing = [(REPO_OWNER_VAR, owner), (REPO_NAME_VAR, name), (TOKEN_VAR, token)]
                    .into_iter()
                    .filter(|(_, v)| v.is_none())
                    .map(|(k, _)| k.to_string())
                    .collect();
                Err(UpdateError::ConfigurationMissing(missing))
            }
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_wake_interval(mut self, interval: Duration) -> Self {
        self.wake_interval = interval.max(MIN_WAKE_INTERVAL);
        self
    }

    pub fn latest_release_url(&self) -> String {
        format!("{}/repos/{}/{}/releases/latest", self.api_base, self.repo_owner, self.repo_name)
    }
}

fn baked(name: &str) -> Option<String> {
    match name {
        REPO_OWNER_VAR => option_env!("ZENITH_REPO_OWNER"),
        REPO_NAME_VAR => option_env!("ZENITH_REPO_NAME"),
        TOKEN_VAR => option_env!("ZENITH_GITHUB_TOKEN"),
        _ => None,
    }
    .map(str::to_string)
}

#[derive(Parser, Debug)]
pub struct CheckCommand {}

#[derive(Parser, Debug)]
pub struct InstallCommand {
    /// Download and install even if the registered version is the latest one
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Parser, Debug)]
pub struct WatchCommand {
    /// Seconds between background checks (at least 900)
    #[arg(short, long, default_value_t = MIN_WAKE_INTERVAL.as_secs())]
    pub interval: u64,
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct CliInstaller {
    /// Directory holding the version record and the downloaded APK
    #[arg(short, long, default_value = default_data_dir().into_os_string())]
    pub data_dir: PathBuf,
    /// Repository owner, overrides ZENITH_REPO_OWNER
    #[arg(short, long)]
    pub owner: Option<String>,
    /// Repository name, overrides ZENITH_REPO_NAME
    #[arg(short, long)]
    pub repo: Option<String>,
    /// GitHub access token, overrides ZENITH_GITHUB_TOKEN
    #[arg(short, long)]
    pub token: Option<String>,
    /// GitHub API base URL
    #[arg(short, long, default_value = DEFAULT_API_BASE)]
    pub api_base: String,
    #[command(subcommand)]
    pub command: CommandsInstaller,
}

#[derive(Debug, Subcommand)]
pub enum CommandsInstaller {
    /// Compare the registered version with the latest release
    Check(CheckCommand),
    /// Download the latest APK and hand it to the installer
    Install(InstallCommand),
    /// Keep checking in the background
    Watch(WatchCommand),
}

impl CliInstaller {
    pub fn config(&self) -> Result<Config, UpdateError> {
        let overrides = [
            (REPO_OWNER_VAR, &self.owner),
            (REPO_NAME_VAR, &self.repo),
            (TOKEN_VAR, &self.token),
        ];
        let config = Config::from_lookup(self.data_dir.clone(), |name| {
            overrides
                .iter()
                .find(|(k, _)| *k == name)
                .and_then(|(_, v)| (*v).clone())
                .or_else(|| env::var(name).ok())
                .or_else(|| baked(name))
        })?;
        Ok(config.with_api_base(&self.api_base))
    }
}

pub fn default_data_dir() -> PathBuf {
    get_data_dir().unwrap_or_else(|_| PathBuf::from("."))
}
