use crate::common::info;
use crate::config::Config;
use crate::release::github_api_definition::GithubApiLatest;
use crate::release::{Downloader, InstallerAsset, ReleaseFetcher, ReleaseInfo, VersionTag};
use anyhow::{bail, Context};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const USER_AGENT: &str = "zenith-installer";
const RELEASE_ACCEPT: &str = "application/vnd.github.v3+json";
const ASSET_ACCEPT: &str = "application/octet-stream";
const CHUNK_SIZE: usize = 64 * 1024;
const MAX_ERROR_BODY: usize = 200;

/// Talks to the GitHub REST API: latest release lookup and authenticated asset download
pub struct GithubClient {
    client: Client,
    latest_release_url: String,
    token: String,
    asset_suffix: String,
}

impl GithubClient {
    pub fn create(config: &Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(30))
            .build()
            .context("Could not build client")?;

        Ok(GithubClient {
            client,
            latest_release_url: config.latest_release_url(),
            token: config.token.clone(),
            asset_suffix: config.asset_suffix.clone(),
        })
    }

    fn authorization(&self) -> String {
        format!("Bearer {}", self.token)
    }

    fn to_release_info(api_data: GithubApiLatest, asset_suffix: &str) -> ReleaseInfo {
        let installer_asset = api_data
            .assets
            .into_iter()
            .find(|a| a.name.ends_with(asset_suffix))
            .map(|a| InstallerAsset { name: a.name, url: a.browser_download_url });

        ReleaseInfo { tag: VersionTag::from(api_data.tag_name), installer_asset }
    }

    fn write_body(
        reader: &mut impl Read,
        path: &Path,
        expected: Option<u64>,
        progress: &mut dyn FnMut(u64, Option<u64>),
    ) -> anyhow::Result<u64> {
        let mut file = File::create(path).with_context(|| format!("Could not create {path:?}"))?;
        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut written: u64 = 0;

        progress(written, expected);
        loop {
            let n = reader.read(&mut buf).context("Could not read download stream")?;
            if n == 0 {
                break;
            }
            file.write_all(&buf[..n]).with_context(|| format!("Could not write {path:?}"))?;
            written += n as u64;
            progress(written, expected);
        }
        file.sync_all().with_context(|| format!("Could not sync {path:?}"))?;

        match expected {
            Some(expected) if written != expected => {
                bail!("Download incomplete: {written} of {expected} bytes")
            }
            _ => Ok(written),
        }
    }
}

impl ReleaseFetcher for GithubClient {
    fn fetch_latest(&self) -> anyhow::Result<ReleaseInfo> {
        let response = self
            .client
            .get(&self.latest_release_url)
            .header(AUTHORIZATION, self.authorization())
            .header(ACCEPT, RELEASE_ACCEPT)
            .send()
            .context("Could not get API response")?;

        let status_code = response.status();
        if !status_code.is_success() {
            let response_text = response.text().unwrap_or_default();
            let response_text: String = response_text.trim().chars().take(MAX_ERROR_BODY).collect();
            bail!("GitHub responded with {status_code} - {response_text}");
        }

        let api_data: GithubApiLatest = response.json().context("Could not parse json")?;
        Ok(Self::to_release_info(api_data, &self.asset_suffix))
    }
}

impl Downloader for GithubClient {
    fn download(
        &self,
        url: &str,
        target: &Path,
        progress: &mut dyn FnMut(u64, Option<u64>),
    ) -> anyhow::Result<()> {
        info(format!("downloading {url:?} to {target:?}"));
        let mut response = self
            .client
            .get(url)
            .header(AUTHORIZATION, self.authorization())
            .header(ACCEPT, ASSET_ACCEPT)
            .send()
            .with_context(|| format!("Could not get {url}"))?;

        let status_code = response.status();
        if !status_code.is_success() {
            bail!("Download responded with {status_code}");
        }

        let expected = response.content_length();
        let part = part_path(target);
        let result = Self::write_body(&mut response, &part, expected, progress).and_then(|_| {
            fs::rename(&part, target)
                .with_context(|| format!("Could not move {part:?} to {target:?}"))
        });

        if result.is_err() {
            let _ = fs::remove_file(&part);
        }
        result
    }
}

/// Scratch file the download streams into before it is moved over `target`
pub fn part_path(target: &Path) -> PathBuf {
    let mut name = target.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    target.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use crate::release::github::{part_path, GithubClient};
    use crate::release::github_api_definition::GithubApiLatest;
    use crate::release::VersionTag;
    use std::io::Cursor;
    use std::path::PathBuf;

    const LATEST_JSON: &str = r#"{
        "tag_name": "v2.0.0",
        "name": "Zenith 2",
        "draft": false,
        "prerelease": false,
        "assets": [
            {"name": "checksums.txt", "browser_download_url": "https://example.com/checksums.txt"},
            {"name": "zenith-v2.0.0.apk", "browser_download_url": "https://example.com/zenith.apk", "size": 42}
        ]
    }"#;

    #[test]
    fn test_to_release_info_finds_apk() {
        let api_data: GithubApiLatest = parse(LATEST_JSON);
        let release = GithubClient::to_release_info(api_data, ".apk");
        assert_eq!(release.tag, VersionTag::from("v2.0.0"));
        let asset = release.installer_asset.unwrap();
        assert_eq!(asset.name, "zenith-v2.0.0.apk");
        assert_eq!(asset.url, "https://example.com/zenith.apk");
    }

    #[test]
    fn test_to_release_info_without_apk() {
        let api_data: GithubApiLatest =
            parse(r#"{"tag_name": "v2.0.0", "assets": [{"name": "app.aab", "browser_download_url": "u"}]}"#);
        let release = GithubClient::to_release_info(api_data, ".apk");
        assert_eq!(release.installer_asset, None);
    }

    #[test]
    fn test_part_path() {
        assert_eq!(
            part_path(&PathBuf::from("/data/zenith_app.apk")),
            PathBuf::from("/data/zenith_app.apk.part")
        );
    }

    #[test]
    fn test_write_body_reports_progress() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.apk");
        let body = vec![7u8; 150 * 1024];
        let mut calls = Vec::new();

        let written = GithubClient::write_body(
            &mut Cursor::new(body.clone()),
            &path,
            Some(body.len() as u64),
            &mut |w, e| calls.push((w, e)),
        )
        .unwrap();

        assert_eq!(written, body.len() as u64);
        assert_eq!(calls.first(), Some(&(0, Some(body.len() as u64))));
        assert_eq!(calls.last(), Some(&(body.len() as u64, Some(body.len() as u64))));
        assert!(calls.windows(2).all(|w| w[0].0 <= w[1].0));
        assert_eq!(std::fs::read(&path).unwrap(), body);
    }

    #[test]
    fn test_write_body_incomplete() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.apk");
        let result =
            GithubClient::write_body(&mut Cursor::new(vec![1u8; 10]), &path, Some(20), &mut |_, _| {});
        assert_eq!(result.unwrap_err().to_string(), "Download incomplete: 10 of 20 bytes");
    }

    fn parse(data: &str) -> GithubApiLatest {
        serde_json::from_str(data).unwrap()
    }
}
