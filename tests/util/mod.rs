#![allow(dead_code)]

use rand::distr::{Alphanumeric, SampleString};
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;
use zenith_installer::config::{Config, REPO_NAME_VAR, REPO_OWNER_VAR, TOKEN_VAR};
use zenith_installer::launcher::Launcher;

pub const OWNER: &str = "zenith-org";
pub const REPO: &str = "zenith-app";
pub const LATEST_PATH: &str = "/repos/zenith-org/zenith-app/releases/latest";
pub const APK_PATH: &str = "/download/zenith.apk";

pub struct Route {
    pub path: String,
    pub status: &'static str,
    pub body: Vec<u8>,
}

impl Route {
    pub fn new(path: &str, status: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Route { path: path.to_string(), status, body: body.into() }
    }
}

#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub path: String,
    pub headers: Vec<(String, String)>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }
}

/// Minimal HTTP/1.1 server standing in for the GitHub API
pub struct TestServer {
    pub base: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl TestServer {
    pub fn start<F>(routes: F) -> Self
    where
        F: FnOnce(&str) -> Vec<Route>,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let routes = routes(&base);
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = requests.clone();

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                if let Some(request) = serve(stream, &routes) {
                    recorded.lock().unwrap().push(request);
                }
            }
        });

        TestServer { base, requests }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }
}

fn serve(mut stream: TcpStream, routes: &[Route]) -> Option<RecordedRequest> {
    let mut reader = BufReader::new(stream.try_clone().ok()?);
    let mut request_line = String::new();
    reader.read_line(&mut request_line).ok()?;
    let path = request_line.split_whitespace().nth(1)?.to_string();

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).ok()?;
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
        }
    }

    let (status, body) = match routes.iter().find(|r| r.path == path) {
        Some(route) => (route.status, route.body.clone()),
        None => ("404 Not Found", b"{\"message\":\"Not Found\"}".to_vec()),
    };
    let head = format!(
        "HTTP/1.1 {status}\r\nContent-Length: {}\r\nContent-Type: application/json\r\nConnection: close\r\n\r\n",
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(&body);
    let _ = stream.flush();

    Some(RecordedRequest { path, headers })
}

pub fn latest_json(tag: &str, assets: &[(&str, String)]) -> String {
    let assets: Vec<String> = assets
        .iter()
        .map(|(name, url)| format!(r#"{{"name": "{name}", "browser_download_url": "{url}"}}"#))
        .collect();
    format!(r#"{{"tag_name": "{tag}", "draft": false, "assets": [{}]}}"#, assets.join(", "))
}

pub fn config(data_dir: &Path, base: &str) -> Config {
    Config::from_lookup(data_dir.to_path_buf(), |name| match name {
        REPO_OWNER_VAR => Some(OWNER.to_string()),
        REPO_NAME_VAR => Some(REPO.to_string()),
        TOKEN_VAR => Some("t0ken".to_string()),
        _ => None,
    })
    .unwrap()
    .with_api_base(base)
}

pub fn random_payload(len: usize) -> Vec<u8> {
    Alphanumeric.sample_string(&mut rand::rng(), len).into_bytes()
}

#[derive(Default)]
pub struct RecordingLauncher {
    pub launched: Mutex<Vec<(PathBuf, Vec<u8>)>>,
}

impl Launcher for RecordingLauncher {
    fn launch(&self, artifact: &Path) -> anyhow::Result<()> {
        let content = std::fs::read(artifact)?;
        self.launched.lock().unwrap().push((artifact.to_path_buf(), content));
        Ok(())
    }
}
