use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct GithubApiAsset {
    pub name: String,
    pub browser_download_url: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct GithubApiLatest {
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<GithubApiAsset>,
}
