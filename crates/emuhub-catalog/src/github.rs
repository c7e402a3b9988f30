//! Thin GitHub release API client

use crate::CatalogError;
use serde::Deserialize;

const GITHUB_API: &str = "https://api.github.com";

/// A release asset as the API reports it
#[derive(Debug, Clone, Deserialize)]
pub struct GhAsset {
    pub name: String,
    pub browser_download_url: String,
    #[serde(default)]
    pub size: u64,
}

/// A release as the API reports it
#[derive(Debug, Clone, Deserialize)]
pub struct GhRelease {
    pub tag_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub assets: Vec<GhAsset>,
}

/// Authenticated (optionally) GitHub API client
pub struct GithubClient {
    client: reqwest::Client,
    token: Option<String>,
}

impl GithubClient {
    pub fn new(token: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent(format!("EmuHub/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, token }
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let mut request = self
            .client
            .get(url)
            .header("Accept", "application/vnd.github+json");

        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        request
    }

    /// Latest non-prerelease of a repository
    pub async fn latest_release(&self, owner: &str, repo: &str) -> Result<GhRelease, CatalogError> {
        let url = format!("{}/repos/{}/{}/releases/latest", GITHUB_API, owner, repo);
        tracing::debug!("Fetching latest release from {}", url);

        let response = self.get(&url).send().await?;
        let response = check_status(response)?;

        Ok(response.json().await?)
    }

    /// All releases of a repository, newest first
    pub async fn all_releases(&self, owner: &str, repo: &str) -> Result<Vec<GhRelease>, CatalogError> {
        let url = format!(
            "{}/repos/{}/{}/releases?per_page=100",
            GITHUB_API, owner, repo
        );
        tracing::debug!("Fetching releases from {}", url);

        let response = self.get(&url).send().await?;
        let response = check_status(response)?;

        Ok(response.json().await?)
    }
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response, CatalogError> {
    let status = response.status();

    if status == reqwest::StatusCode::FORBIDDEN || status == reqwest::StatusCode::TOO_MANY_REQUESTS
    {
        return Err(CatalogError::RateLimited);
    }
    if !status.is_success() {
        return Err(CatalogError::Status(status));
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_deserializes_with_missing_fields() {
        let json = r#"{"tag_name": "1.2.3"}"#;
        let release: GhRelease = serde_json::from_str(json).unwrap();

        assert_eq!(release.tag_name, "1.2.3");
        assert!(release.name.is_empty());
        assert!(release.assets.is_empty());
        assert!(!release.prerelease);
    }

    #[test]
    fn test_asset_deserializes() {
        let json = r#"{
            "name": "build-win_x64.zip",
            "browser_download_url": "https://example.com/build.zip",
            "size": 1024
        }"#;
        let asset: GhAsset = serde_json::from_str(json).unwrap();

        assert_eq!(asset.name, "build-win_x64.zip");
        assert_eq!(asset.size, 1024);
    }
}
