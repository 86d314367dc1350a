//! GitHub release assets.

use async_trait::async_trait;
use glob::Pattern;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::resolver::{ResolveError, ResolvedAsset, Resolver, get_ok};
use crate::paths::filename_from_url;

pub const GITHUB_API: &str = "https://api.github.com";

#[derive(Debug, Deserialize)]
struct Release {
    #[serde(default)]
    tag_name: String,
    #[serde(default)]
    assets: Vec<Asset>,
}

#[derive(Debug, Deserialize)]
struct Asset {
    #[serde(default)]
    name: String,
    browser_download_url: String,
}

impl Asset {
    fn file_name(&self) -> &str {
        if self.name.is_empty() {
            filename_from_url(&self.browser_download_url)
        } else {
            &self.name
        }
    }
}

/// Latest release of `owner/repo`; the first asset whose name matches
/// `pattern` wins.
#[derive(Debug, Clone)]
pub struct GithubRelease {
    owner: String,
    repo: String,
    pattern: Pattern,
    api_base: String,
    token: Option<String>,
}

impl GithubRelease {
    /// `repository` is `owner/repo`; `pattern` is a glob such as `*.apk`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Repository`] or [`ResolveError::Pattern`] for
    /// malformed input.
    pub fn new(repository: &str, pattern: &str) -> Result<Self, ResolveError> {
        let (owner, repo) = repository
            .split_once('/')
            .filter(|(o, r)| !o.is_empty() && !r.is_empty() && !r.contains('/'))
            .ok_or_else(|| ResolveError::Repository(repository.to_string()))?;
        let pattern = Pattern::new(pattern).map_err(|source| ResolveError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            pattern,
            api_base: GITHUB_API.to_string(),
            token: None,
        })
    }

    #[must_use]
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    /// Authenticate API requests, raising the rate limit.
    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn repository(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

#[async_trait]
impl Resolver for GithubRelease {
    fn name(&self) -> &str {
        "github"
    }

    async fn resolve(&self, client: &Client, id: &str) -> Result<ResolvedAsset, ResolveError> {
        let url = format!(
            "{}/repos/{}/{}/releases/latest",
            self.api_base, self.owner, self.repo
        );
        let mut headers = vec![("Accept", "application/vnd.github+json".to_string())];
        if let Some(token) = &self.token {
            headers.push(("Authorization", format!("Bearer {token}")));
        }
        let release: Release = get_ok(client, &url, &headers).await?.json().await?;

        let asset = release
            .assets
            .iter()
            .find(|a| self.pattern.matches(a.file_name()))
            .ok_or_else(|| {
                ResolveError::NoMatch(format!(
                    "{} in {} {}",
                    self.pattern,
                    self.repository(),
                    release.tag_name
                ))
            })?;
        debug!(id, tag = %release.tag_name, asset = asset.file_name(), "resolved via GitHub release");

        Ok(ResolvedAsset {
            url: asset.browser_download_url.clone(),
            filename: asset.file_name().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[test]
    fn test_repository_validation() {
        assert!(GithubRelease::new("termux/termux-x11", "*.apk").is_ok());
        assert!(matches!(
            GithubRelease::new("termux", "*.apk").unwrap_err(),
            ResolveError::Repository(_)
        ));
        assert!(matches!(
            GithubRelease::new("a/b/c", "*.apk").unwrap_err(),
            ResolveError::Repository(_)
        ));
        assert!(matches!(
            GithubRelease::new("a/b", "[").unwrap_err(),
            ResolveError::Pattern { .. }
        ));
    }

    #[tokio::test]
    async fn test_first_matching_asset_wins() {
        let mut server = Server::new_async().await;
        let body = format!(
            r#"{{"tag_name":"nightly","assets":[
                {{"name":"shared.deb","browser_download_url":"{0}/dl/shared.deb"}},
                {{"name":"app-arm64-v8a-debug.apk","browser_download_url":"{0}/dl/app-arm64-v8a-debug.apk"}},
                {{"name":"app-universal-debug.apk","browser_download_url":"{0}/dl/app-universal-debug.apk"}}
            ]}}"#,
            server.url()
        );
        let _m = server
            .mock("GET", "/repos/termux/termux-x11/releases/latest")
            .match_header("accept", "application/vnd.github+json")
            .with_body(body)
            .create_async()
            .await;

        let any_apk = GithubRelease::new("termux/termux-x11", "*.apk")
            .unwrap()
            .with_api_base(server.url());
        let asset = any_apk.resolve(&Client::new(), "com.termux.x11").await.unwrap();
        assert_eq!(asset.filename, "app-arm64-v8a-debug.apk");

        let universal = GithubRelease::new("termux/termux-x11", "*universal*.apk")
            .unwrap()
            .with_api_base(server.url());
        let asset = universal.resolve(&Client::new(), "com.termux.x11").await.unwrap();
        assert_eq!(asset.url, format!("{}/dl/app-universal-debug.apk", server.url()));

        let none = GithubRelease::new("termux/termux-x11", "*.zip")
            .unwrap()
            .with_api_base(server.url());
        assert!(matches!(
            none.resolve(&Client::new(), "com.termux.x11").await.unwrap_err(),
            ResolveError::NoMatch(_)
        ));
    }
}
