//! The resolver seam: turn a logical app id into a downloadable URL.

use async_trait::async_trait;
use reqwest::{Client, Response};
use thiserror::Error;

use crate::paths::filename_from_url;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("unusable metadata: {0}")]
    Metadata(String),

    #[error("no asset matched '{0}'")]
    NoMatch(String),

    #[error("invalid asset pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        source: glob::PatternError,
    },

    #[error("invalid repository '{0}' (expected owner/repo)")]
    Repository(String),
}

/// A concrete download location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub url: String,
    /// File name as published upstream.
    pub filename: String,
}

impl ResolvedAsset {
    /// Use the last path segment of `url` as the file name.
    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        let filename = filename_from_url(&url).to_string();
        Self { url, filename }
    }
}

/// One way of locating an artifact.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Short name recorded as the source of an acquired artifact.
    fn name(&self) -> &str;

    /// Resolve `id` to a download URL. Performs metadata requests only.
    async fn resolve(&self, client: &Client, id: &str) -> Result<ResolvedAsset, ResolveError>;
}

/// A fixed URL, for artifacts with a stable download location.
#[derive(Debug, Clone)]
pub struct DirectUrl {
    url: String,
}

impl DirectUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl Resolver for DirectUrl {
    fn name(&self) -> &str {
        "direct"
    }

    async fn resolve(&self, _client: &Client, _id: &str) -> Result<ResolvedAsset, ResolveError> {
        Ok(ResolvedAsset::from_url(self.url.clone()))
    }
}

/// GET `url` and fail on non-success statuses.
pub(crate) async fn get_ok(
    client: &Client,
    url: &str,
    headers: &[(&str, String)],
) -> Result<Response, ResolveError> {
    let mut request = client
        .get(url)
        .header(reqwest::header::USER_AGENT, crate::USER_AGENT);
    for (name, value) in headers {
        request = request.header(*name, value);
    }
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ResolveError::Status {
            url: url.to_string(),
            status,
        });
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_direct_url() {
        let asset = DirectUrl::new("https://example.com/dl/app.apk?x=1")
            .resolve(&Client::new(), "ignored")
            .await
            .unwrap();
        assert_eq!(asset.filename, "app.apk");
        assert_eq!(asset.url, "https://example.com/dl/app.apk?x=1");
    }
}
