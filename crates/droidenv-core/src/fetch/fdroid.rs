//! F-Droid resolvers: the JSON package API and the package web page.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::debug;

use super::resolver::{ResolveError, ResolvedAsset, Resolver, get_ok};

pub const FDROID_BASE: &str = "https://f-droid.org";

#[derive(Debug, Deserialize)]
struct PackageInfo {
    #[serde(default)]
    packages: Vec<PackageVersion>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageVersion {
    apk_name: Option<String>,
    version_code: Option<u64>,
}

/// `GET {base}/api/v1/packages/{id}`, then `{base}/repo/{apkName}`.
#[derive(Debug, Clone)]
pub struct FdroidApi {
    base: String,
}

impl Default for FdroidApi {
    fn default() -> Self {
        Self::with_base(FDROID_BASE)
    }
}

impl FdroidApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base(base: impl Into<String>) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Resolver for FdroidApi {
    fn name(&self) -> &str {
        "fdroid_api"
    }

    async fn resolve(&self, client: &Client, id: &str) -> Result<ResolvedAsset, ResolveError> {
        let url = format!("{}/api/v1/packages/{id}", self.base);
        let info: PackageInfo = get_ok(client, &url, &[]).await?.json().await?;

        // The first entry is the newest build. Older API responses omit
        // apkName, in which case the repo naming scheme is used.
        let newest = info
            .packages
            .first()
            .ok_or_else(|| ResolveError::Metadata(format!("{id} has no published packages")))?;
        let apk_name = match (&newest.apk_name, newest.version_code) {
            (Some(name), _) => name.clone(),
            (None, Some(code)) => format!("{id}_{code}.apk"),
            (None, None) => {
                return Err(ResolveError::Metadata(format!(
                    "{id}: package entry has neither apkName nor versionCode"
                )));
            }
        };
        debug!(id, apk_name, "resolved via F-Droid API");

        Ok(ResolvedAsset {
            url: format!("{}/repo/{apk_name}", self.base),
            filename: apk_name,
        })
    }
}

static APK_HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<a\s[^>]*?href\s*=\s*["']([^"'#?]+\.apk)["']"#).expect("valid regex")
});

/// Scrape the first `.apk` link from `{base}/packages/{id}/`.
#[derive(Debug, Clone)]
pub struct FdroidHtml {
    base: String,
}

impl Default for FdroidHtml {
    fn default() -> Self {
        Self::with_base(FDROID_BASE)
    }
}

impl FdroidHtml {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base(base: impl Into<String>) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
        }
    }
}

/// First `.apk` anchor in `html`, made absolute against `page`.
fn first_apk_link(page: &Url, html: &str) -> Option<Url> {
    APK_HREF
        .captures_iter(html)
        .filter_map(|c| c.get(1))
        .find_map(|m| page.join(m.as_str()).ok())
}

#[async_trait]
impl Resolver for FdroidHtml {
    fn name(&self) -> &str {
        "fdroid_html"
    }

    async fn resolve(&self, client: &Client, id: &str) -> Result<ResolvedAsset, ResolveError> {
        let page_url = format!("{}/packages/{id}/", self.base);
        let page = Url::parse(&page_url).map_err(|e| ResolveError::Metadata(e.to_string()))?;
        let html = get_ok(client, &page_url, &[]).await?.text().await?;

        let link = first_apk_link(&page, &html)
            .ok_or_else(|| ResolveError::NoMatch(format!("*.apk link on {page_url}")))?;
        debug!(id, url = %link, "resolved via F-Droid page");
        Ok(ResolvedAsset::from_url(link.to_string()))
    }
}
