//! Companion app acquisition.

use std::path::Path;

use anyhow::Result;
use droidenv_core::Settings;
use droidenv_core::fetch::{AcquireError, AcquiredArtifact, Acquirer, AcquisitionRequest, ApkInspector};
use tracing::debug;

use super::Context;
use crate::apps;

/// Per-app results, in the order the apps were requested.
#[derive(Debug)]
pub struct FetchReport {
    pub results: Vec<(String, Result<AcquiredArtifact, AcquireError>)>,
}

impl FetchReport {
    pub fn acquired(&self) -> impl Iterator<Item = &AcquiredArtifact> {
        self.results.iter().filter_map(|(_, r)| r.as_ref().ok())
    }

    /// Keys of the apps that could not be acquired.
    pub fn failed(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|(_, r)| r.is_err())
            .map(|(key, _)| key.as_str())
            .collect()
    }
}

/// Acquire every app in `keys` into `dest`.
///
/// Unknown keys fail the whole call before any network traffic. Keys naming
/// the same package (`api` and `com.termux.api`) are fetched once.
pub async fn fetch(ctx: &Context, keys: &[String], dest: &Path, min_size: u64) -> Result<FetchReport> {
    let token = std::env::var("GITHUB_TOKEN").ok();
    let (keys, requests): (Vec<String>, Vec<AcquisitionRequest>) =
        requests_for(keys, dest, min_size, &ctx.settings, token.as_deref())?
            .into_iter()
            .unzip();

    ctx.reporter.section(&format!(
        "Fetching {} app{} into {}",
        requests.len(),
        if requests.len() == 1 { "" } else { "s" },
        dest.display()
    ));

    let acquirer = Acquirer::new(ctx.client.clone(), ctx.reporter.clone())
        .with_inspector(ApkInspector)
        .with_retry(ctx.settings.retry)
        .with_attempt_timeout(ctx.settings.download_timeout());
    let results = acquirer
        .acquire_batch(&requests, ctx.settings.download_concurrency)
        .await;

    Ok(FetchReport {
        results: keys.into_iter().zip(results).collect(),
    })
}

/// One request per distinct package id, keyed by the first key that named it.
fn requests_for(
    keys: &[String],
    dest: &Path,
    min_size: u64,
    settings: &Settings,
    github_token: Option<&str>,
) -> Result<Vec<(String, AcquisitionRequest)>> {
    let mut requests: Vec<(String, AcquisitionRequest)> = Vec::with_capacity(keys.len());
    for key in keys {
        let request = apps::request_for(key, dest, min_size, settings, github_token)?;
        if requests.iter().any(|(_, r)| r.id == request.id) {
            debug!(key = %key, id = %request.id, "already requested");
            continue;
        }
        requests.push((key.clone(), request));
    }
    Ok(requests)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(list: &[&str]) -> Vec<String> {
        list.iter().map(|k| (*k).to_string()).collect()
    }

    #[test]
    fn test_same_package_is_requested_once() {
        let requests = requests_for(
            &keys(&["api", "com.termux.api", "widget", "API"]),
            Path::new("/tmp/apks"),
            1,
            &Settings::default(),
            None,
        )
        .unwrap();

        let ids: Vec<(&str, &str)> = requests
            .iter()
            .map(|(key, r)| (key.as_str(), r.id.as_str()))
            .collect();
        assert_eq!(ids, [("api", "com.termux.api"), ("widget", "com.termux.widget")]);
    }

    #[test]
    fn test_unknown_key_fails_everything() {
        let err = requests_for(
            &keys(&["api", "bogus"]),
            Path::new("/tmp/apks"),
            1,
            &Settings::default(),
            None,
        )
        .unwrap_err();
        assert!(err.to_string().contains("bogus"));
    }
}
