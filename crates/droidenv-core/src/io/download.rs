//! Streaming download into an already-open staging file.
//!
//! Handles file downloads with streaming SHA256 and progress reporting. The
//! caller owns the staging file and decides whether it is ever committed.

use std::io::Write;

use futures::StreamExt;
use reqwest::Client;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::io::AsyncWriteExt;

use crate::Reporter;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// What was written to the staging file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedBytes {
    /// Bytes written.
    pub size: u64,
    /// Lowercase hex SHA-256 of the body.
    pub sha256: String,
    /// `Content-Type` header, if the server sent one.
    pub content_type: Option<String>,
}

/// GET `url` and stream the body into `file`.
///
/// Non-2xx responses are errors. The file is flushed and synced before
/// returning so a subsequent rename publishes complete contents.
///
/// # Errors
///
/// Returns [`DownloadError`] on connection, status or write failures. Whatever
/// was written so far stays in `file`; the caller discards it.
pub async fn download_to_file<R: Reporter + ?Sized>(
    client: &Client,
    url: &str,
    file: std::fs::File,
    id: &str,
    reporter: &R,
) -> Result<StagedBytes, DownloadError> {
    let response = client
        .get(url)
        .header(reqwest::header::USER_AGENT, crate::USER_AGENT)
        .send()
        .await?
        .error_for_status()?;

    let total_size = response.content_length();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    reporter.downloading(id, 0, total_size);

    let mut file = tokio::fs::File::from_std(file);
    let mut stream = response.bytes_stream();
    let mut hasher = Sha256::new();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        hasher.write_all(&chunk)?;
        downloaded += chunk.len() as u64;
        reporter.downloading(id, downloaded, total_size);
    }

    file.flush().await?;
    file.sync_all().await?;

    Ok(StagedBytes {
        size: downloaded,
        sha256: hex::encode(hasher.finalize()),
        content_type,
    })
}
