//! Fallback acquisition: try resolvers in order until one yields a verified file.
//!
//! Each attempt streams into a private `.{id}.XXXX.part` file next to the
//! destination. The staging file is removed whenever an attempt fails, and
//! only a file that passed the [`VerificationGate`] is renamed to its final
//! name.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use reqwest::Client;
use serde::Serialize;
use tempfile::{NamedTempFile, TempPath};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::resolver::{ResolveError, Resolver};
use super::verify::{ContentInspector, VerificationGate, VerifyError};
use crate::io::download::{DownloadError, download_to_file};
use crate::{Reporter, RetryPolicy};

/// What to fetch and where to put it.
#[derive(Clone)]
pub struct AcquisitionRequest {
    pub id: String,
    /// Tried strictly in order.
    pub resolvers: Vec<Arc<dyn Resolver>>,
    pub dest_dir: PathBuf,
    /// Smallest acceptable file, in bytes.
    pub min_size: u64,
    /// Final file name. Defaults to `{id}.apk`.
    pub file_name: Option<String>,
}

impl fmt::Debug for AcquisitionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let resolvers: Vec<&str> = self.resolvers.iter().map(|r| r.name()).collect();
        f.debug_struct("AcquisitionRequest")
            .field("id", &self.id)
            .field("resolvers", &resolvers)
            .field("dest_dir", &self.dest_dir)
            .field("min_size", &self.min_size)
            .field("file_name", &self.file_name)
            .finish()
    }
}

impl AcquisitionRequest {
    pub fn new(id: impl Into<String>, dest_dir: impl Into<PathBuf>, min_size: u64) -> Self {
        Self {
            id: id.into(),
            resolvers: Vec::new(),
            dest_dir: dest_dir.into(),
            min_size,
            file_name: None,
        }
    }

    #[must_use]
    pub fn resolver(mut self, resolver: impl Resolver + 'static) -> Self {
        self.resolvers.push(Arc::new(resolver));
        self
    }

    #[must_use]
    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    pub fn final_path(&self) -> PathBuf {
        let name = self
            .file_name
            .clone()
            .unwrap_or_else(|| format!("{}.apk", self.id));
        self.dest_dir.join(name)
    }
}

/// A verified, committed artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AcquiredArtifact {
    pub id: String,
    pub path: PathBuf,
    pub size: u64,
    pub sha256: String,
    /// Name of the resolver that produced it.
    pub source: String,
    pub url: String,
}

/// Where in an attempt a resolver failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptStage {
    Resolve,
    Download,
    Timeout,
    Verify,
    Commit,
}

impl fmt::Display for AttemptStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Resolve => "resolve",
            Self::Download => "download",
            Self::Timeout => "timeout",
            Self::Verify => "verify",
            Self::Commit => "commit",
        })
    }
}

/// One failed resolver attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverFailure {
    pub resolver: String,
    pub stage: AttemptStage,
    pub reason: String,
}

impl fmt::Display for ResolverFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.resolver, self.stage, self.reason)
    }
}

#[derive(Error, Debug)]
pub enum AcquireError {
    #[error("no resolvers configured for {0}")]
    NoResolvers(String),

    #[error("cannot stage downloads in {path}: {source}")]
    Staging {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("all sources failed for {id}: {}", join_failures(.failures))]
    Exhausted {
        id: String,
        failures: Vec<ResolverFailure>,
    },
}

fn join_failures(failures: &[ResolverFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Error, Debug)]
enum AttemptError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error("no result within {}s", .0.as_secs())]
    TimedOut(Duration),

    #[error(transparent)]
    Verify(#[from] VerifyError),

    #[error("rename failed: {0}")]
    Commit(std::io::Error),
}

impl AttemptError {
    fn stage(&self) -> AttemptStage {
        match self {
            Self::Resolve(_) => AttemptStage::Resolve,
            Self::Download(_) => AttemptStage::Download,
            Self::TimedOut(_) => AttemptStage::Timeout,
            Self::Verify(_) => AttemptStage::Verify,
            Self::Commit(_) => AttemptStage::Commit,
        }
    }
}

/// Runs acquisition requests against a shared client.
#[derive(Clone)]
pub struct Acquirer {
    client: Client,
    reporter: Arc<dyn Reporter>,
    inspector: Option<Arc<dyn ContentInspector>>,
    retry: RetryPolicy,
    attempt_timeout: Duration,
}

impl Acquirer {
    pub fn new(client: Client, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            client,
            reporter,
            inspector: None,
            retry: RetryPolicy::default(),
            attempt_timeout: Duration::from_secs(300),
        }
    }

    /// Content check applied after the size checks.
    #[must_use]
    pub fn with_inspector(mut self, inspector: impl ContentInspector + 'static) -> Self {
        self.inspector = Some(Arc::new(inspector));
        self
    }

    /// Retry schedule for the final rename.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Deadline for one resolver's resolve + download.
    #[must_use]
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// Acquire one artifact, falling through the request's resolvers in order.
    ///
    /// # Errors
    ///
    /// Returns [`AcquireError::Exhausted`] with every resolver's failure when
    /// none produced a verified file.
    pub async fn acquire(&self, request: &AcquisitionRequest) -> Result<AcquiredArtifact, AcquireError> {
        let id = request.id.as_str();
        if request.resolvers.is_empty() {
            return Err(AcquireError::NoResolvers(request.id.clone()));
        }
        std::fs::create_dir_all(&request.dest_dir).map_err(|source| AcquireError::Staging {
            path: request.dest_dir.clone(),
            source,
        })?;

        let gate = VerificationGate::new(request.min_size).with_inspector(self.inspector.clone());
        let final_path = request.final_path();
        let mut failures = Vec::new();

        for resolver in &request.resolvers {
            debug!(id, resolver = resolver.name(), "trying");
            let staged = tempfile::Builder::new()
                .prefix(&format!(".{id}."))
                .suffix(".part")
                .tempfile_in(&request.dest_dir)
                .map_err(|source| AcquireError::Staging {
                    path: request.dest_dir.clone(),
                    source,
                })?;

            match self
                .attempt(resolver.as_ref(), id, staged, &gate, &final_path)
                .await
            {
                Ok(artifact) => {
                    info!(id, source = %artifact.source, size = artifact.size, path = %artifact.path.display(), "acquired");
                    self.reporter.done(
                        id,
                        &format!("via {}", artifact.source),
                        Some(artifact.size),
                    );
                    return Ok(artifact);
                }
                Err(e) => {
                    warn!(id, resolver = resolver.name(), stage = %e.stage(), error = %e, "attempt failed");
                    failures.push(ResolverFailure {
                        resolver: resolver.name().to_string(),
                        stage: e.stage(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let err = AcquireError::Exhausted {
            id: request.id.clone(),
            failures,
        };
        warn!(id, "exhausted");
        self.reporter.failed(id, &err.to_string());
        Err(err)
    }

    /// Acquire many artifacts, at most `concurrency` at a time. Results are in
    /// request order regardless of completion order.
    pub async fn acquire_batch(
        &self,
        requests: &[AcquisitionRequest],
        concurrency: usize,
    ) -> Vec<Result<AcquiredArtifact, AcquireError>> {
        let mut results: Vec<(usize, Result<AcquiredArtifact, AcquireError>)> =
            futures::stream::iter(requests.iter().cloned().enumerate())
                .map(|(i, request)| async move { (i, self.acquire(&request).await) })
                .buffer_unordered(concurrency.max(1))
                .collect()
                .await;
        results.sort_by_key(|(i, _)| *i);
        results.into_iter().map(|(_, r)| r).collect()
    }

    /// One resolver: resolve, download into `staged`, verify, commit.
    ///
    /// `staged` is consumed; on any failure it is dropped, which deletes it.
    async fn attempt(
        &self,
        resolver: &dyn Resolver,
        id: &str,
        staged: NamedTempFile,
        gate: &VerificationGate,
        final_path: &Path,
    ) -> Result<AcquiredArtifact, AttemptError> {
        let fetch = async {
            let asset = resolver.resolve(&self.client, id).await?;
            debug!(id, url = %asset.url, "downloading");
            let file = staged.as_file().try_clone().map_err(DownloadError::Io)?;
            let bytes =
                download_to_file(&self.client, &asset.url, file, id, self.reporter.as_ref()).await?;
            Ok::<_, AttemptError>((asset, bytes))
        };
        let (asset, bytes) = tokio::time::timeout(self.attempt_timeout, fetch)
            .await
            .map_err(|_| AttemptError::TimedOut(self.attempt_timeout))??;

        debug!(id, size = bytes.size, "verifying");
        let staged = staged.into_temp_path();
        let size = {
            let gate = gate.clone();
            let path = staged.to_path_buf();
            let content_type = bytes.content_type.clone();
            tokio::task::spawn_blocking(move || gate.check(&path, content_type.as_deref()))
                .await
                .map_err(|e| VerifyError::Io(std::io::Error::other(e)))??
        };

        self.commit(staged, final_path).await?;

        Ok(AcquiredArtifact {
            id: id.to_string(),
            path: final_path.to_path_buf(),
            size,
            sha256: bytes.sha256,
            source: resolver.name().to_string(),
            url: asset.url,
        })
    }

    /// Rename the staged file over `final_path`, retrying per the policy.
    async fn commit(&self, staged: TempPath, final_path: &Path) -> Result<(), AttemptError> {
        let mut pending = Some(staged);
        self.retry
            .retry("commit", |_| {
                let result = match pending.take() {
                    Some(path) => path.persist(final_path).map_err(|e| {
                        pending = Some(e.path);
                        e.error
                    }),
                    None => Err(std::io::Error::other("staging file already consumed")),
                };
                std::future::ready(result)
            })
            .await
            .map_err(AttemptError::Commit)
    }
}
