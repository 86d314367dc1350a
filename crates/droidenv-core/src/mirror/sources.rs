//! The package manager's sources list and the transactional mirror switch.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use droidenv_schema::{Candidate, SourceDomain, SourceLine};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::io::atomic::write_atomic;
use crate::process::{CommandRunner, CommandSpec, ProcessError, ToolProfile};
use crate::Reporter;

/// Serializes every mutation of a sources list in this process.
static SOURCES_LOCK: Mutex<()> = Mutex::const_new(());

#[derive(Error, Debug)]
pub enum SourcesError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum ApplyError {
    #[error("could not back up the sources list: {0}")]
    Snapshot(#[source] SourcesError),

    #[error("could not write the sources list (previous configuration restored): {0}")]
    Write(#[source] SourcesError),

    #[error("index refresh against {label} failed (previous configuration restored): {source}")]
    Verification {
        label: String,
        #[source]
        source: ProcessError,
    },

    #[error("{cause}; restoring the previous configuration also failed: {source}")]
    Restore {
        cause: String,
        #[source]
        source: SourcesError,
    },
}

/// A sources list on disk and the domains droidenv manages in it.
#[derive(Debug, Clone)]
pub struct SourcesFile {
    path: PathBuf,
    domains: Vec<SourceDomain>,
}

impl SourcesFile {
    /// Manage every domain in `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            domains: SourceDomain::ALL.to_vec(),
        }
    }

    /// Restrict the managed domains. Lines for other domains are left alone.
    #[must_use]
    pub fn with_domains(mut self, domains: &[SourceDomain]) -> Self {
        self.domains = SourceDomain::ALL
            .into_iter()
            .filter(|d| domains.contains(d))
            .collect();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn domains(&self) -> &[SourceDomain] {
        &self.domains
    }

    /// Current contents, or `None` if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`SourcesError::Read`] for any I/O error other than not-found.
    pub fn read(&self) -> Result<Option<String>, SourcesError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(SourcesError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Base URL of the active mirror for `domain`, if one is configured.
    ///
    /// # Errors
    ///
    /// Returns [`SourcesError::Read`] if the file cannot be read.
    pub fn current(&self, domain: SourceDomain) -> Result<Option<String>, SourcesError> {
        let Some(text) = self.read()? else {
            return Ok(None);
        };
        Ok(text
            .lines()
            .filter_map(|l| SourceLine::parse(l).ok().flatten())
            .filter_map(|line| domain.base_url_of(&line))
            .last())
    }

    /// Canonical contents with `base_url` active for every managed domain.
    ///
    /// Lines that configure a managed domain are dropped; everything else
    /// (comments, other repositories, unparseable lines) keeps its order.
    /// One line per managed domain is then appended in fixed domain order.
    pub fn render(&self, existing: &str, base_url: &str) -> String {
        let mut kept: Vec<&str> = existing
            .lines()
            .filter(|raw| match SourceLine::parse(raw) {
                Ok(Some(line)) => !self.domains.iter().any(|d| d.owns(&line)),
                _ => true,
            })
            .collect();
        while kept.last().is_some_and(|l| l.trim().is_empty()) {
            kept.pop();
        }

        let mut out = String::new();
        for line in kept {
            out.push_str(line);
            out.push('\n');
        }
        for domain in &self.domains {
            out.push_str(&domain.line_for(base_url).to_string());
            out.push('\n');
        }
        out
    }

    /// Capture the current contents so they can be put back.
    ///
    /// # Errors
    ///
    /// Returns [`SourcesError::Read`] if the file exists but cannot be read.
    pub fn snapshot(&self) -> Result<ConfigSnapshot, SourcesError> {
        let previous = self.read()?;
        debug!(path = %self.path.display(), existed = previous.is_some(), "sources snapshot taken");
        Ok(ConfigSnapshot {
            path: self.path.clone(),
            previous,
        })
    }

    fn write(&self, contents: &str) -> Result<(), SourcesError> {
        write_atomic(&self.path, contents.as_bytes()).map_err(|source| SourcesError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

/// Contents of the sources list taken just before a switch.
#[derive(Debug)]
#[must_use = "a snapshot must be restored or discarded"]
pub struct ConfigSnapshot {
    path: PathBuf,
    previous: Option<String>,
}

impl ConfigSnapshot {
    /// Contents at snapshot time; `None` if the file did not exist.
    pub fn previous(&self) -> Option<&str> {
        self.previous.as_deref()
    }

    /// Put the file back exactly as it was, removing it if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns [`SourcesError::Write`] if the previous state cannot be restored.
    pub fn restore(self) -> Result<(), SourcesError> {
        let result = match &self.previous {
            Some(text) => write_atomic(&self.path, text.as_bytes()),
            None => match std::fs::remove_file(&self.path) {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
                _ => Ok(()),
            },
        };
        info!(path = %self.path.display(), "sources list restored");
        result.map_err(|source| SourcesError::Write {
            path: self.path,
            source,
        })
    }

    /// Drop the snapshot once the new configuration is confirmed.
    pub fn discard(self) {
        debug!(path = %self.path.display(), "sources snapshot discarded");
    }
}

/// Light check that the package manager can use the active configuration.
#[async_trait]
pub trait IndexRefresher: Send + Sync {
    async fn refresh(&self) -> Result<(), ProcessError>;
}

/// Runs `apt update` (or `pkg update` when apt is not on `PATH`).
pub struct PackageIndexRefresher {
    runner: Arc<dyn CommandRunner>,
    program: PathBuf,
    timeout: Duration,
}

impl PackageIndexRefresher {
    pub fn new(runner: Arc<dyn CommandRunner>, program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            runner,
            program: program.into(),
            timeout,
        }
    }

    /// Locate `apt`, then `pkg`, on `PATH`.
    pub fn detect(runner: Arc<dyn CommandRunner>, timeout: Duration) -> Option<Self> {
        ["apt", "pkg"]
            .iter()
            .find_map(|name| which::which(name).ok())
            .map(|program| Self::new(runner, program, timeout))
    }
}

#[async_trait]
impl IndexRefresher for PackageIndexRefresher {
    async fn refresh(&self) -> Result<(), ProcessError> {
        let program = self.program.to_string_lossy().into_owned();
        // apt signals fetch failures with exit 100, so the generic profile is
        // used here and stderr is inspected as well.
        let spec = CommandSpec::new(program.clone())
            .args(["update"])
            .env("DEBIAN_FRONTEND", "noninteractive")
            .timeout(self.timeout)
            .profile(ToolProfile::GENERIC);
        let output = self.runner.run(&spec).await?;

        let failures: Vec<&str> = output
            .stderr
            .lines()
            .filter(|l| l.starts_with("E:") || l.contains("Failed to fetch"))
            .collect();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(ProcessError::Failed {
                program,
                code: output.code,
                stderr: failures.join("\n"),
            })
        }
    }
}

/// Outcome of a successful switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    /// Label of the now-active candidate, for display.
    pub label: String,
    pub base_url: String,
    /// Whether the file contents changed.
    pub changed: bool,
}

/// Switch the sources list to `candidate` and keep it only if the index
/// refresh succeeds.
///
/// The whole snapshot, write, refresh and restore/discard sequence runs while
/// holding a process-wide lock, so concurrent callers are serialized. Applying
/// the same candidate twice yields byte-identical contents.
///
/// The refresh runs exactly once. A failure against the new mirror is a reason
/// to roll back, not to hit the same endpoint again.
///
/// # Errors
///
/// Returns [`ApplyError`] if the snapshot, write or refresh fails. In every
/// case except [`ApplyError::Snapshot`] and [`ApplyError::Restore`] the file
/// has been put back to its previous contents.
pub async fn apply_and_verify<F, R>(
    file: &SourcesFile,
    candidate: &Candidate,
    refresher: &F,
    reporter: &R,
) -> Result<Applied, ApplyError>
where
    F: IndexRefresher + ?Sized,
    R: Reporter + ?Sized,
{
    let _guard = SOURCES_LOCK.lock().await;

    let snapshot = file.snapshot().map_err(ApplyError::Snapshot)?;
    let contents = file.render(snapshot.previous().unwrap_or_default(), &candidate.base_url);
    let changed = snapshot.previous() != Some(contents.as_str());

    if let Err(e) = file.write(&contents) {
        warn!(error = %e, "sources write failed, restoring");
        let cause = e.to_string();
        return Err(match snapshot.restore() {
            Ok(()) => ApplyError::Write(e),
            Err(source) => ApplyError::Restore { cause, source },
        });
    }
    info!(label = %candidate.label, changed, "sources list written, refreshing index");
    reporter.info(&format!("Refreshing package index from {}", candidate.label));

    match refresher.refresh().await {
        Ok(()) => {
            snapshot.discard();
            Ok(Applied {
                label: candidate.label.clone(),
                base_url: candidate.base_url.clone(),
                changed,
            })
        }
        Err(source) => {
            warn!(label = %candidate.label, error = %source, "index refresh failed, restoring");
            let cause = format!("index refresh against {} failed: {source}", candidate.label);
            match snapshot.restore() {
                Ok(()) => Err(ApplyError::Verification {
                    label: candidate.label.clone(),
                    source,
                }),
                Err(restore) => Err(ApplyError::Restore {
                    cause,
                    source: restore,
                }),
            }
        }
    }
}
