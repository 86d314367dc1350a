//! Layered configuration: defaults, then `config.toml`, then the environment.
//!
//! CLI flags are applied last by the binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use droidenv_schema::Region;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fetch::fdroid::FDROID_BASE;
use crate::fetch::github::GITHUB_API;
use crate::retry::RetryPolicy;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Tunables for the whole tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Hard deadline for a single mirror probe.
    pub probe_timeout_secs: u64,
    /// Mirror probes in flight at once.
    pub probe_concurrency: usize,
    /// Hard deadline for a single resolve + download attempt.
    pub download_timeout_secs: u64,
    /// Acquisition requests in flight at once.
    pub download_concurrency: usize,
    /// Smallest APK accepted by the verification gate, in bytes.
    pub min_apk_size: u64,
    /// Sources list to manage. Defaults to `$PREFIX/etc/apt/sources.list`.
    pub sources_list: Option<PathBuf>,
    /// Where acquired APKs are committed. Defaults to `~/.droidenv/downloads`.
    pub download_dir: Option<PathBuf>,
    /// Skip region detection and use this region.
    pub region: Option<Region>,
    /// Also manage the X11 repository line.
    pub x11_repo: bool,
    /// Packages installed by the `install-packages` step.
    pub packages: Vec<String>,
    /// Apps (catalog names or package ids) acquired by the `fetch-apps` step.
    pub apps: Vec<String>,
    /// F-Droid repository (or a mirror of it) serving `/api/v1` and `/repo`.
    pub fdroid_url: String,
    /// GitHub REST API root.
    pub github_api_url: String,
    /// Retry schedule for committing a staged artifact.
    pub retry: RetryPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            probe_timeout_secs: 5,
            probe_concurrency: 4,
            download_timeout_secs: 300,
            download_concurrency: 2,
            min_apk_size: 12_288,
            sources_list: None,
            download_dir: None,
            region: None,
            x11_repo: true,
            packages: [
                "git", "curl", "wget", "openssh", "clang", "make", "python", "nodejs",
                "openjdk-17", "gradle",
            ]
            .iter()
            .map(|s| (*s).to_string())
            .collect(),
            apps: ["x11", "api", "widget", "styling"]
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            fdroid_url: FDROID_BASE.to_string(),
            github_api_url: GITHUB_API.to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

impl Settings {
    /// Load from the default location (`~/.droidenv/config.toml`), falling back
    /// to defaults if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self, SettingsError> {
        let path = crate::config_path();
        let mut settings = if path.exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };
        settings.apply_env();
        Ok(settings)
    }

    /// Parse a settings file.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] on I/O or TOML errors.
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns the TOML error for malformed input or unknown keys.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    fn apply_env(&mut self) {
        if let Some(region) = std::env::var("DROIDENV_REGION")
            .ok()
            .and_then(|r| r.parse::<Region>().ok())
        {
            self.region = Some(region);
        }
    }

    /// Sources list path after defaults are applied.
    pub fn sources_list_path(&self) -> PathBuf {
        self.sources_list
            .clone()
            .unwrap_or_else(crate::sources_list_path)
    }

    /// Download directory after defaults are applied.
    pub fn download_dir_path(&self) -> PathBuf {
        self.download_dir.clone().unwrap_or_else(crate::download_dir)
    }

    /// Probe deadline as a [`Duration`] (at least one second).
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs.max(1))
    }

    /// Download deadline as a [`Duration`] (at least one second).
    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let settings = Settings::from_toml(
            r#"
            probe_timeout_secs = 2
            region = "china"

            [retry]
            max_attempts = 5
            "#,
        )
        .unwrap();
        assert_eq!(settings.probe_timeout_secs, 2);
        assert_eq!(settings.region, Some(Region::China));
        assert_eq!(settings.retry.max_attempts, 5);
        assert_eq!(settings.retry.initial_backoff_ms, 500);
        assert_eq!(settings.min_apk_size, 12_288);
        assert!(settings.x11_repo);
        assert_eq!(settings.fdroid_url, "https://f-droid.org");
        assert_eq!(settings.github_api_url, "https://api.github.com");
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(Settings::from_toml("probe_timeout = 2").is_err());
    }

    #[test]
    fn test_timeouts_never_zero() {
        let settings = Settings {
            probe_timeout_secs: 0,
            ..Settings::default()
        };
        assert_eq!(settings.probe_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_from_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "download_concurrency = 'many'").unwrap();
        let err = Settings::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }
}
