//! Core plain-data types shared by the engine and the CLI.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Outcome a step reports once it has run.
///
/// Steps start out as [`StepOutcome::Success`] and may downgrade themselves
/// before they return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepOutcome {
    /// The step did what it was asked to do.
    #[default]
    Success,
    /// The step finished, but something is worth the operator's attention.
    Warning,
    /// The step failed; the orchestrator will ask whether to continue.
    Error,
}

impl StepOutcome {
    /// Lowercase tag used in logs and the summary document.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    /// Returns `true` for [`StepOutcome::Error`].
    pub fn is_error(self) -> bool {
        matches!(self, Self::Error)
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a step as it appears in the persisted summary.
///
/// This is [`StepOutcome`] plus `Skipped` for steps that never started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    /// Ran and succeeded.
    Success,
    /// Ran and finished with a warning.
    Warning,
    /// Ran and failed.
    Error,
    /// Never started (aborted run, or a single-step run).
    Skipped,
}

impl StepStatus {
    /// Lowercase name, matching the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Skipped => "skipped",
        }
    }
}

impl From<StepOutcome> for StepStatus {
    fn from(outcome: StepOutcome) -> Self {
        match outcome {
            StepOutcome::Success => Self::Success,
            StepOutcome::Warning => Self::Warning,
            StepOutcome::Error => Self::Error,
        }
    }
}

/// Coarse geographic bucket used to pick regional mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    /// No regional preference; only official sources are considered.
    #[default]
    Global,
    /// Mainland China.
    China,
    /// Europe.
    Europe,
    /// Asia outside mainland China.
    Asia,
}

impl Region {
    /// All regions, `Global` first.
    pub const ALL: [Region; 4] = [Region::Global, Region::China, Region::Europe, Region::Asia];

    /// Lowercase identifier (`global`, `china`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::China => "china",
            Self::Europe => "europe",
            Self::Asia => "asia",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a region name is not recognised.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown region '{0}' (expected one of: global, china, europe, asia)")]
pub struct ParseRegionError(pub String);

impl FromStr for Region {
    type Err = ParseRegionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "global" | "official" => Ok(Self::Global),
            "china" | "cn" => Ok(Self::China),
            "europe" | "eu" => Ok(Self::Europe),
            "asia" => Ok(Self::Asia),
            other => Err(ParseRegionError(other.to_string())),
        }
    }
}

/// Which group a candidate belongs to. Official candidates are always probed first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Maintained by the upstream project.
    Official,
    /// A community mirror serving one region.
    Regional(Region),
}

/// A URL-addressable package mirror competing to become the active source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Human-readable name shown to the operator.
    pub label: String,
    /// Repository root; domain paths such as `termux-main` are appended to it.
    pub base_url: String,
    /// Official or regional grouping.
    pub tier: Tier,
}

impl Candidate {
    /// Create an official-tier candidate.
    pub fn official(label: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            base_url: normalize_base(base_url.into()),
            tier: Tier::Official,
        }
    }

    /// Create a regional-tier candidate.
    pub fn regional(label: impl Into<String>, base_url: impl Into<String>, region: Region) -> Self {
        Self {
            label: label.into(),
            base_url: normalize_base(base_url.into()),
            tier: Tier::Regional(region),
        }
    }

    /// Returns `true` if this candidate is in the official tier.
    pub fn is_official(&self) -> bool {
        matches!(self.tier, Tier::Official)
    }
}

fn normalize_base(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}
