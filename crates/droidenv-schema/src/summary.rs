//! The run summary written at the end of every `setup` run.
//!
//! Only operators and diagnostics read this file; the engine never loads it
//! back to make decisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::StepStatus;

/// Per-step line in the summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepSummary {
    /// Stable step identifier (e.g. `select-mirror`).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Final status.
    pub status: StepStatus,
    /// Wall-clock duration in seconds; zero for skipped steps.
    pub duration_secs: f64,
    /// Optional detail reported by the step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Aggregate counts across all steps of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounts {
    /// Number of registered steps.
    pub total: usize,
    /// Steps that succeeded.
    pub success: usize,
    /// Steps that finished with a warning.
    pub warning: usize,
    /// Steps that failed.
    pub error: usize,
    /// Steps that never started.
    pub skipped: usize,
}

impl RunCounts {
    /// Tally a list of step summaries.
    pub fn tally(steps: &[StepSummary]) -> Self {
        let mut counts = Self {
            total: steps.len(),
            ..Self::default()
        };
        for step in steps {
            match step.status {
                StepStatus::Success => counts.success += 1,
                StepStatus::Warning => counts.warning += 1,
                StepStatus::Error => counts.error += 1,
                StepStatus::Skipped => counts.skipped += 1,
            }
        }
        counts
    }
}

/// Document persisted as `last-run.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// When the first step started (or the run was created, if nothing ran).
    pub started_at: DateTime<Utc>,
    /// When the last executed step finished.
    pub finished_at: DateTime<Utc>,
    /// Sum of executed step durations, in seconds.
    pub total_duration_secs: f64,
    /// `true` if the operator declined to continue after a failure.
    pub aborted: bool,
    /// Per-step results in execution order.
    pub steps: Vec<StepSummary>,
    /// Aggregate counts over `steps`.
    pub counts: RunCounts,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(status: StepStatus) -> StepSummary {
        StepSummary {
            id: "x".into(),
            name: "X".into(),
            status,
            duration_secs: 0.0,
            message: None,
        }
    }

    #[test]
    fn test_tally() {
        let steps = vec![
            step(StepStatus::Success),
            step(StepStatus::Error),
            step(StepStatus::Skipped),
            step(StepStatus::Skipped),
        ];
        let counts = RunCounts::tally(&steps);
        assert_eq!(counts.total, 4);
        assert_eq!(counts.success, 1);
        assert_eq!(counts.error, 1);
        assert_eq!(counts.skipped, 2);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&step(StepStatus::Warning)).unwrap();
        assert!(json.contains(r#""status":"warning""#));
        assert!(!json.contains("message"));
    }
}
