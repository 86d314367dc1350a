//! Timing/status ledger.
//!
//! One entry per registered step, keyed by registration index. Only the
//! orchestrator writes entries; step bodies report an outcome through
//! [`StepReport`](crate::orchestrator::StepReport) and never see the ledger.

use chrono::{DateTime, TimeDelta, Utc};
use droidenv_schema::{RunCounts, RunSummary, StepOutcome, StepStatus, StepSummary};

/// Timing and outcome of a single step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    /// Step identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    outcome: StepOutcome,
    message: Option<String>,
}

impl StepResult {
    fn pending(id: String, name: String) -> Self {
        Self {
            id,
            name,
            started_at: None,
            finished_at: None,
            outcome: StepOutcome::Success,
            message: None,
        }
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Outcome recorded for the step. Meaningful only once [`is_finished`](Self::is_finished).
    pub fn outcome(&self) -> StepOutcome {
        self.outcome
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    /// `finished_at - started_at` when both are recorded.
    pub fn duration(&self) -> Option<TimeDelta> {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }

    /// Summary status; steps that never started are `Skipped`.
    pub fn status(&self) -> StepStatus {
        if self.is_finished() {
            self.outcome.into()
        } else {
            StepStatus::Skipped
        }
    }

    fn duration_secs(&self) -> f64 {
        self.duration()
            .map_or(0.0, |d| d.num_milliseconds() as f64 / 1000.0)
    }
}

/// Ordered record of every step in a run.
#[derive(Debug, Clone)]
pub struct Ledger {
    created_at: DateTime<Utc>,
    entries: Vec<StepResult>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            created_at: Utc::now(),
            entries: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, id: String, name: String) -> usize {
        self.entries.push(StepResult::pending(id, name));
        self.entries.len() - 1
    }

    pub(crate) fn start(&mut self, index: usize, at: DateTime<Utc>) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.started_at = Some(at);
            entry.finished_at = None;
        }
    }

    /// Record completion. The end time is clamped so the duration is never negative,
    /// even if the wall clock stepped backwards while the step ran.
    pub(crate) fn finish(
        &mut self,
        index: usize,
        at: DateTime<Utc>,
        outcome: StepOutcome,
        message: Option<String>,
    ) {
        if let Some(entry) = self.entries.get_mut(index) {
            let start = *entry.started_at.get_or_insert(at);
            entry.finished_at = Some(at.max(start));
            entry.outcome = outcome;
            entry.message = message;
        }
    }

    pub fn get(&self, index: usize) -> Option<&StepResult> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[StepResult] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, outcome: StepOutcome) -> usize {
        self.entries
            .iter()
            .filter(|e| e.is_finished() && e.outcome == outcome)
            .count()
    }

    /// Build the persisted summary document.
    pub fn summary(&self, aborted: bool) -> RunSummary {
        let steps: Vec<StepSummary> = self
            .entries
            .iter()
            .map(|e| StepSummary {
                id: e.id.clone(),
                name: e.name.clone(),
                status: e.status(),
                duration_secs: e.duration_secs(),
                message: e.message.clone(),
            })
            .collect();

        let started_at = self
            .entries
            .iter()
            .filter_map(StepResult::started_at)
            .min()
            .unwrap_or(self.created_at);
        let finished_at = self
            .entries
            .iter()
            .filter_map(StepResult::finished_at)
            .max()
            .unwrap_or(started_at);

        RunSummary {
            started_at,
            finished_at,
            total_duration_secs: steps.iter().map(|s| s.duration_secs).sum(),
            aborted,
            counts: RunCounts::tally(&steps),
            steps,
        }
    }
}
