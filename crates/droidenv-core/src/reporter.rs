//! Reporter trait for dependency injection
//!
//! This trait allows core logic to report progress and status without
//! being coupled to a specific terminal implementation.

use std::time::Duration;

use droidenv_schema::{RunSummary, StepOutcome};

pub trait Reporter: Send + Sync {
    /// Indicates a new section or phase has started (e.g. "Selecting mirror").
    fn section(&self, title: &str);

    /// A step is about to run. `percent` is the overall progress before it starts.
    fn step_started(&self, position: usize, total: usize, name: &str, estimate_secs: u64, percent: u8);

    /// A step has returned and its outcome is recorded.
    fn step_finished(&self, name: &str, outcome: StepOutcome, elapsed_secs: f64);

    /// A mirror probe finished. `latency` is `None` when the probe failed.
    fn probed(&self, label: &str, latency: Option<Duration>);

    /// Updates the progress of a download.
    fn downloading(&self, id: &str, current: u64, total: Option<u64>);

    /// Marks an acquisition as successfully completed.
    fn done(&self, id: &str, detail: &str, size: Option<u64>);

    /// Marks an acquisition as failed with a specific reason.
    fn failed(&self, id: &str, reason: &str);

    /// Log an informational message.
    fn info(&self, msg: &str);

    /// Log a success message.
    fn success(&self, msg: &str);

    /// Log a warning message.
    fn warning(&self, msg: &str);

    /// Log an error message.
    fn error(&self, msg: &str);

    /// Display the final summary of a run.
    fn summary(&self, summary: &RunSummary);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn section(&self, title: &str) {
        (**self).section(title);
    }
    fn step_started(&self, position: usize, total: usize, name: &str, estimate_secs: u64, percent: u8) {
        (**self).step_started(position, total, name, estimate_secs, percent);
    }
    fn step_finished(&self, name: &str, outcome: StepOutcome, elapsed_secs: f64) {
        (**self).step_finished(name, outcome, elapsed_secs);
    }
    fn probed(&self, label: &str, latency: Option<Duration>) {
        (**self).probed(label, latency);
    }
    fn downloading(&self, id: &str, current: u64, total: Option<u64>) {
        (**self).downloading(id, current, total);
    }
    fn done(&self, id: &str, detail: &str, size: Option<u64>) {
        (**self).done(id, detail, size);
    }
    fn failed(&self, id: &str, reason: &str) {
        (**self).failed(id, reason);
    }
    fn info(&self, msg: &str) {
        (**self).info(msg);
    }
    fn success(&self, msg: &str) {
        (**self).success(msg);
    }
    fn warning(&self, msg: &str) {
        (**self).warning(msg);
    }
    fn error(&self, msg: &str) {
        (**self).error(msg);
    }
    fn summary(&self, summary: &RunSummary) {
        (**self).summary(summary);
    }
}

/// A no-op reporter for silent operations (e.g., testing).
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn section(&self, _: &str) {}
    fn step_started(&self, _: usize, _: usize, _: &str, _: u64, _: u8) {}
    fn step_finished(&self, _: &str, _: StepOutcome, _: f64) {}
    fn probed(&self, _: &str, _: Option<Duration>) {}
    fn downloading(&self, _: &str, _: u64, _: Option<u64>) {}
    fn done(&self, _: &str, _: &str, _: Option<u64>) {}
    fn failed(&self, _: &str, _: &str) {}
    fn info(&self, _: &str) {}
    fn success(&self, _: &str) {}
    fn warning(&self, _: &str) {}
    fn error(&self, _: &str) {}
    fn summary(&self, _: &RunSummary) {}
}
