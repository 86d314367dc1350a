//! Step orchestrator.
//!
//! Steps are registered once, in order, and executed strictly in that order by
//! a single control flow. Each step body gets a [`StepReport`] handle it can
//! use to downgrade its own outcome; the orchestrator owns the [`Ledger`] and
//! is the only writer of timing data.
//!
//! ```text
//! register() ... register() --[run_all()]--> RunReport { ledger, status }
//! ```
//!
//! A failing step (explicit `fail`, `Err`, or panic) triggers the
//! [`ContinuePrompt`]. Declining cancels every remaining step; the step that
//! just failed has already finished.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use droidenv_schema::{RunSummary, StepOutcome};
use futures::FutureExt;
use thiserror::Error;
use tracing::{info, warn};

use crate::Reporter;
use crate::ledger::{Ledger, StepResult};

/// Lower bound for a step's estimated duration, in seconds.
pub const MIN_ESTIMATE_SECS: u64 = 1;
/// Upper bound for a step's estimated duration, in seconds.
pub const MAX_ESTIMATE_SECS: u64 = 600;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("unknown step '{0}'")]
    UnknownStep(String),
}

/// Handle a step body uses to report its outcome.
///
/// The outcome defaults to success. The last call wins.
#[derive(Debug, Clone, Default)]
pub struct StepReport {
    inner: Arc<Mutex<Reported>>,
}

#[derive(Debug, Default)]
struct Reported {
    outcome: Option<StepOutcome>,
    message: Option<String>,
}

impl StepReport {
    pub fn set(&self, outcome: StepOutcome) {
        self.lock().outcome = Some(outcome);
    }

    /// Finish with a warning.
    pub fn warn(&self, message: impl Into<String>) {
        let mut reported = self.lock();
        reported.outcome = Some(StepOutcome::Warning);
        reported.message = Some(message.into());
    }

    /// Finish with an error without returning `Err`.
    pub fn fail(&self, message: impl Into<String>) {
        let mut reported = self.lock();
        reported.outcome = Some(StepOutcome::Error);
        reported.message = Some(message.into());
    }

    /// Attach a detail line without changing the outcome.
    pub fn note(&self, message: impl Into<String>) {
        self.lock().message = Some(message.into());
    }

    fn take(&self) -> (StepOutcome, Option<String>) {
        let mut reported = self.lock();
        (
            reported.outcome.take().unwrap_or_default(),
            reported.message.take(),
        )
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Reported> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A unit of work registered with the orchestrator.
#[async_trait]
pub trait StepBody: Send + Sync {
    /// Run the step. Returning `Err` records the step as failed.
    async fn run(&self, report: StepReport) -> anyhow::Result<()>;
}

/// Adapter that turns an async closure into a [`StepBody`].
pub struct FnStep<F>(F);

impl<F> std::fmt::Debug for FnStep<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStep").finish_non_exhaustive()
    }
}

/// Wrap `f` so it can be registered as a step.
pub fn step_fn<F, Fut>(f: F) -> FnStep<F>
where
    F: Fn(StepReport) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    FnStep(f)
}

#[async_trait]
impl<F, Fut> StepBody for FnStep<F>
where
    F: Fn(StepReport) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn run(&self, report: StepReport) -> anyhow::Result<()> {
        (self.0)(report).await
    }
}

/// Asked after a step fails: `true` proceeds with the next step.
#[async_trait]
pub trait ContinuePrompt: Send + Sync {
    async fn confirm_continue(&self, step: &str, reason: Option<&str>) -> bool;
}

/// Non-interactive mode: always continue.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysContinue;

#[async_trait]
impl ContinuePrompt for AlwaysContinue {
    async fn confirm_continue(&self, step: &str, _reason: Option<&str>) -> bool {
        info!(step, "continuing after failure (non-interactive)");
        true
    }
}

/// A registered step.
pub struct Step {
    id: String,
    name: String,
    estimate_secs: u64,
    body: Box<dyn StepBody>,
}

impl std::fmt::Debug for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("estimate_secs", &self.estimate_secs)
            .finish_non_exhaustive()
    }
}

impl Step {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn estimate_secs(&self) -> u64 {
        self.estimate_secs
    }
}

/// Percentage of `completed` out of `total`, clamped to `[0, 100]`.
///
/// Integer division keeps it below 100 until every step has completed.
pub fn progress_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    (completed.min(total) * 100 / total) as u8
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// Every step ran and none failed.
    Completed,
    /// Every step ran; the operator continued past `errors` failures.
    CompletedWithErrors { errors: usize },
    /// The operator declined to continue after `step` failed.
    Aborted { step: String },
}

/// Result of a run: the ledger plus how it ended.
#[derive(Debug)]
pub struct RunReport {
    ledger: Ledger,
    aborted_at: Option<String>,
}

impl RunReport {
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn status(&self) -> RunStatus {
        if let Some(step) = &self.aborted_at {
            return RunStatus::Aborted { step: step.clone() };
        }
        match self.ledger.count(StepOutcome::Error) {
            0 => RunStatus::Completed,
            errors => RunStatus::CompletedWithErrors { errors },
        }
    }

    /// Process exit code: 0 completed, 2 completed with errors, 1 aborted.
    pub fn exit_code(&self) -> i32 {
        match self.status() {
            RunStatus::Completed => 0,
            RunStatus::CompletedWithErrors { .. } => 2,
            RunStatus::Aborted { .. } => 1,
        }
    }

    pub fn summary(&self) -> RunSummary {
        self.ledger.summary(self.aborted_at.is_some())
    }

    /// Persist the summary as pretty JSON, atomically.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be written.
    pub fn write_summary(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_vec_pretty(&self.summary()).map_err(std::io::Error::other)?;
        crate::io::atomic::write_atomic(path, &json)
    }
}

/// Owns the ordered step list and the ledger for one run.
pub struct Orchestrator {
    steps: Vec<Step>,
    ledger: Ledger,
    reporter: Arc<dyn Reporter>,
    prompt: Arc<dyn ContinuePrompt>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("steps", &self.steps)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    pub fn new(reporter: Arc<dyn Reporter>, prompt: Arc<dyn ContinuePrompt>) -> Self {
        Self {
            steps: Vec::new(),
            ledger: Ledger::new(),
            reporter,
            prompt,
        }
    }

    /// Append a step. The estimate is clamped into `[1, 600]` seconds.
    ///
    /// Returns the step's index.
    pub fn register(
        &mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        body: impl StepBody + 'static,
        estimated_secs: u64,
    ) -> usize {
        let id = id.into();
        let name = name.into();
        let index = self.ledger.push(id.clone(), name.clone());
        self.steps.push(Step {
            id,
            name,
            estimate_secs: estimated_secs.clamp(MIN_ESTIMATE_SECS, MAX_ESTIMATE_SECS),
            body: Box::new(body),
        });
        index
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Overall progress after `completed` steps.
    pub fn progress(&self, completed: usize) -> u8 {
        progress_percent(completed, self.steps.len())
    }

    /// Sum of estimates for the steps after the first `completed`.
    pub fn remaining_estimate(&self, completed: usize) -> u64 {
        self.steps
            .iter()
            .skip(completed)
            .map(|s| s.estimate_secs)
            .sum()
    }

    /// Execute every step in registration order.
    pub async fn run_all(mut self) -> RunReport {
        let total = self.steps.len();
        info!(total, eta_secs = self.remaining_estimate(0), "starting run");

        let mut aborted_at = None;
        for index in 0..total {
            let outcome = self.execute(index, index, total).await;
            if outcome.is_error() && !self.confirm_continue(index).await {
                warn!(step = %self.steps[index].id, "run aborted by operator");
                aborted_at = Some(self.steps[index].id.clone());
                break;
            }
        }

        RunReport {
            ledger: self.ledger,
            aborted_at,
        }
    }

    /// Execute only the step registered as `id`; every other step is skipped.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::UnknownStep`] if no step has that id.
    pub async fn run_only(mut self, id: &str) -> Result<RunReport, OrchestratorError> {
        let index = self
            .steps
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| OrchestratorError::UnknownStep(id.to_string()))?;

        let outcome = self.execute(index, 0, 1).await;
        let aborted_at = (outcome.is_error() && !self.confirm_continue(index).await)
            .then(|| self.steps[index].id.clone());

        Ok(RunReport {
            ledger: self.ledger,
            aborted_at,
        })
    }

    async fn confirm_continue(&self, index: usize) -> bool {
        let reason = self.ledger.get(index).and_then(StepResult::message);
        self.prompt
            .confirm_continue(&self.steps[index].name, reason)
            .await
    }

    async fn execute(&mut self, index: usize, position: usize, total: usize) -> StepOutcome {
        let step = &self.steps[index];
        self.reporter.step_started(
            position + 1,
            total,
            &step.name,
            step.estimate_secs,
            progress_percent(position, total),
        );
        info!(step = %step.id, estimate_secs = step.estimate_secs, "step started");

        self.ledger.start(index, Utc::now());
        let report = StepReport::default();
        let result = AssertUnwindSafe(step.body.run(report.clone()))
            .catch_unwind()
            .await;
        let (reported, note) = report.take();

        let (outcome, message) = match result {
            Ok(Ok(())) => (reported, note),
            Ok(Err(e)) => (StepOutcome::Error, Some(format!("{e:#}"))),
            Err(panic) => (
                StepOutcome::Error,
                Some(format!("step panicked: {}", panic_message(panic.as_ref()))),
            ),
        };
        if let Some(msg) = &message {
            match outcome {
                StepOutcome::Error => warn!(step = %step.id, "{msg}"),
                _ => info!(step = %step.id, "{msg}"),
            }
        }
        self.ledger.finish(index, Utc::now(), outcome, message);

        let elapsed = self
            .ledger
            .get(index)
            .and_then(StepResult::duration)
            .map_or(0.0, |d| d.num_milliseconds() as f64 / 1000.0);
        info!(step = %step.id, %outcome, elapsed, "step finished");
        self.reporter.step_finished(&step.name, outcome, elapsed);
        outcome
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
