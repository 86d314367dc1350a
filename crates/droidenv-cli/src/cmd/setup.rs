//! `droidenv setup`: run every step, or one with `--only`.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use droidenv_core::orchestrator::{AlwaysContinue, ContinuePrompt, RunStatus};
use droidenv_core::{Reporter, summary_path};
use droidenv_schema::Region;
use tracing::warn;

use crate::StepId;
use crate::ops::Context;
use crate::steps;
use crate::ui::{Output, TerminalPrompt};

/// Returns the process exit code: 0 completed, 2 completed with errors, 1 aborted.
pub async fn setup(output: &Output, ctx: &Context, only: Option<StepId>, region: Option<Region>) -> Result<u8> {
    let prompt: Arc<dyn ContinuePrompt> = if ctx.interactive {
        Arc::new(TerminalPrompt::new(output.clone()))
    } else {
        Arc::new(AlwaysContinue)
    };

    let orchestrator = steps::build(ctx, prompt, region);
    if only.is_none() {
        output.section(&format!(
            "Setting up {} steps (about {} min)",
            orchestrator.len(),
            orchestrator.remaining_estimate(0).div_ceil(60)
        ));
    }

    let report = match only {
        Some(id) => orchestrator
            .run_only(id.as_str())
            .await
            .context("Failed to run step")?,
        None => orchestrator.run_all().await,
    };

    let path = summary_path();
    if let Err(e) = report.write_summary(&path) {
        warn!(path = %path.display(), error = %e, "failed to write run summary");
        output.warning(&format!("Could not write {}: {e}", path.display()));
    }

    output.summary(&report.summary());
    match report.status() {
        RunStatus::Completed => output.success("Setup complete"),
        RunStatus::CompletedWithErrors { errors } => {
            output.warning(&format!("Setup finished with {errors} failed step(s)"));
        }
        RunStatus::Aborted { step } => output.error(&format!("Setup aborted after '{step}'")),
    }
    Ok(u8::try_from(report.exit_code()).unwrap_or(1))
}
