use async_trait::async_trait;
use droidenv_core::orchestrator::{StepBody, StepReport};

use crate::ops::{self, Context};

/// Acquire the configured companion apps.
///
/// Partial success is a warning; the step fails only if nothing was acquired.
#[derive(Debug)]
pub struct FetchApps {
    ctx: Context,
}

impl FetchApps {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl StepBody for FetchApps {
    async fn run(&self, report: StepReport) -> anyhow::Result<()> {
        let apps = &self.ctx.settings.apps;
        if apps.is_empty() {
            report.note("no apps configured");
            return Ok(());
        }

        let dest = self.ctx.settings.download_dir_path();
        let fetched =
            ops::apps::fetch(&self.ctx, apps, &dest, self.ctx.settings.min_apk_size).await?;

        let acquired = fetched.acquired().count();
        let failed = fetched.failed();
        match (acquired, failed.len()) {
            (_, 0) => report.note(format!("{acquired} apps in {}", dest.display())),
            (0, _) => anyhow::bail!("no app could be acquired ({})", failed.join(", ")),
            (_, n) => report.warn(format!(
                "{acquired} of {} apps acquired; failed: {}",
                acquired + n,
                failed.join(", ")
            )),
        }
        Ok(())
    }
}
