use async_trait::async_trait;
use droidenv_core::orchestrator::{StepBody, StepReport};
use droidenv_schema::Region;

use crate::ops::{self, Context};

/// Benchmark mirrors for the region and switch to the fastest.
#[derive(Debug)]
pub struct SelectMirror {
    ctx: Context,
    region: Option<Region>,
}

impl SelectMirror {
    pub fn new(ctx: Context, region: Option<Region>) -> Self {
        Self { ctx, region }
    }
}

#[async_trait]
impl StepBody for SelectMirror {
    async fn run(&self, report: StepReport) -> anyhow::Result<()> {
        let region = ops::mirror::region_for(&self.ctx, self.region);
        let selection = ops::mirror::select(&self.ctx, region).await?;
        let applied = ops::mirror::apply(&self.ctx, &selection).await?;

        let ms = selection.latency.as_millis();
        if applied.changed {
            report.note(format!("switched to {} ({ms}ms)", applied.label));
        } else {
            report.note(format!("already on {} ({ms}ms)", applied.label));
        }
        Ok(())
    }
}
