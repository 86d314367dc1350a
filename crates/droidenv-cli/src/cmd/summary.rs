//! `droidenv summary`: show the last setup run.

use anyhow::{Context as _, Result};
use droidenv_core::{Reporter, summary_path};
use droidenv_schema::RunSummary;

use crate::ui::Output;

pub fn summary(output: &Output, json: bool) -> Result<()> {
    let path = summary_path();
    if !path.exists() {
        anyhow::bail!("No setup run recorded yet ({} not found)", path.display());
    }
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    if json {
        println!("{}", text.trim_end());
        return Ok(());
    }

    let summary: RunSummary = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    output.info(&format!(
        "Run started {}",
        summary.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    output.summary(&summary);
    Ok(())
}
