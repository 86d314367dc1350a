//! `droidenv fetch <app>...`

use std::path::PathBuf;

use anyhow::Result;
use droidenv_core::Reporter;

use crate::ops::{self, Context};
use crate::ui::Output;

/// Returns `true` if every app was acquired.
pub async fn fetch(
    output: &Output,
    ctx: &Context,
    apps: &[String],
    dir: Option<PathBuf>,
    min_size: Option<u64>,
) -> Result<bool> {
    let dest = dir.unwrap_or_else(|| ctx.settings.download_dir_path());
    let min_size = min_size.unwrap_or(ctx.settings.min_apk_size);

    let report = ops::apps::fetch(ctx, apps, &dest, min_size).await?;
    for (key, result) in &report.results {
        if let Err(e) = result {
            output.error(&format!("{key}: {e}"));
        }
    }

    let failed = report.failed();
    if failed.is_empty() {
        output.success(&format!("{} app(s) ready in {}", report.results.len(), dest.display()));
    }
    Ok(failed.is_empty())
}
