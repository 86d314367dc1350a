//! Mirror selection and switching.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use droidenv_core::mirror::{
    Applied, HttpProber, LocaleSignals, PackageIndexRefresher, Selection, SourcesFile,
    apply_and_verify, candidates_for, detect_region, select_best,
};
use droidenv_schema::{Region, SourceDomain};
use tracing::info;

use super::Context;

/// Deadline for the `apt update` run that verifies a switch.
const REFRESH_TIMEOUT: Duration = Duration::from_secs(180);

/// Region from the command line, then settings, then the locale.
pub fn region_for(ctx: &Context, requested: Option<Region>) -> Region {
    if let Some(region) = requested.or(ctx.settings.region) {
        return region;
    }
    let signals = LocaleSignals::from_env();
    let region = detect_region(&signals);
    info!(?signals, %region, "detected region");
    region
}

/// The managed sources list, honoring the `x11_repo` setting.
pub fn sources_file(ctx: &Context) -> SourcesFile {
    let file = SourcesFile::new(ctx.settings.sources_list_path());
    if ctx.settings.x11_repo {
        file
    } else {
        file.with_domains(&[SourceDomain::Main])
    }
}

/// Benchmark the region's candidates and return the fastest responder.
pub async fn select(ctx: &Context, region: Region) -> Result<Selection> {
    let candidates = candidates_for(region);
    ctx.reporter.section(&format!(
        "Probing {} mirrors ({region})",
        candidates.len()
    ));

    let prober = HttpProber::new(ctx.client.clone());
    let selection = select_best(
        &prober,
        &candidates,
        ctx.settings.probe_timeout(),
        ctx.settings.probe_concurrency,
        ctx.reporter.as_ref(),
    )
    .await?;
    Ok(selection)
}

/// Switch the sources list to `selection.best`, verified by an index refresh.
pub async fn apply(ctx: &Context, selection: &Selection) -> Result<Applied> {
    let refresher = PackageIndexRefresher::detect(Arc::clone(&ctx.runner), REFRESH_TIMEOUT)
        .context("neither apt nor pkg found on PATH; is this Termux?")?;
    let file = sources_file(ctx);

    let applied = apply_and_verify(
        &file,
        &selection.best,
        &refresher,
        ctx.reporter.as_ref(),
    )
    .await
    .with_context(|| format!("Failed to switch to {}", selection.best.label))?;
    Ok(applied)
}

/// The sources list `apply` would write, without touching the file.
pub fn preview(ctx: &Context, selection: &Selection) -> Result<String> {
    let file = sources_file(ctx);
    let existing = file.read()?.unwrap_or_default();
    Ok(file.render(&existing, &selection.best.base_url))
}

/// Label of the catalog entry (or the raw URL) the main domain points at.
pub fn current(ctx: &Context) -> Result<Option<String>> {
    let file = sources_file(ctx);
    let Some(base) = file.current(SourceDomain::Main)? else {
        return Ok(None);
    };
    let label = droidenv_core::mirror::all_candidates()
        .into_iter()
        .find(|c| c.base_url.trim_end_matches('/') == base.trim_end_matches('/'))
        .map_or_else(|| base.clone(), |c| format!("{} ({base})", c.label));
    Ok(Some(label))
}

#[cfg(test)]
mod tests {
    use super::*;
    use droidenv_core::NullReporter;
    use droidenv_core::Settings;
    use droidenv_core::process::SystemRunner;

    fn context(sources: &std::path::Path, x11: bool) -> Context {
        let settings = Settings {
            sources_list: Some(sources.to_path_buf()),
            x11_repo: x11,
            region: Some(Region::Europe),
            ..Settings::default()
        };
        Context::new(settings, Arc::new(NullReporter), Arc::new(SystemRunner), false).unwrap()
    }

    #[test]
    fn test_region_prefers_explicit_request() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir.path().join("sources.list"), true);
        assert_eq!(region_for(&ctx, Some(Region::China)), Region::China);
        assert_eq!(region_for(&ctx, None), Region::Europe);
    }

    #[test]
    fn test_current_names_known_mirror() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sources.list");
        let ctx = context(&path, true);
        assert_eq!(current(&ctx).unwrap(), None);

        let official = &candidates_for(Region::Global)[0];
        let text = SourceDomain::Main.line_for(&official.base_url).to_string();
        std::fs::write(&path, format!("{text}\n")).unwrap();
        let label = current(&ctx).unwrap().unwrap();
        assert!(label.starts_with(&official.label));
    }

    #[test]
    fn test_preview_without_x11() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sources.list");
        std::fs::write(&path, "# keep me\n").unwrap();
        let ctx = context(&path, false);

        let best = droidenv_schema::Candidate::official("M", "https://m.example/apt");
        let selection = Selection {
            best,
            latency: Duration::from_millis(10),
            outcomes: Vec::new(),
        };
        let rendered = preview(&ctx, &selection).unwrap();
        assert_eq!(
            rendered,
            "# keep me\ndeb https://m.example/apt/termux-main stable main\n"
        );
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# keep me\n");
    }
}
