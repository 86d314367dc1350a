//! `droidenv mirror list|current|select`.

use anyhow::Result;
use comfy_table::{Table, presets};
use droidenv_core::Reporter;
use droidenv_core::mirror::candidates_for;
use droidenv_schema::{Region, Tier};

use crate::ops::{self, Context};
use crate::ui::Output;

pub fn list(ctx: &Context, region: Option<Region>) {
    let region = ops::mirror::region_for(ctx, region);

    let mut table = Table::new();
    table.load_preset(presets::NOTHING);
    table.set_header(vec!["LABEL", "TIER", "URL"]);
    for candidate in candidates_for(region) {
        let tier = match candidate.tier {
            Tier::Official => "official".to_string(),
            Tier::Regional(r) => r.to_string(),
        };
        table.add_row(vec![candidate.label, tier, candidate.base_url]);
    }
    println!("Candidates for region '{region}':");
    println!();
    println!("{table}");
}

pub fn current(ctx: &Context) -> Result<()> {
    let file = ops::mirror::sources_file(ctx);
    match ops::mirror::current(ctx)? {
        Some(label) => println!("{label}"),
        None => println!("No droidenv-managed mirror in {}", file.path().display()),
    }
    Ok(())
}

pub async fn select(output: &Output, ctx: &Context, region: Option<Region>, dry_run: bool) -> Result<()> {
    let region = ops::mirror::region_for(ctx, region);
    let selection = ops::mirror::select(ctx, region).await?;
    output.success(&format!(
        "Fastest: {} ({}ms)",
        selection.best.label,
        selection.latency.as_millis()
    ));

    if dry_run {
        let rendered = ops::mirror::preview(ctx, &selection)?;
        output.wait_async().await;
        println!();
        println!("Would write {}:", ops::mirror::sources_file(ctx).path().display());
        print!("{rendered}");
        return Ok(());
    }

    let applied = ops::mirror::apply(ctx, &selection).await?;
    if applied.changed {
        output.success(&format!("Switched to {}", applied.label));
    } else {
        output.info(&format!("Already using {}", applied.label));
    }
    Ok(())
}
