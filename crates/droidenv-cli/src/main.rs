//! droidenv CLI

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use droidenv_cli::cmd;
use droidenv_cli::ops::Context;
use droidenv_cli::ui::Output;
use droidenv_cli::{Cli, Commands, MirrorCommands};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Logs go to stderr; stdout belongs to the UI actor.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output = Output::with_quiet(cli.quiet);
    let result = run(cli, &output).await;

    // Let the UI actor finish rendering before the process exits.
    output.wait_async().await;
    result.map(ExitCode::from)
}

async fn run(cli: Cli, output: &Output) -> Result<u8> {
    let interactive = !cli.non_interactive;
    let code = match cli.command {
        Commands::Setup { only, region } => {
            let ctx = Context::load(output, interactive)?;
            cmd::setup::setup(output, &ctx, only, region).await?
        }
        Commands::Steps => {
            cmd::steps::steps();
            0
        }
        Commands::Mirror { command } => {
            let ctx = Context::load(output, interactive)?;
            match command {
                MirrorCommands::List { region } => cmd::mirror::list(&ctx, region),
                MirrorCommands::Current => cmd::mirror::current(&ctx)?,
                MirrorCommands::Select { region, dry_run } => {
                    cmd::mirror::select(output, &ctx, region, dry_run).await?;
                }
            }
            0
        }
        Commands::Fetch {
            apps,
            dir,
            min_size,
        } => {
            let ctx = Context::load(output, interactive)?;
            if cmd::fetch::fetch(output, &ctx, &apps, dir, min_size).await? {
                0
            } else {
                2
            }
        }
        Commands::Summary { json } => {
            cmd::summary::summary(output, json)?;
            0
        }
        Commands::Completions { shell } => {
            cmd::completions::completions(shell);
            0
        }
    };
    Ok(code)
}
