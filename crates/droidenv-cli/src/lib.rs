//! droidenv - provision a development environment inside Termux
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_panics_doc)]
//!
//! # Overview
//!
//! `droidenv setup` runs a fixed sequence of steps: pick the fastest package
//! mirror, upgrade and install base packages, then download companion apps.
//! A failing step asks whether to continue; `--yes` always continues.
//!
//! # Directory Layout
//!
//! ```text
//! ~/.droidenv/
//! ├── config.toml     # Optional settings
//! ├── downloads/      # Acquired APKs ({id}.apk)
//! └── last-run.json   # Summary of the last setup run
//! ```

pub mod apps;
pub mod cmd;
pub mod ops;
pub mod steps;
pub mod ui;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use droidenv_schema::Region;

pub use droidenv_core::paths::*;
pub use steps::StepId;

#[derive(Debug, Parser)]
#[command(name = "droidenv")]
#[command(author, version, about = "droidenv - development environment setup for Termux")]
pub struct Cli {
    /// Never prompt; continue past failed steps and take the fastest mirror
    #[arg(
        short = 'y',
        long = "yes",
        global = true,
        env = "DROIDENV_NONINTERACTIVE",
        value_parser = clap::builder::BoolishValueParser::new(),
        action = clap::ArgAction::SetTrue
    )]
    pub non_interactive: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the setup steps in order
    Setup {
        /// Run a single step in isolation
        #[arg(long, value_enum)]
        only: Option<StepId>,
        /// Skip region detection
        #[arg(long)]
        region: Option<Region>,
    },
    /// List setup steps and their estimated durations
    Steps,
    /// Inspect or switch the package mirror
    Mirror {
        #[command(subcommand)]
        command: MirrorCommands,
    },
    /// Download companion apps (catalog name or Android package id)
    Fetch {
        #[arg(required = true)]
        apps: Vec<String>,
        /// Destination directory [default: ~/.droidenv/downloads]
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Smallest accepted APK, in bytes
        #[arg(long)]
        min_size: Option<u64>,
    },
    /// Show the summary of the last setup run
    Summary {
        /// Print the raw JSON document
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Debug, Subcommand)]
pub enum MirrorCommands {
    /// List the candidate mirrors for a region
    List {
        #[arg(long)]
        region: Option<Region>,
    },
    /// Show the mirror the sources list currently points at
    Current,
    /// Benchmark candidates and switch to the fastest
    Select {
        #[arg(long)]
        region: Option<Region>,
        /// Benchmark and print the resulting sources list without writing it
        #[arg(long)]
        dry_run: bool,
    },
}
