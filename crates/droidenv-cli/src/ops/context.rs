//! Shared command context.
//!
//! Groups the state every command and setup step needs, so step bodies can
//! hold one cheap clone instead of a handful of handles.

use std::fmt;
use std::sync::Arc;

use anyhow::Context as _;
use droidenv_core::process::{CommandRunner, SystemRunner};
use droidenv_core::{Reporter, Settings};

use crate::ui::Output;

/// Groups common state used by commands and setup steps.
#[derive(Clone)]
pub struct Context {
    pub settings: Arc<Settings>,
    pub client: reqwest::Client,
    pub reporter: Arc<dyn Reporter>,
    pub runner: Arc<dyn CommandRunner>,
    /// `false` when running with `--yes`.
    pub interactive: bool,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("settings", &self.settings)
            .field("interactive", &self.interactive)
            .finish_non_exhaustive()
    }
}

impl Context {
    pub fn new(
        settings: Settings,
        reporter: Arc<dyn Reporter>,
        runner: Arc<dyn CommandRunner>,
        interactive: bool,
    ) -> anyhow::Result<Self> {
        let client = droidenv_core::http_client(settings.probe_timeout())
            .context("Failed to build HTTP client")?;
        Ok(Self {
            settings: Arc::new(settings),
            client,
            reporter,
            runner,
            interactive,
        })
    }

    /// Context for the binary: settings from disk, terminal output, real processes.
    pub fn load(output: &Output, interactive: bool) -> anyhow::Result<Self> {
        let settings = Settings::load().context("Failed to load settings")?;
        Self::new(
            settings,
            Arc::new(output.clone()),
            Arc::new(SystemRunner),
            interactive,
        )
    }
}
