//! The setup steps and their registration order.

mod fetch_apps;
mod select_mirror;

use std::sync::Arc;

use droidenv_core::orchestrator::{ContinuePrompt, Orchestrator, step_fn};
use droidenv_schema::Region;

use crate::ops::{self, Context};

pub use fetch_apps::FetchApps;
pub use select_mirror::SelectMirror;

/// Stable step identifiers, usable with `setup --only`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StepId {
    SelectMirror,
    UpgradePackages,
    InstallPackages,
    FetchApps,
}

impl StepId {
    /// Registration order.
    pub const ALL: [StepId; 4] = [
        StepId::SelectMirror,
        StepId::UpgradePackages,
        StepId::InstallPackages,
        StepId::FetchApps,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SelectMirror => "select-mirror",
            Self::UpgradePackages => "upgrade-packages",
            Self::InstallPackages => "install-packages",
            Self::FetchApps => "fetch-apps",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::SelectMirror => "Select package mirror",
            Self::UpgradePackages => "Upgrade packages",
            Self::InstallPackages => "Install base packages",
            Self::FetchApps => "Fetch companion apps",
        }
    }

    /// Estimated duration in seconds.
    pub fn estimate_secs(self) -> u64 {
        match self {
            Self::SelectMirror => 60,
            Self::UpgradePackages => 300,
            Self::InstallPackages => 600,
            Self::FetchApps => 120,
        }
    }
}

/// Register every setup step, in order.
pub fn build(ctx: &Context, prompt: Arc<dyn ContinuePrompt>, region: Option<Region>) -> Orchestrator {
    let mut orchestrator = Orchestrator::new(ctx.reporter.clone(), prompt);

    for id in StepId::ALL {
        let (name, secs) = (id.name(), id.estimate_secs());
        match id {
            StepId::SelectMirror => {
                orchestrator.register(id.as_str(), name, SelectMirror::new(ctx.clone(), region), secs);
            }
            StepId::UpgradePackages => {
                let ctx = ctx.clone();
                let body = step_fn(move |_report| {
                    let ctx = ctx.clone();
                    async move { ops::packages::upgrade(&ctx).await }
                });
                orchestrator.register(id.as_str(), name, body, secs);
            }
            StepId::InstallPackages => {
                let ctx = ctx.clone();
                let body = step_fn(move |report| {
                    let ctx = ctx.clone();
                    async move {
                        let packages = &ctx.settings.packages;
                        if packages.is_empty() {
                            report.note("no packages configured");
                            return Ok(());
                        }
                        ops::packages::install(&ctx, packages).await?;
                        report.note(format!("{} packages", packages.len()));
                        Ok(())
                    }
                });
                orchestrator.register(id.as_str(), name, body, secs);
            }
            StepId::FetchApps => {
                orchestrator.register(id.as_str(), name, FetchApps::new(ctx.clone()), secs);
            }
        }
    }
    orchestrator
}
