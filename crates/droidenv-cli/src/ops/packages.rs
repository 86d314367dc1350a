//! Package manager invocations.
//!
//! Both operations run under [`ToolProfile::PACKAGE_MANAGER`], so the exit
//! code that `pkg`/`apt` use for partial success is handled by the process
//! boundary and never seen here.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context as _, Result};
use droidenv_core::process::{CommandSpec, ToolProfile, find_package_manager};

use super::Context;

const UPGRADE_TIMEOUT: Duration = Duration::from_secs(30 * 60);
const INSTALL_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Command for `<pm> <action> -y [packages]`, keeping existing config files.
pub fn package_command(program: &Path, action: &str, packages: &[String]) -> CommandSpec {
    CommandSpec::new(program.to_string_lossy())
        .args([action, "-y"])
        .args(["-o", "Dpkg::Options::=--force-confold"])
        .args(packages.iter().cloned())
        .env("DEBIAN_FRONTEND", "noninteractive")
        .profile(ToolProfile::PACKAGE_MANAGER)
}

fn program() -> Result<std::path::PathBuf> {
    find_package_manager().context("neither pkg nor apt found on PATH; is this Termux?")
}

/// Upgrade every installed package.
pub async fn upgrade(ctx: &Context) -> Result<()> {
    let program = program()?;
    ctx.reporter.info(&format!("Running {} upgrade", program.display()));
    let spec = package_command(&program, "upgrade", &[]).timeout(UPGRADE_TIMEOUT);
    ctx.runner
        .run(&spec)
        .await
        .context("Package upgrade failed")?;
    Ok(())
}

/// Install `packages`. An empty list is a no-op.
pub async fn install(ctx: &Context, packages: &[String]) -> Result<()> {
    if packages.is_empty() {
        return Ok(());
    }
    let program = program()?;
    ctx.reporter
        .info(&format!("Installing {} packages", packages.len()));
    let spec = package_command(&program, "install", packages).timeout(INSTALL_TIMEOUT);
    ctx.runner
        .run(&spec)
        .await
        .with_context(|| format!("Failed to install {}", packages.join(" ")))?;
    Ok(())
}
