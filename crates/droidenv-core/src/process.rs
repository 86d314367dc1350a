//! Boundary for running external tools.
//!
//! Exit-code conventions differ between tools, so each invocation carries a
//! [`ToolProfile`] naming the codes that count as success. Nothing above this
//! module looks at raw exit codes.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("{0} not found on PATH")]
    NotFound(String),

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("{program} did not finish within {}s", .timeout.as_secs())]
    TimedOut { program: String, timeout: Duration },

    #[error("{program} exited with {}: {stderr}", code.map_or_else(|| "signal".to_string(), |c| c.to_string()))]
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
}

/// Exit codes a tool uses to mean success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolProfile {
    pub name: &'static str,
    pub success_codes: &'static [i32],
}

impl ToolProfile {
    /// Ordinary tools: only 0 is success.
    pub const GENERIC: Self = Self {
        name: "generic",
        success_codes: &[0],
    };

    /// `pkg`/`apt`. Exit 100 is accepted as success for this tool family only.
    pub const PACKAGE_MANAGER: Self = Self {
        name: "package-manager",
        success_codes: &[0, 100],
    };

    pub fn accepts(&self, code: i32) -> bool {
        self.success_codes.contains(&code)
    }
}

/// A command to run.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub timeout: Duration,
    pub profile: ToolProfile,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            timeout: Duration::from_secs(600),
            profile: ToolProfile::GENERIC,
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn profile(mut self, profile: ToolProfile) -> Self {
        self.profile = profile;
        self
    }
}

/// Captured result of a successful run.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `spec` to completion, or fail once its timeout elapses.
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ProcessError>;
}

/// Runs commands with `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ProcessError> {
        debug!(program = %spec.program, args = ?spec.args, "running command");

        let mut command = tokio::process::Command::new(&spec.program);
        command
            .args(&spec.args)
            .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = command.spawn().map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ProcessError::NotFound(spec.program.clone())
            } else {
                ProcessError::Spawn {
                    program: spec.program.clone(),
                    source,
                }
            }
        })?;

        let output = tokio::time::timeout(spec.timeout, child.wait_with_output())
            .await
            .map_err(|_| ProcessError::TimedOut {
                program: spec.program.clone(),
                timeout: spec.timeout,
            })?
            .map_err(|source| ProcessError::Spawn {
                program: spec.program.clone(),
                source,
            })?;

        let code = output.status.code();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !code.is_some_and(|c| spec.profile.accepts(c)) {
            return Err(ProcessError::Failed {
                program: spec.program.clone(),
                code,
                stderr: tail(&stderr, 5),
            });
        }

        Ok(CommandOutput {
            code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr,
        })
    }
}

/// Locate the package manager front-end, preferring `pkg` over `apt`.
pub fn find_package_manager() -> Option<PathBuf> {
    ["pkg", "apt"]
        .iter()
        .find_map(|name| which::which(name).ok())
}

fn tail(text: &str, lines: usize) -> String {
    let collected: Vec<&str> = text.lines().rev().take(lines).collect();
    collected.into_iter().rev().collect::<Vec<_>>().join("\n")
}
