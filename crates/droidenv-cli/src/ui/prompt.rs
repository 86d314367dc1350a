//! Terminal continuation prompt.

use std::io::Write;

use async_trait::async_trait;
use crossterm::style::Stylize;
use droidenv_core::orchestrator::ContinuePrompt;

use super::Output;

/// Asks `Continue anyway? (y/N)` on the terminal after a failed step.
///
/// Anything but `y` (including EOF) declines.
#[derive(Debug, Clone)]
pub struct TerminalPrompt {
    output: Output,
}

impl TerminalPrompt {
    pub fn new(output: Output) -> Self {
        Self { output }
    }
}

#[async_trait]
impl ContinuePrompt for TerminalPrompt {
    async fn confirm_continue(&self, step: &str, reason: Option<&str>) -> bool {
        // The question must land after the step's own output.
        self.output.wait_async().await;

        let step = step.to_string();
        let reason = reason.map(str::to_string);
        tokio::task::spawn_blocking(move || ask(&step, reason.as_deref()))
            .await
            .unwrap_or(false)
    }
}

fn ask(step: &str, reason: Option<&str>) -> bool {
    println!();
    if let Some(reason) = reason {
        println!("  {} {}", "Reason:".dark_grey(), reason);
    }
    print!(
        "  {} '{}' failed. Continue anyway? (y/N) ",
        "WARNING:".bold().red(),
        step
    );
    if std::io::stdout().flush().is_err() {
        return false;
    }

    let mut input = String::new();
    match std::io::stdin().read_line(&mut input) {
        Ok(0) | Err(_) => false,
        Ok(_) => input.trim().eq_ignore_ascii_case("y"),
    }
}
