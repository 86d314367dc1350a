//! Unified UI output interface.
//!
//! Commands and the core engines talk to the terminal only through [`Output`],
//! which forwards every call as an event to the UI actor.

use std::sync::{OnceLock, mpsc};
use std::time::Duration;

use droidenv_core::Reporter;
use droidenv_schema::{RunSummary, StepOutcome};

use super::actor::{UiActor, UiEvent};

/// Singleton instance of the UI actor channel.
static UI_ACTOR: OnceLock<mpsc::Sender<UiEvent>> = OnceLock::new();

/// Lazily initializes the UI actor and returns a sender handle.
///
/// `quiet` only takes effect on the first call.
fn get_actor_sender(quiet: bool) -> mpsc::Sender<UiEvent> {
    UI_ACTOR
        .get_or_init(|| {
            let actor = UiActor::spawn(quiet);
            let sender = actor.sender();

            // Keep actor alive for program duration
            std::mem::forget(actor);

            sender
        })
        .clone()
}

/// A cloneable handle for sending UI events to the terminal actor.
#[derive(Debug, Clone)]
pub struct Output {
    sender: mpsc::Sender<UiEvent>,
}

impl Output {
    pub fn new() -> Self {
        Self::with_quiet(false)
    }

    /// Handle whose actor suppresses informational chatter and progress lines.
    pub fn with_quiet(quiet: bool) -> Self {
        Self {
            sender: get_actor_sender(quiet),
        }
    }

    fn send(&self, event: UiEvent) {
        let _ = self.sender.send(event);
    }

    /// Block until all pending UI events are processed.
    pub fn wait(&self) {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.send(UiEvent::Sync(tx));
        let _ = rx.blocking_recv();
    }

    /// Async version of wait.
    pub async fn wait_async(&self) {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.send(UiEvent::Sync(tx));
        let _ = rx.await;
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for Output {
    fn section(&self, title: &str) {
        self.send(UiEvent::Section(title.to_string()));
    }

    fn step_started(&self, position: usize, total: usize, name: &str, estimate_secs: u64, percent: u8) {
        self.send(UiEvent::StepStarted {
            position,
            total,
            name: name.to_string(),
            estimate_secs,
            percent,
        });
    }

    fn step_finished(&self, name: &str, outcome: StepOutcome, elapsed_secs: f64) {
        self.send(UiEvent::StepFinished {
            name: name.to_string(),
            outcome,
            elapsed_secs,
        });
    }

    fn probed(&self, label: &str, latency: Option<Duration>) {
        self.send(UiEvent::Probed {
            label: label.to_string(),
            latency,
        });
    }

    fn downloading(&self, id: &str, current: u64, total: Option<u64>) {
        self.send(UiEvent::Downloading {
            id: id.to_string(),
            current,
            total,
        });
    }

    fn done(&self, id: &str, detail: &str, size: Option<u64>) {
        self.send(UiEvent::Done {
            id: id.to_string(),
            detail: detail.to_string(),
            size,
        });
    }

    fn failed(&self, id: &str, reason: &str) {
        self.send(UiEvent::Failed {
            id: id.to_string(),
            reason: reason.to_string(),
        });
    }

    fn info(&self, msg: &str) {
        self.send(UiEvent::Info(msg.to_string()));
    }

    fn success(&self, msg: &str) {
        self.send(UiEvent::Success(msg.to_string()));
    }

    fn warning(&self, msg: &str) {
        self.send(UiEvent::Warning(msg.to_string()));
    }

    fn error(&self, msg: &str) {
        self.send(UiEvent::Error(msg.to_string()));
    }

    fn summary(&self, summary: &RunSummary) {
        self.send(UiEvent::Summary(Box::new(summary.clone())));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_clone_shares_actor() {
        let output = Output::new();
        let output2 = output.clone();

        output.info("from original");
        output2.info("from clone");
        output.wait();
    }
}
