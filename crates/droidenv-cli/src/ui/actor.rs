//! UI Actor - Single-threaded event processing
//!
//! Steps, probes and concurrent downloads all report progress, but stdout is
//! strictly serial. Every event is sent over a channel to one thread that owns
//! the terminal, so two writers never interleave and no renderer state needs
//! a lock.

use std::collections::HashMap;
use std::io::{IsTerminal, Write};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use comfy_table::{Cell, Table, presets};
use crossterm::style::Stylize;
use crossterm::terminal::{Clear, ClearType};
use droidenv_schema::{RunSummary, StepOutcome};

use super::theme::{Theme, format_duration, format_size};

/// Events that can be sent to the UI actor
#[derive(Debug)]
pub enum UiEvent {
    Section(String),
    StepStarted {
        position: usize,
        total: usize,
        name: String,
        estimate_secs: u64,
        percent: u8,
    },
    StepFinished {
        name: String,
        outcome: StepOutcome,
        elapsed_secs: f64,
    },
    Probed {
        label: String,
        latency: Option<Duration>,
    },
    Downloading {
        id: String,
        current: u64,
        total: Option<u64>,
    },
    Done {
        id: String,
        detail: String,
        size: Option<u64>,
    },
    Failed {
        id: String,
        reason: String,
    },
    Info(String),
    Success(String),
    Warning(String),
    Error(String),
    Summary(Box<RunSummary>),
    /// Reply once every earlier event has been rendered
    Sync(tokio::sync::oneshot::Sender<()>),
    Shutdown,
}

/// Handle to the UI actor thread
pub struct UiActor {
    sender: mpsc::Sender<UiEvent>,
    _handle: thread::JoinHandle<()>,
}

impl UiActor {
    /// Spawn a new UI actor thread
    pub fn spawn(quiet: bool) -> Self {
        let (sender, receiver) = mpsc::channel();
        let handle = thread::spawn(move || {
            Renderer::new(quiet).run(&receiver);
        });
        Self {
            sender,
            _handle: handle,
        }
    }

    pub fn sender(&self) -> mpsc::Sender<UiEvent> {
        self.sender.clone()
    }
}

impl Drop for UiActor {
    fn drop(&mut self) {
        let _ = self.sender.send(UiEvent::Shutdown);
    }
}

/// State owned by the actor thread.
struct Renderer {
    theme: Theme,
    quiet: bool,
    tty: bool,
    /// A progress line is on screen without a trailing newline.
    live_line: bool,
    /// Last rendered download percentage per id, to throttle redraws.
    progress: HashMap<String, u64>,
}

impl Renderer {
    fn new(quiet: bool) -> Self {
        Self {
            theme: Theme::default(),
            quiet,
            tty: std::io::stdout().is_terminal(),
            live_line: false,
            progress: HashMap::new(),
        }
    }

    fn run(&mut self, receiver: &mpsc::Receiver<UiEvent>) {
        while let Ok(event) = receiver.recv() {
            match event {
                UiEvent::Shutdown => break,
                UiEvent::Sync(tx) => {
                    self.end_live_line();
                    let _ = std::io::stdout().flush();
                    let _ = tx.send(());
                }
                other => self.render(other),
            }
        }
        self.end_live_line();
    }

    fn end_live_line(&mut self) {
        if self.live_line {
            println!();
            self.live_line = false;
        }
    }

    fn render(&mut self, event: UiEvent) {
        let icons = self.theme.icons.clone();
        let colors = self.theme.colors.clone();

        if !matches!(event, UiEvent::Downloading { .. }) {
            self.end_live_line();
        }

        match event {
            UiEvent::Section(title) => {
                if !self.quiet {
                    println!();
                    println!("{}", title.bold());
                }
            }
            UiEvent::StepStarted {
                position,
                total,
                name,
                estimate_secs,
                percent,
            } => {
                println!();
                println!(
                    "{} {} {} {}",
                    format!("[{position}/{total}]").with(colors.secondary),
                    format!("{percent:>3}%").with(colors.active),
                    name.as_str().bold(),
                    format!("(~{})", format_duration(estimate_secs as f64)).with(colors.secondary),
                );
            }
            UiEvent::StepFinished {
                name,
                outcome,
                elapsed_secs,
            } => {
                let (icon, color) = self.theme.outcome(outcome);
                println!(
                    "  {} {} {} {}",
                    icon.with(color),
                    name.as_str().with(colors.name),
                    outcome.as_str().with(color),
                    format_duration(elapsed_secs).with(colors.secondary),
                );
            }
            UiEvent::Probed { label, latency } => {
                if self.quiet {
                    return;
                }
                match latency {
                    Some(d) => {
                        let ms = format!("{}ms", d.as_millis());
                        println!("  {} {ms:>7} {label}", icons.success.with(colors.success));
                    }
                    None => println!(
                        "  {} {:>7} {}",
                        icons.error.with(colors.error),
                        "--",
                        label.with(colors.secondary)
                    ),
                }
            }
            UiEvent::Downloading { id, current, total } => self.downloading(&id, current, total),
            UiEvent::Done { id, detail, size } => {
                self.progress.remove(&id);
                let size = size.map_or_else(String::new, format_size);
                println!(
                    "  {} {} {} {}",
                    icons.success.with(colors.success),
                    id.with(colors.name),
                    size.with(colors.secondary),
                    detail.with(colors.secondary)
                );
            }
            UiEvent::Failed { id, reason } => {
                self.progress.remove(&id);
                println!(
                    "  {} {} {}",
                    icons.error.with(colors.error),
                    id.with(colors.name),
                    reason.with(colors.error)
                );
            }
            UiEvent::Info(msg) => {
                if !self.quiet {
                    println!("  {} {}", icons.info, msg);
                }
            }
            UiEvent::Success(msg) => println!("{} {}", icons.success.with(colors.success), msg),
            UiEvent::Warning(msg) => println!("{} {}", icons.warning.with(colors.warning), msg),
            UiEvent::Error(msg) => println!("{} {}", icons.error.with(colors.error), msg.red()),
            UiEvent::Summary(summary) => self.summary(&summary),
            UiEvent::Sync(_) | UiEvent::Shutdown => {}
        }
    }

    fn downloading(&mut self, id: &str, current: u64, total: Option<u64>) {
        if self.quiet || !self.tty {
            return;
        }
        let percent = match total.filter(|t| *t > 0) {
            Some(t) => current.saturating_mul(100) / t,
            None => current / (256 * 1024),
        };
        if self.progress.get(id) == Some(&percent) {
            return;
        }
        self.progress.insert(id.to_string(), percent);

        let amount = match total {
            Some(t) if t > 0 => format!("{} / {}", format_size(current), format_size(t)),
            _ => format_size(current),
        };
        print!(
            "\r{}  {} {} {}",
            Clear(ClearType::CurrentLine),
            self.theme.icons.active.with(self.theme.colors.active),
            id,
            amount.with(self.theme.colors.secondary)
        );
        let _ = std::io::stdout().flush();
        self.live_line = true;
    }

    fn summary(&self, summary: &RunSummary) {
        let mut table = Table::new();
        table.load_preset(presets::NOTHING);
        table.set_header(vec!["", "STEP", "STATUS", "TIME", "NOTE"]);
        for step in &summary.steps {
            let (icon, _) = self.theme.status(step.status);
            table.add_row(vec![
                Cell::new(icon),
                Cell::new(&step.name),
                Cell::new(step.status.as_str()),
                Cell::new(format_duration(step.duration_secs)),
                Cell::new(step.message.as_deref().unwrap_or_default()),
            ]);
        }

        println!();
        println!("{table}");
        println!();

        let counts = &summary.counts;
        let line = format!(
            "{} ok, {} warning, {} failed, {} skipped in {}",
            counts.success,
            counts.warning,
            counts.error,
            counts.skipped,
            format_duration(summary.total_duration_secs)
        );
        let (icon, color) = if summary.aborted || counts.error > 0 {
            self.theme.outcome(StepOutcome::Error)
        } else if counts.warning > 0 {
            self.theme.outcome(StepOutcome::Warning)
        } else {
            self.theme.outcome(StepOutcome::Success)
        };
        println!("{} {}", icon.with(color), line.with(color));
        if summary.aborted {
            println!("{}", "Setup aborted; remaining steps were skipped.".with(color));
        }
    }
}
