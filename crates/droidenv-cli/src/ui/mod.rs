//! UI Module - terminal output for droidenv.
//!
//! ```text
//! commands / engines ──Reporter──▶ Output ──events──▶ UiActor ──▶ stdout
//!                                                        │
//!                                                     Theme
//! ```
//!
//! - [`theme`] - Colors, icons and formatting helpers
//! - [`actor`] - Message-passing event loop that owns stdout
//! - [`output`] - Public handle implementing the core `Reporter`
//! - [`prompt`] - y/N continuation prompt

pub mod actor;
pub mod output;
pub mod prompt;
pub mod theme;

pub use output::Output;
pub use prompt::TerminalPrompt;
pub use theme::Theme;
