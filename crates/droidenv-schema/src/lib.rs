//! Shared types for droidenv.
//!
//! Everything here is plain data: step outcomes, the run summary document,
//! mirror candidates and the `deb` source-line format. The engine
//! (`droidenv-core`) and the CLI both depend on this crate; neither the
//! types nor their codecs perform any I/O.

pub mod sources;
pub mod summary;
pub mod types;

// Re-exports
pub use sources::{SourceDomain, SourceLine, SourceLineError};
pub use summary::{RunCounts, RunSummary, StepSummary};
pub use types::*;
