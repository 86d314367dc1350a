//! Package mirror selection.
//!
//! Candidates are probed concurrently, the fastest responder wins, and the
//! sources list is switched under a snapshot so a mirror that fails its index
//! refresh never stays configured.

pub mod catalog;
pub mod probe;
pub mod region;
pub mod select;
pub mod sources;

pub use catalog::{all_candidates, candidates_for};
pub use probe::{HttpProber, ProbeError, Prober, benchmark};
pub use region::{LocaleSignals, detect_region};
pub use select::{ProbeOutcome, Selection, SelectionError, select_best};
pub use sources::{
    Applied, ApplyError, ConfigSnapshot, IndexRefresher, PackageIndexRefresher, SourcesError,
    SourcesFile, apply_and_verify,
};
