//! Operations shared by commands and setup steps.

pub mod apps;
pub mod context;
pub mod mirror;
pub mod packages;

pub use context::Context;
