//! One module per subcommand.

pub mod completions;
pub mod fetch;
pub mod mirror;
pub mod setup;
pub mod steps;
pub mod summary;
