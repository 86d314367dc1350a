//! Core library for droidenv.
//!
//! Three engines share one problem: evaluate competing or fallback sources
//! under unreliable network conditions, commit only on verified success, and
//! record what happened.
//!
//! - [`orchestrator`] runs named setup steps in order and records each one in
//!   the [`ledger`].
//! - [`mirror`] benchmarks package mirrors and switches the sources list
//!   transactionally.
//! - [`fetch`] acquires APKs through an ordered chain of resolvers, gated by
//!   verification.

pub mod fetch;
pub mod io;
pub mod ledger;
pub mod mirror;
pub mod orchestrator;
pub mod paths;
pub mod process;
pub mod reporter;
pub mod retry;
pub mod settings;

pub use paths::*;
pub use reporter::{NullReporter, Reporter};
pub use retry::RetryPolicy;
pub use settings::Settings;

use std::time::Duration;

/// User Agent string for core operations
pub const USER_AGENT: &str = concat!("droidenv/", env!("CARGO_PKG_VERSION"));

/// Build the shared HTTP client.
///
/// `connect_timeout` bounds the TCP/TLS handshake only; request deadlines are
/// enforced by the callers with `tokio::time::timeout`.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialised.
pub fn http_client(connect_timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(connect_timeout)
        .pool_max_idle_per_host(4)
        .build()
}
