//! Pick the fastest responding candidate.

use std::time::Duration;

use droidenv_schema::Candidate;
use futures::StreamExt;
use thiserror::Error;
use tracing::{info, warn};

use super::probe::{Prober, benchmark};
use crate::Reporter;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("no source available: none of {tried} candidate(s) responded")]
    NoSourceAvailable { tried: usize },
}

/// Result of probing one candidate.
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub candidate: Candidate,
    /// Latency, or the failure reason.
    pub result: Result<Duration, String>,
}

/// The winning candidate plus every probe result in probe order.
#[derive(Debug, Clone)]
pub struct Selection {
    pub best: Candidate,
    pub latency: Duration,
    pub outcomes: Vec<ProbeOutcome>,
}

/// Probe `candidates` concurrently and return the fastest responder.
///
/// Official candidates are ordered ahead of regional ones (keeping their
/// relative order), and ties on latency go to the earlier candidate. At most
/// `concurrency` probes are in flight at once and each is bounded by `timeout`.
///
/// # Errors
///
/// Returns [`SelectionError::NoSourceAvailable`] when no candidate responded,
/// including when `candidates` is empty.
pub async fn select_best<P, R>(
    prober: &P,
    candidates: &[Candidate],
    timeout: Duration,
    concurrency: usize,
    reporter: &R,
) -> Result<Selection, SelectionError>
where
    P: Prober + ?Sized,
    R: Reporter + ?Sized,
{
    let mut ordered: Vec<Candidate> = candidates.to_vec();
    ordered.sort_by_key(|c| !c.is_official());

    // Stream items own their candidate so the returned future stays `Send`.
    let mut results: Vec<(usize, Result<Duration, String>)> =
        futures::stream::iter(ordered.clone().into_iter().enumerate())
            .map(|(i, candidate)| async move {
                let result = benchmark(prober, &candidate, timeout)
                    .await
                    .map_err(|e| e.to_string());
                reporter.probed(&candidate.label, result.as_ref().ok().copied());
                (i, result)
            })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;
    results.sort_by_key(|(i, _)| *i);

    let best = results
        .iter()
        .filter_map(|(i, r)| r.as_ref().ok().map(|latency| (*latency, *i)))
        .min();

    let outcomes: Vec<ProbeOutcome> = results
        .into_iter()
        .map(|(i, result)| ProbeOutcome {
            candidate: ordered[i].clone(),
            result,
        })
        .collect();

    match best {
        Some((latency, i)) => {
            let best = ordered[i].clone();
            info!(label = %best.label, ms = latency.as_millis(), "selected mirror");
            Ok(Selection {
                best,
                latency,
                outcomes,
            })
        }
        None => {
            warn!(tried = candidates.len(), "no mirror responded");
            Err(SelectionError::NoSourceAvailable {
                tried: candidates.len(),
            })
        }
    }
}
