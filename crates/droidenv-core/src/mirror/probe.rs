//! Reachability and latency probes.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use droidenv_schema::{Candidate, SourceDomain};
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("no response within {}ms", .0.as_millis())]
    TimedOut(Duration),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),
}

/// Measures how long a candidate takes to answer.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Probe `candidate`, giving up after `timeout`.
    async fn probe(&self, candidate: &Candidate, timeout: Duration) -> Result<Duration, ProbeError>;
}

/// Probes the main repository's `Release` file over HTTP.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: Client,
}

impl HttpProber {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// URL fetched when probing `candidate`.
    pub fn probe_url(candidate: &Candidate) -> String {
        let domain = SourceDomain::Main;
        format!(
            "{}/dists/{}/Release",
            domain.repo_url(&candidate.base_url),
            domain.distribution()
        )
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, candidate: &Candidate, timeout: Duration) -> Result<Duration, ProbeError> {
        let url = Self::probe_url(candidate);
        let started = Instant::now();

        let response = tokio::time::timeout(timeout, self.client.get(&url).send())
            .await
            .map_err(|_| ProbeError::TimedOut(timeout))??;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::Status(status));
        }
        Ok(started.elapsed())
    }
}

/// Probe a single candidate under a hard deadline.
///
/// The deadline is enforced here as well as inside the prober, so a prober
/// that ignores its `timeout` argument still cannot hold the caller longer.
///
/// # Errors
///
/// Returns [`ProbeError`] on timeout, refusal or a non-success status.
pub async fn benchmark<P: Prober + ?Sized>(
    prober: &P,
    candidate: &Candidate,
    timeout: Duration,
) -> Result<Duration, ProbeError> {
    debug!(label = %candidate.label, url = %candidate.base_url, "probing");
    let result = tokio::time::timeout(timeout, prober.probe(candidate, timeout))
        .await
        .unwrap_or(Err(ProbeError::TimedOut(timeout)));
    match &result {
        Ok(latency) => debug!(label = %candidate.label, ms = latency.as_millis(), "probe ok"),
        Err(e) => debug!(label = %candidate.label, error = %e, "probe failed"),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[test]
    fn test_probe_url() {
        let c = Candidate::official("Termux", "https://packages.termux.dev/apt/");
        assert_eq!(
            HttpProber::probe_url(&c),
            "https://packages.termux.dev/apt/termux-main/dists/stable/Release"
        );
    }

    #[tokio::test]
    async fn test_http_probe_success_and_status() {
        let mut server = Server::new_async().await;
        let _ok = server
            .mock("GET", "/good/termux-main/dists/stable/Release")
            .with_status(200)
            .with_body("Origin: Termux")
            .create_async()
            .await;
        let _missing = server
            .mock("GET", "/bad/termux-main/dists/stable/Release")
            .with_status(404)
            .create_async()
            .await;

        let prober = HttpProber::new(Client::new());
        let good = Candidate::official("good", format!("{}/good", server.url()));
        let bad = Candidate::official("bad", format!("{}/bad", server.url()));

        assert!(benchmark(&prober, &good, Duration::from_secs(5)).await.is_ok());
        let err = benchmark(&prober, &bad, Duration::from_secs(5)).await.unwrap_err();
        assert!(matches!(err, ProbeError::Status(s) if s.as_u16() == 404));
    }

    #[tokio::test]
    async fn test_silent_server_hits_deadline() {
        // Accepts the connection (via the backlog) but never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let prober = HttpProber::new(Client::new());
        let silent = Candidate::official("silent", format!("http://{addr}"));

        let started = Instant::now();
        let err = benchmark(&prober, &silent, Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::TimedOut(_)));
        assert!(started.elapsed() < Duration::from_secs(2));
        drop(listener);
    }

    struct Stubborn;

    #[async_trait]
    impl Prober for Stubborn {
        async fn probe(&self, _: &Candidate, _: Duration) -> Result<Duration, ProbeError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Duration::ZERO)
        }
    }

    #[tokio::test]
    async fn test_deadline_holds_for_misbehaving_prober() {
        let c = Candidate::official("slow", "http://unused");
        let started = Instant::now();
        let err = benchmark(&Stubborn, &c, Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::TimedOut(_)));
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
