//! Selection and acquisition driven from orchestrator steps and spawned tasks.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use droidenv_core::fetch::{Acquirer, AcquisitionRequest, DirectUrl};
use droidenv_core::mirror::{HttpProber, select_best};
use droidenv_core::orchestrator::{AlwaysContinue, Orchestrator, StepBody, StepReport};
use droidenv_core::{NullReporter, RetryPolicy};
use droidenv_schema::{Candidate, Region, StepOutcome};
use mockito::Server;
use tempfile::TempDir;

struct PickMirror {
    prober: HttpProber,
    candidates: Vec<Candidate>,
}

#[async_trait]
impl StepBody for PickMirror {
    async fn run(&self, report: StepReport) -> anyhow::Result<()> {
        let selection = select_best(
            &self.prober,
            &self.candidates,
            Duration::from_secs(5),
            2,
            &NullReporter,
        )
        .await?;
        report.note(format!("fastest is {}", selection.best.label));
        Ok(())
    }
}

struct FetchAll {
    acquirer: Acquirer,
    requests: Vec<AcquisitionRequest>,
}

#[async_trait]
impl StepBody for FetchAll {
    async fn run(&self, report: StepReport) -> anyhow::Result<()> {
        let results = self.acquirer.acquire_batch(&self.requests, 2).await;
        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed == results.len() {
            anyhow::bail!("nothing acquired");
        }
        if failed > 0 {
            report.warn(format!("{failed} of {} failed", results.len()));
        }
        Ok(())
    }
}

fn acquirer() -> Acquirer {
    Acquirer::new(reqwest::Client::new(), Arc::new(NullReporter)).with_retry(RetryPolicy::none())
}

#[tokio::test]
async fn test_steps_select_and_acquire() {
    let mut server = Server::new_async().await;
    let _release = server
        .mock("GET", "/fast/termux-main/dists/stable/Release")
        .with_body("Origin: Termux")
        .create_async()
        .await;
    let _apk = server
        .mock("GET", "/one.apk")
        .with_body(vec![1u8; 64])
        .create_async()
        .await;
    let _gone = server
        .mock("GET", "/two.apk")
        .with_status(404)
        .create_async()
        .await;

    let dest = TempDir::new().unwrap();
    let mut orchestrator = Orchestrator::new(Arc::new(NullReporter), Arc::new(AlwaysContinue));
    let mirror = orchestrator.register(
        "select-mirror",
        "Select mirror",
        PickMirror {
            prober: HttpProber::new(reqwest::Client::new()),
            candidates: vec![Candidate::regional(
                "fast",
                format!("{}/fast", server.url()),
                Region::Europe,
            )],
        },
        5,
    );
    let fetch = orchestrator.register(
        "fetch-apps",
        "Fetch apps",
        FetchAll {
            acquirer: acquirer(),
            requests: vec![
                AcquisitionRequest::new("one", dest.path(), 1)
                    .resolver(DirectUrl::new(format!("{}/one.apk", server.url()))),
                AcquisitionRequest::new("two", dest.path(), 1)
                    .resolver(DirectUrl::new(format!("{}/two.apk", server.url()))),
            ],
        },
        5,
    );

    let report = orchestrator.run_all().await;
    let ledger = report.ledger();
    assert_eq!(ledger.get(mirror).unwrap().outcome(), StepOutcome::Success);
    assert_eq!(ledger.get(mirror).unwrap().message(), Some("fastest is fast"));
    assert_eq!(ledger.get(fetch).unwrap().outcome(), StepOutcome::Warning);
    assert!(dest.path().join("one.apk").exists());
}

#[tokio::test]
async fn test_selection_and_batch_run_on_spawned_tasks() {
    let mut server = Server::new_async().await;
    let _release = server
        .mock("GET", "/m/termux-main/dists/stable/Release")
        .with_body("Origin: Termux")
        .create_async()
        .await;
    let _apk = server
        .mock("GET", "/app.apk")
        .with_body(vec![2u8; 32])
        .create_async()
        .await;

    let prober = HttpProber::new(reqwest::Client::new());
    let candidates = vec![Candidate::official("m", format!("{}/m", server.url()))];
    let selection = tokio::spawn(async move {
        select_best(&prober, &candidates, Duration::from_secs(5), 4, &NullReporter).await
    })
    .await
    .unwrap()
    .unwrap();
    assert_eq!(selection.best.label, "m");

    let dest = TempDir::new().unwrap();
    let requests = vec![
        AcquisitionRequest::new("app", dest.path(), 1)
            .resolver(DirectUrl::new(format!("{}/app.apk", server.url()))),
    ];
    let acquirer = acquirer();
    let results = tokio::spawn(async move { acquirer.acquire_batch(&requests, 2).await })
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].as_ref().unwrap().size, 32);
}
