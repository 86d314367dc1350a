//! Mirror selection followed by a transactional switch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use droidenv_core::mirror::{
    ApplyError, HttpProber, IndexRefresher, SourcesFile, apply_and_verify, select_best,
};
use droidenv_core::process::ProcessError;
use droidenv_core::NullReporter;
use droidenv_schema::{Candidate, Region};
use mockito::Server;
use tempfile::TempDir;

const HEALTHY: &str = "## Package repository\n\
                       deb https://m0.example/apt/termux-main stable main\n\
                       deb https://m0.example/apt/termux-x11 x11 main\n";

/// Succeeds only while the sources list points at an accepted host.
struct HostCheck {
    file: SourcesFile,
    accepted: &'static str,
    called: AtomicBool,
}

#[async_trait]
impl IndexRefresher for HostCheck {
    async fn refresh(&self) -> Result<(), ProcessError> {
        self.called.store(true, Ordering::SeqCst);
        let text = self.file.read().ok().flatten().unwrap_or_default();
        if text.contains(self.accepted) {
            Ok(())
        } else {
            Err(ProcessError::Failed {
                program: "apt".into(),
                code: Some(100),
                stderr: "E: Failed to fetch InRelease".into(),
            })
        }
    }
}

fn seeded(dir: &TempDir) -> SourcesFile {
    let path = dir.path().join("sources.list");
    std::fs::write(&path, HEALTHY).unwrap();
    SourcesFile::new(path)
}

#[tokio::test]
async fn test_failed_verification_restores_previous_mirror() {
    let dir = TempDir::new().unwrap();
    let file = seeded(&dir);
    let refresher = HostCheck {
        file: file.clone(),
        accepted: "m0.example",
        called: AtomicBool::new(false),
    };
    let m1 = Candidate::regional("M1", "https://m1.example/apt", Region::Europe);

    let err = apply_and_verify(&file, &m1, &refresher, &NullReporter)
        .await
        .unwrap_err();

    assert!(refresher.called.load(Ordering::SeqCst));
    assert!(matches!(err, ApplyError::Verification { .. }));
    assert_eq!(std::fs::read_to_string(file.path()).unwrap(), HEALTHY);
}

#[tokio::test]
async fn test_select_then_apply_fastest_mirror() {
    let mut server = Server::new_async().await;
    let _up = server
        .mock("GET", "/up/termux-main/dists/stable/Release")
        .with_body("Origin: Termux")
        .create_async()
        .await;
    let _down = server
        .mock("GET", "/down/termux-main/dists/stable/Release")
        .with_status(503)
        .create_async()
        .await;

    let candidates = vec![
        Candidate::official("down", format!("{}/down", server.url())),
        Candidate::regional("up", format!("{}/up", server.url()), Region::Asia),
    ];
    let prober = HttpProber::new(reqwest::Client::new());
    let selection = select_best(&prober, &candidates, Duration::from_secs(5), 4, &NullReporter)
        .await
        .unwrap();
    assert_eq!(selection.best.label, "up");

    let dir = TempDir::new().unwrap();
    let file = seeded(&dir);
    let refresher = HostCheck {
        file: file.clone(),
        accepted: "/up/termux-main",
        called: AtomicBool::new(false),
    };

    let applied = apply_and_verify(&file, &selection.best, &refresher, &NullReporter)
        .await
        .unwrap();
    assert_eq!(applied.label, "up");
    assert!(applied.changed);

    let written = std::fs::read_to_string(file.path()).unwrap();
    assert_eq!(
        written,
        format!(
            "## Package repository\n\
             deb {0}/up/termux-main stable main\n\
             deb {0}/up/termux-x11 x11 main\n",
            server.url()
        )
    );

    let again = apply_and_verify(&file, &selection.best, &refresher, &NullReporter)
        .await
        .unwrap();
    assert!(!again.changed);
    assert_eq!(std::fs::read_to_string(file.path()).unwrap(), written);
}
