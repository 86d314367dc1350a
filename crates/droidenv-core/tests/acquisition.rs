//! End-to-end acquisition against a mock F-Droid + GitHub server.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use droidenv_core::fetch::{
    Acquirer, AcquisitionRequest, ApkInspector, AttemptStage, FdroidApi, FdroidHtml, GithubRelease,
};
use droidenv_core::{NullReporter, RetryPolicy};
use mockito::Server;
use tempfile::TempDir;

const APP_ID: &str = "com.example.app";
const MIN_SIZE: u64 = 12_288;

/// A zip with an Android manifest, padded to roughly `size` bytes.
fn apk_of_size(size: usize) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let stored =
        zip::write::SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    writer.start_file("AndroidManifest.xml", stored).unwrap();
    writer.write_all(b"<manifest package=\"com.example.app\"/>").unwrap();
    writer.start_file("classes.dex", stored).unwrap();
    writer.write_all(&vec![0xAB; size]).unwrap();
    writer.finish().unwrap().into_inner()
}

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_undersized_fdroid_build_falls_through_to_github() {
    let mut server = Server::new_async().await;
    let base = server.url();

    let api = server
        .mock("GET", "/api/v1/packages/com.example.app")
        .with_header("content-type", "application/json")
        .with_body(r#"{"packageName":"com.example.app","packages":[{"apkName":"com.example.app_7.apk","versionCode":7}]}"#)
        .create_async()
        .await;
    let small = server
        .mock("GET", "/repo/com.example.app_7.apk")
        .with_body(vec![1u8; 5 * 1024])
        .create_async()
        .await;
    let html = server
        .mock("GET", "/packages/com.example.app/")
        .with_status(404)
        .create_async()
        .await;
    let release = server
        .mock("GET", "/repos/example/app/releases/latest")
        .with_body(format!(
            r#"{{"tag_name":"v1.0","assets":[
                {{"name":"checksums.txt","browser_download_url":"{base}/dl/checksums.txt"}},
                {{"name":"app-release.apk","browser_download_url":"{base}/dl/app-release.apk"}}
            ]}}"#
        ))
        .create_async()
        .await;
    let large = server
        .mock("GET", "/dl/app-release.apk")
        .with_body(apk_of_size(50 * 1024))
        .create_async()
        .await;

    let dest = TempDir::new().unwrap();
    let request = AcquisitionRequest::new(APP_ID, dest.path(), MIN_SIZE)
        .resolver(FdroidApi::with_base(&base))
        .resolver(FdroidHtml::with_base(&base))
        .resolver(
            GithubRelease::new("example/app", "*.apk")
                .unwrap()
                .with_api_base(&base),
        );

    let acquirer = Acquirer::new(reqwest::Client::new(), Arc::new(NullReporter))
        .with_inspector(ApkInspector)
        .with_retry(RetryPolicy::none());
    let artifact = acquirer.acquire(&request).await.unwrap();

    assert_eq!(artifact.source, "github");
    assert!(artifact.size >= MIN_SIZE);
    assert_eq!(artifact.path, dest.path().join("com.example.app.apk"));
    assert_eq!(std::fs::metadata(&artifact.path).unwrap().len(), artifact.size);
    assert_eq!(artifact.sha256.len(), 64);

    // Only the committed artifact remains; the 5KB staging file is gone.
    assert_eq!(files_in(dest.path()), ["com.example.app.apk"]);

    for mock in [api, small, html, release, large] {
        mock.assert_async().await;
    }
}

#[tokio::test]
async fn test_rejected_content_is_never_published() {
    let mut server = Server::new_async().await;
    let base = server.url();

    // Large enough to pass the size check, but an HTML error page.
    let page = format!("<html>{}</html>", "x".repeat(20_000));
    let _api = server
        .mock("GET", "/api/v1/packages/com.example.app")
        .with_body(r#"{"packages":[{"apkName":"com.example.app_7.apk"}]}"#)
        .create_async()
        .await;
    let _repo = server
        .mock("GET", "/repo/com.example.app_7.apk")
        .with_body(page)
        .create_async()
        .await;

    let dest = TempDir::new().unwrap();
    let request =
        AcquisitionRequest::new(APP_ID, dest.path(), MIN_SIZE).resolver(FdroidApi::with_base(&base));

    let err = Acquirer::new(reqwest::Client::new(), Arc::new(NullReporter))
        .with_inspector(ApkInspector)
        .acquire(&request)
        .await
        .unwrap_err();

    let droidenv_core::fetch::AcquireError::Exhausted { failures, .. } = err else {
        panic!("expected exhaustion");
    };
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].resolver, "fdroid_api");
    assert_eq!(failures[0].stage, AttemptStage::Verify);
    assert!(files_in(dest.path()).is_empty());
}
