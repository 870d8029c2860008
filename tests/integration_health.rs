#![allow(clippy::unwrap_used, clippy::panic, clippy::missing_panics_doc, clippy::must_use_candidate, missing_debug_implementations, unreachable_pub, clippy::new_without_default)]
use reqwest::StatusCode;

mod common;

#[tokio::test]
async fn test_livez() {
    let app = common::TestApp::spawn().await;

    let resp = app.client.get(format!("{}/livez", app.server_url)).send().await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
}
