#![allow(clippy::unwrap_used, clippy::panic, clippy::missing_panics_doc, clippy::must_use_candidate, missing_debug_implementations, unreachable_pub, clippy::new_without_default)]
use reqwest::StatusCode;
use serde_json::{Value, json};

mod common;

#[tokio::test]
async fn test_submission_is_stored_and_notified() {
    let app = common::TestApp::spawn().await;
    app.mount_airtable_success().await;
    app.mount_sendgrid(202).await;

    let resp = app.submit(&common::valid_payload()).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["content-type"], "application/json");
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "success": true, "id": "rec1", "emailSent": true }));

    let stored = app.airtable_bodies().await;
    assert_eq!(stored.len(), 1, "exactly one record is created");
    let fields = &stored[0]["fields"];
    assert_eq!(fields["Full Name"], "Ada Obi");
    assert_eq!(fields["Email Address"], "ada@example.com");
    assert_eq!(fields["Phone Number"], "+234 800 000 0000");
    assert_eq!(fields["Company Name"], "Obi Foods");
    assert_eq!(fields["Interested Products"], json!(["Cocoa Beans"]));
    assert_eq!(fields["Message / Request"], "Please send a quote for 20 tonnes.");
    assert_eq!(fields["Lead Source"], "Website Contact Form");
    assert!(fields["Date Submitted"].as_str().unwrap().ends_with('Z'));

    let requests = app.airtable.received_requests().await.unwrap();
    assert_eq!(requests[0].headers["authorization"], "Bearer test-airtable-key");

    let mails = app.sendgrid_bodies().await;
    assert_eq!(mails.len(), 2);
    assert_eq!(mails[0]["personalizations"][0]["to"], json!([{ "email": "ada@example.com" }]));
    assert_eq!(
        mails[1]["personalizations"][0]["to"],
        json!([{ "email": "ops@example.com" }, { "email": "sales@example.com" }])
    );
    assert_eq!(mails[1]["reply_to"]["email"], "ada@example.com");
    assert_eq!(mails[1]["subject"], "New form submission from Ada Obi");
    assert!(mails[1]["content"][0]["value"].as_str().unwrap().contains("rec1"));
}

#[tokio::test]
async fn test_optional_fields_default_to_empty_strings() {
    let app = common::TestApp::spawn().await;
    app.mount_airtable_success().await;
    app.mount_sendgrid(202).await;

    let mut payload = common::valid_payload();
    let obj = payload.as_object_mut().unwrap();
    obj.remove("phone");
    obj.remove("company");
    obj.remove("website");

    let resp = app.submit(&payload).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let stored = app.airtable_bodies().await;
    assert_eq!(stored[0]["fields"]["Phone Number"], "");
    assert_eq!(stored[0]["fields"]["Company Name"], "");
}

#[tokio::test]
async fn test_product_list_persisted_unchanged() {
    let app = common::TestApp::spawn().await;
    app.mount_airtable_success().await;
    app.mount_sendgrid(202).await;

    let mut payload = common::valid_payload();
    payload["product"] = json!(["Cocoa Beans", "Shea Butter", "Cashew Nuts"]);

    let resp = app.submit(&payload).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let stored = app.airtable_bodies().await;
    assert_eq!(stored[0]["fields"]["Interested Products"], json!(["Cocoa Beans", "Shea Butter", "Cashew Nuts"]));
}

#[tokio::test]
async fn test_duplicate_submissions_create_distinct_records() {
    let app = common::TestApp::spawn().await;
    app.mount_airtable_success().await;
    app.mount_sendgrid(202).await;

    let first: Value = app.submit(&common::valid_payload()).await.json().await.unwrap();
    let second: Value = app.submit(&common::valid_payload()).await.json().await.unwrap();

    assert_eq!(first["success"], true);
    assert_eq!(second["success"], true);
    assert_ne!(first["id"], second["id"]);
    assert_eq!(app.airtable_bodies().await.len(), 2, "duplicates are not merged");
}

#[tokio::test]
async fn test_legacy_path_accepts_submissions() {
    let app = common::TestApp::spawn().await;
    app.mount_airtable_success().await;
    app.mount_sendgrid(202).await;

    let resp = app
        .client
        .post(format!("{}/.netlify/functions/submit-form", app.server_url))
        .json(&common::valid_payload())
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(app.airtable_bodies().await.len(), 1);
}

#[tokio::test]
async fn test_user_text_is_escaped_in_emails() {
    let app = common::TestApp::spawn().await;
    app.mount_airtable_success().await;
    app.mount_sendgrid(202).await;

    let mut payload = common::valid_payload();
    payload["message"] = json!("<script>alert('x')</script>");

    let resp = app.submit(&payload).await;
    assert_eq!(resp.status(), StatusCode::OK);

    for mail in app.sendgrid_bodies().await {
        let html = mail["content"][0]["value"].as_str().unwrap();
        assert!(!html.contains("<script>"), "{html}");
        assert!(html.contains("&lt;script&gt;"), "{html}");
    }

    // The store keeps the raw text.
    let stored = app.airtable_bodies().await;
    assert_eq!(stored[0]["fields"]["Message / Request"], "<script>alert('x')</script>");
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let app = common::TestApp::spawn().await;
    app.mount_airtable_success().await;
    app.mount_sendgrid(202).await;

    let resp = app
        .client
        .post(format!("{}/api/submit", app.server_url))
        .header("x-request-id", "req-abc")
        .json(&common::valid_payload())
        .send()
        .await
        .unwrap();

    assert_eq!(resp.headers()["x-request-id"], "req-abc");
}
