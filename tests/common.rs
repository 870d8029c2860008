#![allow(dead_code)]
use lead_intake_server::AppBuilder;
use lead_intake_server::config::{Config, MailProviderKind, Secret};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Once;
use std::sync::atomic::{AtomicUsize, Ordering};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

static INIT: Once = Once::new();

pub const AIRTABLE_PATH: &str = "/v0/appTest/Request%20form";
pub const SENDGRID_PATH: &str = "/v3/mail/send";

pub fn setup_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "warn".into())
            .add_directive("lead_intake_server=debug".parse().unwrap())
            .add_directive("hyper=warn".parse().unwrap())
            .add_directive("reqwest=warn".parse().unwrap())
            .add_directive("rustls=warn".parse().unwrap());

        tracing_subscriber::fmt().with_env_filter(filter).init();
    });
}

/// Configuration pointing at the given fake Airtable and `SendGrid` servers.
pub fn get_test_config(airtable_url: &str, sendgrid_url: &str) -> Config {
    let mut config = Config::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0;
    config.rate_limit.per_second = 10_000;
    config.rate_limit.burst = 10_000;

    config.record_store.airtable_api_key = Secret::new("test-airtable-key");
    config.record_store.airtable_base_url = airtable_url.to_string();
    config.record_store.airtable_base_id = "appTest".to_string();
    config.record_store.airtable_table_name = "Request form".to_string();
    config.record_store.airtable_timeout_secs = 5;

    config.mail.mail_provider = MailProviderKind::Sendgrid;
    config.mail.sendgrid_api_key = Some(Secret::new("SG.test"));
    config.mail.sendgrid_base_url = sendgrid_url.to_string();
    config.mail.mail_from = Some("leads@example.com".to_string());
    config.mail.admin_emails = vec!["ops@example.com".to_string(), " sales@example.com ".to_string()];
    config.mail.mail_timeout_secs = 5;
    config
}

pub fn valid_payload() -> Value {
    json!({
        "fullName": "Ada Obi",
        "email": "ada@example.com",
        "phone": "+234 800 000 0000",
        "company": "Obi Foods",
        "product": "Cocoa Beans",
        "message": "Please send a quote for 20 tonnes.",
        "website": ""
    })
}

/// Answers each Airtable create call with a fresh record id.
pub struct SequentialRecordIds(AtomicUsize);

impl SequentialRecordIds {
    pub fn new() -> Self {
        Self(AtomicUsize::new(0))
    }
}

impl Respond for SequentialRecordIds {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let n = self.0.fetch_add(1, Ordering::SeqCst) + 1;
        ResponseTemplate::new(200).set_body_json(json!({ "id": format!("rec{n}"), "fields": {} }))
    }
}

pub struct TestApp {
    pub server_url: String,
    pub client: reqwest::Client,
    pub airtable: MockServer,
    pub sendgrid: MockServer,
    pub config: Config,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    pub async fn spawn_with(customize: impl FnOnce(&mut Config)) -> Self {
        setup_tracing();

        let airtable = MockServer::start().await;
        let sendgrid = MockServer::start().await;

        let mut config = get_test_config(&airtable.uri(), &sendgrid.uri());
        customize(&mut config);

        let app = AppBuilder::new(config.clone()).build().expect("app builds from test config");

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await.unwrap();
        });

        Self { server_url: format!("http://{addr}"), client: reqwest::Client::new(), airtable, sendgrid, config }
    }

    pub async fn mount_airtable_success(&self) {
        Mock::given(method("POST"))
            .and(path(AIRTABLE_PATH))
            .respond_with(SequentialRecordIds::new())
            .mount(&self.airtable)
            .await;
    }

    pub async fn mount_sendgrid(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path(SENDGRID_PATH))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.sendgrid)
            .await;
    }

    pub async fn submit(&self, payload: &Value) -> reqwest::Response {
        self.client.post(format!("{}/api/submit", self.server_url)).json(payload).send().await.unwrap()
    }

    /// JSON bodies of every record creation call the fake Airtable received.
    pub async fn airtable_bodies(&self) -> Vec<Value> {
        self.airtable.received_requests().await.unwrap().iter().map(|r| r.body_json::<Value>().unwrap()).collect()
    }

    pub async fn sendgrid_bodies(&self) -> Vec<Value> {
        self.sendgrid.received_requests().await.unwrap().iter().map(|r| r.body_json::<Value>().unwrap()).collect()
    }
}
