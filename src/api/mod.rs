use crate::api::rate_limit::{Metrics as RateLimitMetrics, SubmitterKey, TrustedProxies, json_rate_limit_errors};
use crate::config::Config;
use crate::error::AppError;
use crate::services::submission_service::SubmissionService;
use anyhow::anyhow;
use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::{Request, StatusCode};
use axum::{
    Router,
    middleware::{Next, from_fn, from_fn_with_state},
    response::{IntoResponse, Response},
    routing::{any, get},
};
use std::sync::Arc;
use std::time::Duration;
use tower_governor::GovernorLayer;
use tower_governor::governor::GovernorConfigBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub mod health;
pub mod rate_limit;
pub mod schemas;
pub mod submissions;

/// Path the website posts the contact form to.
pub const SUBMIT_PATH: &str = "/api/submit";
/// Legacy path kept so existing front-ends keep working.
pub const LEGACY_SUBMIT_PATH: &str = "/.netlify/functions/submit-form";

#[derive(Clone, Debug)]
pub struct AppState {
    pub submission_service: SubmissionService,
    pub allowed_products: Arc<[String]>,
}

/// Configures and returns the application router.
///
/// # Errors
/// Returns an error if the rate limiter configuration cannot be constructed.
pub fn app_router(config: &Config, submission_service: SubmissionService) -> anyhow::Result<Router> {
    let interval_ns = 1_000_000_000 / config.rate_limit.per_second.max(1);
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_nanosecond(u64::from(interval_ns))
            .burst_size(config.rate_limit.burst.max(1))
            .key_extractor(SubmitterKey::new(TrustedProxies::new(config.rate_limit.trusted_proxies.iter().copied())))
            .finish()
            .ok_or_else(|| anyhow!("Failed to build rate limiter config"))?,
    );

    let state = AppState {
        submission_service,
        allowed_products: config.product_allowlist().into(),
    };

    let submit_routes = Router::new()
        .route(SUBMIT_PATH, any(submissions::submit_form))
        .route(LEGACY_SUBMIT_PATH, any(submissions::submit_form))
        .layer(GovernorLayer::new(governor_conf))
        .layer(from_fn_with_state(RateLimitMetrics::new(), json_rate_limit_errors))
        .layer(DefaultBodyLimit::max(config.server.max_body_bytes));

    Ok(Router::new()
        .route("/livez", get(health::livez))
        .merge(submit_routes)
        .layer(TimeoutLayer::new(Duration::from_secs(config.server.request_timeout_secs)))
        .layer(from_fn(json_timeout_errors))
        .layer(PropagateRequestIdLayer::new(axum::http::HeaderName::from_static("x-request-id")))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(move |request: &Request<Body>| {
                    let request_id = request
                        .extensions()
                        .get::<tower_http::request_id::RequestId>()
                        .map(|id| id.header_value().to_str().unwrap_or_default())
                        .unwrap_or_default()
                        .to_string();

                    tracing::info_span!(
                        "request",
                        "request_id" = %request_id,
                        "http.request.method" = %request.method(),
                        "url.path" = %request.uri().path(),
                        "http.response.status_code" = tracing::field::Empty,
                        "otel.kind" = "server",
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: Duration, _span: &tracing::Span| {
                        let status = response.status();
                        tracing::Span::current().record("http.response.status_code", status.as_u16());

                        tracing::info!(
                            latency_ms = %latency.as_millis(),
                            status = %status.as_u16(),
                            "request completed"
                        );
                    },
                )
                .on_failure(|error, _latency, _span: &tracing::Span| {
                    tracing::error!(error = %error, "request failed");
                }),
        )
        .layer(SetRequestIdLayer::new(axum::http::HeaderName::from_static("x-request-id"), MakeRequestUuid))
        .with_state(state))
}

/// The timeout layer answers with an empty 408; give it the usual JSON error body.
async fn json_timeout_errors(req: Request<Body>, next: Next) -> Response {
    let response = next.run(req).await;
    if response.status() == StatusCode::REQUEST_TIMEOUT {
        return AppError::RequestTimeout.into_response();
    }
    response
}
