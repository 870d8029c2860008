use crate::error::AppError;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use ipnetwork::IpNetwork;
use opentelemetry::{KeyValue, global, metrics::Counter};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tower_governor::GovernorError;
use tower_governor::key_extractor::KeyExtractor;

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Networks of the reverse proxies allowed to tell us who the submitter is.
#[derive(Clone, Debug, Default)]
pub struct TrustedProxies(Arc<[IpNetwork]>);

impl TrustedProxies {
    #[must_use]
    pub fn new(networks: impl IntoIterator<Item = IpNetwork>) -> Self {
        Self(networks.into_iter().collect())
    }

    #[must_use]
    pub fn contains(&self, ip: IpAddr) -> bool {
        self.0.iter().any(|net| net.contains(ip))
    }

    /// Resolves the submitter address for a connection from `peer`.
    ///
    /// A forwarded chain is only read when `peer` is one of our proxies. The chain is
    /// scanned from the nearest hop outward and the first address outside our proxies
    /// wins; if every hop is ours, the peer is used.
    #[must_use]
    pub fn resolve(&self, peer: IpAddr, forwarded_for: Option<&str>) -> IpAddr {
        if !self.contains(peer) {
            return peer;
        }
        forwarded_for
            .into_iter()
            .flat_map(|chain| chain.rsplit(','))
            .filter_map(|hop| hop.trim().parse::<IpAddr>().ok())
            .find(|hop| !self.contains(*hop))
            .unwrap_or(peer)
    }
}

/// Rate limit key: one bucket per resolved submitter address.
#[derive(Clone, Debug)]
pub struct SubmitterKey {
    proxies: TrustedProxies,
}

impl SubmitterKey {
    #[must_use]
    pub const fn new(proxies: TrustedProxies) -> Self {
        Self { proxies }
    }
}

impl KeyExtractor for SubmitterKey {
    type Key = IpAddr;

    fn extract<T>(&self, req: &axum::http::Request<T>) -> Result<Self::Key, GovernorError> {
        let Some(ConnectInfo(peer)) = req.extensions().get::<ConnectInfo<SocketAddr>>() else {
            return Err(GovernorError::UnableToExtractKey);
        };
        let forwarded_for = req.headers().get(X_FORWARDED_FOR).and_then(|v| v.to_str().ok());
        Ok(self.proxies.resolve(peer.ip(), forwarded_for))
    }
}

#[derive(Clone, Debug)]
pub struct Metrics {
    pub decisions_total: Counter<u64>,
}

impl Metrics {
    #[must_use]
    pub fn new() -> Self {
        let meter = global::meter("lead-intake-server");
        Self {
            decisions_total: meter
                .u64_counter("lead_rate_limit_decisions_total")
                .with_description("Rate limit decisions (allowed/throttled)")
                .build(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Counts limiter decisions and replaces its plain-text 429 with the JSON error body,
/// keeping the rate limit headers.
pub async fn json_rate_limit_errors(State(metrics): State<Metrics>, req: Request, next: Next) -> Response {
    let response = next.run(req).await;
    if response.status() != StatusCode::TOO_MANY_REQUESTS {
        metrics.decisions_total.add(1, &[KeyValue::new("decision", "allowed")]);
        return response;
    }

    metrics.decisions_total.add(1, &[KeyValue::new("decision", "throttled")]);
    tracing::warn!("Submission rate limit exceeded");

    let mut json = AppError::TooManyRequests.into_response();
    for name in ["retry-after", "x-ratelimit-after", "x-ratelimit-limit", "x-ratelimit-remaining"] {
        if let Some(value) = response.headers().get(name) {
            json.headers_mut().insert(name, value.clone());
        }
    }
    json
}
