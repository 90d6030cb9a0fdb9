//! Per-client fixed-window rate limiting.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use moka::sync::Cache;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::error::ApiError;

static RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
static RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
static RATELIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");

const MAX_TRACKED_CLIENTS: u64 = 100_000;

/// moka rejects TTLs above 1000 years.
const MAX_WINDOW: Duration = Duration::from_secs(365 * 24 * 3600);

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    hits: u32,
}

/// Outcome of counting one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_after: Duration,
}

impl RateDecision {
    fn apply_headers(&self, headers: &mut HeaderMap) {
        headers.insert(RATELIMIT_LIMIT.clone(), HeaderValue::from(self.limit));
        headers.insert(RATELIMIT_REMAINING.clone(), HeaderValue::from(self.remaining));
        headers.insert(RATELIMIT_RESET.clone(), HeaderValue::from(self.reset_after.as_secs()));
    }
}

/// Allows `max_requests` per client IP in each `window`.
///
/// Windows live in a moka cache whose TTL equals the window length, so a
/// client's entry is evicted once its window is over.
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    clients: Cache<IpAddr, Arc<Mutex<Window>>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        let window = window.min(MAX_WINDOW);
        Self {
            max_requests,
            window,
            clients: Cache::builder().max_capacity(MAX_TRACKED_CLIENTS).time_to_live(window).build(),
        }
    }

    pub fn check(&self, client: IpAddr) -> RateDecision {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: IpAddr, now: Instant) -> RateDecision {
        let entry = self
            .clients
            .get_with(client, || Arc::new(Mutex::new(Window { started: now, hits: 0 })));
        let mut window = entry.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if now.saturating_duration_since(window.started) >= self.window {
            *window = Window { started: now, hits: 0 };
        }
        window.hits = window.hits.saturating_add(1);

        RateDecision {
            allowed: window.hits <= self.max_requests,
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(window.hits),
            reset_after: self.window.saturating_sub(now.saturating_duration_since(window.started)),
        }
    }

    /// Whether `client` still has a live window.
    pub fn is_tracked(&self, client: IpAddr) -> bool {
        self.clients.contains_key(&client)
    }
}

/// Rejects clients over their quota with 429 and advertises the quota via
/// `RateLimit-*` headers on every response.
pub async fn rate_limit_middleware(State(limiter): State<Arc<RateLimiter>>, request: Request, next: Next) -> Response {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    let decision = limiter.check(client);
    let mut response = if decision.allowed {
        next.run(request).await
    } else {
        tracing::warn!(%client, "rate limit exceeded");
        ApiError::too_many_requests("Too many requests").into_response()
    };
    decision.apply_headers(response.headers_mut());
    response
}
