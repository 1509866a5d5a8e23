use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::{MatchedPath, RawPathParams, State};
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use dashmap::DashMap;
use tracing::debug;

use crate::application::ports::{RateDecision, RequestLimiter};
use crate::domain::types::SearchKind;

use super::error::ApiError;
use super::session::{ClientAddr, MaybeUser};
use super::state::HttpState;

/// Sliding-window limiter keyed by `caller:route`, held in process memory.
///
/// Buckets with no request inside the window are dropped once per window.
#[derive(Debug, Clone)]
pub struct InMemoryRateLimiter {
    window: Duration,
    max_requests: u32,
    buckets: Arc<DashMap<String, Vec<Instant>>>,
    last_sweep: Arc<Mutex<Option<Instant>>>,
}

impl InMemoryRateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
            buckets: Arc::new(DashMap::new()),
            last_sweep: Arc::new(Mutex::new(None)),
        }
    }

    fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    fn sweep_if_due(&self, now: Instant) {
        let Ok(mut last_sweep) = self.last_sweep.lock() else {
            return;
        };
        let Some(last) = *last_sweep else {
            *last_sweep = Some(now);
            return;
        };
        if now.duration_since(last) < self.window {
            return;
        }
        *last_sweep = Some(now);
        drop(last_sweep);

        let window = self.window;
        self.buckets.retain(|_, hits| {
            hits.retain(|instant| now.duration_since(*instant) < window);
            !hits.is_empty()
        });
    }

    fn check_at(&self, caller: &str, route: &str, now: Instant) -> RateDecision {
        self.sweep_if_due(now);

        let bucket_key = format!("{caller}:{route}");
        let window = self.window;

        let mut entry = self.buckets.entry(bucket_key).or_default();
        entry.retain(|instant| now.duration_since(*instant) < window);

        let used = u32::try_from(entry.len()).unwrap_or(u32::MAX);
        if used >= self.max_requests {
            let oldest = entry.first().copied().unwrap_or(now);
            let wait = window.saturating_sub(now.duration_since(oldest));
            return RateDecision::Limited {
                retry_after_secs: wait.as_secs_f64().ceil().max(1.0) as u64,
            };
        }

        entry.push(now);
        RateDecision::Allowed {
            remaining: self.max_requests - used - 1,
        }
    }
}

impl RequestLimiter for InMemoryRateLimiter {
    fn check(&self, caller: &str, route: &str) -> RateDecision {
        self.check_at(caller, route, Instant::now())
    }

    fn limit(&self) -> u32 {
        self.max_requests
    }
}

/// Route template with each `{kind}` segment replaced by its canonical search
/// kind, so aliases share a bucket and arbitrary paths cannot mint new ones.
fn bucket_route(template: &str, params: &RawPathParams) -> String {
    let kind = params
        .iter()
        .find(|(name, _)| *name == "kind")
        .map(|(_, value)| SearchKind::from_path(value).map_or("unknown", |kind| kind.as_str()));
    match kind {
        Some(kind) => template.replace("{kind}", kind),
        None => template.to_string(),
    }
}

/// Signed-in callers are limited by user id, everyone else by address.
pub async fn limit_requests(
    State(state): State<HttpState>,
    MaybeUser(user): MaybeUser,
    ClientAddr(addr): ClientAddr,
    matched: MatchedPath,
    params: RawPathParams,
    request: Request<Body>,
    next: Next,
) -> Response {
    let caller = match user {
        Some(user) => format!("user:{}", user.id),
        None => format!("addr:{addr}"),
    };
    let route = bucket_route(matched.as_str(), &params);

    match state.limiter.check(&caller, &route) {
        RateDecision::Allowed { .. } => next.run(request).await,
        RateDecision::Limited { retry_after_secs } => {
            debug!(
                target = "creatorhub::http::rate_limit",
                caller = %caller,
                route = %route,
                retry_after_secs,
                "Request rate limited"
            );
            ApiError::rate_limited(retry_after_secs)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_the_request_after_the_limit() {
        let limiter = InMemoryRateLimiter::new(Duration::from_secs(60), 2);
        let now = Instant::now();

        assert_eq!(
            limiter.check_at("a", "/api/search/movie", now),
            RateDecision::Allowed { remaining: 1 }
        );
        assert_eq!(
            limiter.check_at("a", "/api/search/movie", now),
            RateDecision::Allowed { remaining: 0 }
        );
        assert!(matches!(
            limiter.check_at("a", "/api/search/movie", now),
            RateDecision::Limited { retry_after_secs: 60 }
        ));
        assert!(matches!(
            limiter.check_at("b", "/api/search/movie", now),
            RateDecision::Allowed { .. }
        ));
    }

    #[test]
    fn window_slides() {
        let limiter = InMemoryRateLimiter::new(Duration::from_secs(10), 1);
        let start = Instant::now();

        assert!(matches!(
            limiter.check_at("a", "/r", start),
            RateDecision::Allowed { .. }
        ));
        assert!(matches!(
            limiter.check_at("a", "/r", start + Duration::from_secs(4)),
            RateDecision::Limited { retry_after_secs: 6 }
        ));
        assert!(matches!(
            limiter.check_at("a", "/r", start + Duration::from_secs(10)),
            RateDecision::Allowed { .. }
        ));
    }

    #[test]
    fn idle_buckets_are_swept() {
        let limiter = InMemoryRateLimiter::new(Duration::from_secs(10), 5);
        let start = Instant::now();

        for caller in ["a", "b", "c"] {
            limiter.check_at(caller, "/r", start);
        }
        assert_eq!(limiter.bucket_count(), 3);

        limiter.check_at("d", "/r", start + Duration::from_secs(11));
        assert_eq!(limiter.bucket_count(), 1);
    }
}
