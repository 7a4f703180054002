use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::InternalError,
    Error, HttpResponse,
};
use futures::future::LocalBoxFuture;
use std::collections::HashMap;
use std::future::{ready, Ready};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::api::metrics;

#[derive(Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimitConfig {
    /// Global middleware policy: 100 requests per 15 minutes
    pub fn from_env() -> Self {
        let max_requests = std::env::var("RATE_LIMIT_MAX")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(100);

        let window_secs = std::env::var("RATE_LIMIT_WINDOW_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(900);

        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    /// Per-route policy for the analytics ingest: 100 requests per 60 seconds.
    /// Independent from the global limiter, no shared state.
    pub fn analytics_from_env() -> Self {
        let max_requests = std::env::var("ANALYTICS_RATE_LIMIT_MAX")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(100);

        let window_secs = std::env::var("ANALYTICS_RATE_LIMIT_WINDOW_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);

        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }
}

struct Bucket {
    count: u32,
    window_start: Instant,
}

/// In-memory per-client request counter. Counters live in this process only;
/// multiple server instances each keep their own map.
pub struct RateLimiter {
    config: RateLimitConfig,
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Ok(()) when the request is allowed, Err(retry_after_secs) when the
    /// client exhausted its window.
    pub fn check(&self, key: &str) -> Result<(), u64> {
        let mut buckets = match self.buckets.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let now = Instant::now();

        // Evict elapsed windows so the map does not grow with stale clients
        let window = self.config.window;
        buckets.retain(|_, bucket| now.duration_since(bucket.window_start) < window);

        match buckets.get_mut(key) {
            Some(bucket) => {
                if bucket.count >= self.config.max_requests {
                    let elapsed = now.duration_since(bucket.window_start);
                    let retry_after = window.saturating_sub(elapsed).as_secs().max(1);
                    Err(retry_after)
                } else {
                    bucket.count += 1;
                    Ok(())
                }
            }
            None => {
                buckets.insert(
                    key.to_string(),
                    Bucket {
                        count: 1,
                        window_start: now,
                    },
                );
                Ok(())
            }
        }
    }
}

lazy_static::lazy_static! {
    // Process-wide counters used by the global middleware
    static ref GLOBAL_LIMITER: RateLimiter = RateLimiter::new(RateLimitConfig::from_env());
}

/// Client identity for rate limiting: first X-Forwarded-For hop, else the
/// peer address, else a sentinel.
pub fn client_key(req: &ServiceRequest) -> String {
    if let Some(forwarded) = req.headers().get("x-forwarded-for") {
        if let Ok(value) = forwarded.to_str() {
            if let Some(first) = value.split(',').next() {
                let ip = first.trim();
                if !ip.is_empty() {
                    return ip.to_string();
                }
            }
        }
    }

    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn too_many_requests(retry_after: u64) -> HttpResponse {
    HttpResponse::TooManyRequests()
        .insert_header(("Retry-After", retry_after.to_string()))
        .json(serde_json::json!({
            "success": false,
            "error": "Too many requests. Please try again later."
        }))
}

pub struct RateLimit;

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitService { service }))
    }
}

pub struct RateLimitService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RateLimitService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        metrics::increment_request_count();

        // Liveness probes are exempt
        if req.path() == "/health" {
            let fut = self.service.call(req);
            return Box::pin(async move {
                let res = fut.await?;
                Ok(res)
            });
        }

        let key = client_key(&req);

        match GLOBAL_LIMITER.check(&key) {
            Ok(()) => {
                let fut = self.service.call(req);
                Box::pin(async move {
                    let res = fut.await?;
                    Ok(res)
                })
            }
            Err(retry_after) => {
                log::warn!("🚦 Rate limit exceeded for {}", key);
                metrics::increment_rate_limited_count();
                let response = too_many_requests(retry_after);
                Box::pin(async move {
                    Err(InternalError::from_response("rate limit exceeded", response).into())
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    fn limiter(max: u32, window_secs: u64) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            max_requests: max,
            window: Duration::from_secs(window_secs),
        })
    }

    #[test]
    fn test_allows_up_to_max_then_rejects() {
        let limiter = limiter(3, 60);
        assert!(limiter.check("1.2.3.4").is_ok());
        assert!(limiter.check("1.2.3.4").is_ok());
        assert!(limiter.check("1.2.3.4").is_ok());
        // 4th request in the window is rejected
        let rejected = limiter.check("1.2.3.4");
        assert!(rejected.is_err());
        assert!(rejected.unwrap_err() >= 1);
    }

    #[test]
    fn test_clients_are_counted_independently() {
        let limiter = limiter(1, 60);
        assert!(limiter.check("1.1.1.1").is_ok());
        assert!(limiter.check("2.2.2.2").is_ok());
        assert!(limiter.check("1.1.1.1").is_err());
    }

    #[test]
    fn test_window_reset_allows_again() {
        let limiter = limiter(1, 1);
        assert!(limiter.check("9.9.9.9").is_ok());
        assert!(limiter.check("9.9.9.9").is_err());
        std::thread::sleep(Duration::from_millis(1100));
        assert!(limiter.check("9.9.9.9").is_ok());
    }

    #[test]
    fn test_stale_buckets_are_evicted() {
        let limiter = limiter(5, 1);
        limiter.check("a").ok();
        limiter.check("b").ok();
        std::thread::sleep(Duration::from_millis(1100));
        limiter.check("c").ok();
        let buckets = limiter.buckets.lock().unwrap();
        assert!(!buckets.contains_key("a"));
        assert!(!buckets.contains_key("b"));
        assert!(buckets.contains_key("c"));
    }

    #[test]
    fn test_client_key_prefers_forwarded_header() {
        let req = TestRequest::default()
            .insert_header(("x-forwarded-for", "203.0.113.7, 10.0.0.1"))
            .to_srv_request();
        assert_eq!(client_key(&req), "203.0.113.7");
    }

    #[test]
    fn test_client_key_falls_back_to_sentinel() {
        let req = TestRequest::default().to_srv_request();
        // TestRequest has no peer address
        assert_eq!(client_key(&req), "unknown");
    }
}
