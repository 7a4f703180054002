use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::InternalError,
    Error, HttpResponse,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};

const BOT_MARKERS: [&str; 6] = [
    "bot",
    "crawler",
    "spider",
    "scraper",
    "python-requests",
    "curl",
];

// Search-engine crawlers that stay welcome
const ALLOWED_BOTS: [&str; 4] = ["googlebot", "bingbot", "duckduckbot", "applebot"];

/// True when the user agent looks like an automated client that is not on
/// the allow list. Requests without a User-Agent pass through.
pub fn is_blocked_agent(user_agent: &str) -> bool {
    let ua = user_agent.to_lowercase();

    if ALLOWED_BOTS.iter().any(|allowed| ua.contains(allowed)) {
        return false;
    }

    BOT_MARKERS.iter().any(|marker| ua.contains(marker))
}

pub struct BotGuard;

impl<S, B> Transform<S, ServiceRequest> for BotGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = BotGuardService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(BotGuardService { service }))
    }
}

pub struct BotGuardService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for BotGuardService<S>
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
        let blocked = req
            .headers()
            .get("User-Agent")
            .and_then(|value| value.to_str().ok())
            .map(is_blocked_agent)
            .unwrap_or(false);

        if blocked {
            let response = HttpResponse::Forbidden().json(serde_json::json!({
                "success": false,
                "error": "Automated clients are not allowed"
            }));
            return Box::pin(async move {
                Err(InternalError::from_response("blocked user agent", response).into())
            });
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test as actix_test, web, App, HttpResponse};

    #[test]
    fn test_browser_agents_pass() {
        assert!(!is_blocked_agent(
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36"
        ));
    }

    #[test]
    fn test_scrapers_are_blocked() {
        assert!(is_blocked_agent("curl/8.4.0"));
        assert!(is_blocked_agent("python-requests/2.31"));
        assert!(is_blocked_agent("SomeScraperBot/1.0"));
    }

    #[test]
    fn test_allow_listed_crawlers_pass() {
        assert!(!is_blocked_agent(
            "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)"
        ));
        assert!(!is_blocked_agent("Mozilla/5.0 (compatible; bingbot/2.0)"));
    }

    #[actix_rt::test]
    async fn test_middleware_rejects_bots_with_403() {
        let app = actix_test::init_service(
            App::new()
                .wrap(BotGuard)
                .route("/ping", web::get().to(|| async { HttpResponse::Ok().body("pong") })),
        )
        .await;

        let blocked = actix_test::TestRequest::get()
            .uri("/ping")
            .insert_header(("User-Agent", "curl/8.4.0"))
            .to_request();
        let err = actix_test::try_call_service(&app, blocked)
            .await
            .expect_err("bot request should be rejected");
        assert_eq!(err.error_response().status().as_u16(), 403);

        let allowed = actix_test::TestRequest::get()
            .uri("/ping")
            .insert_header(("User-Agent", "Mozilla/5.0"))
            .to_request();
        let resp = actix_test::call_service(&app, allowed).await;
        assert!(resp.status().is_success());
    }
}
