use actix_web::{web, HttpRequest, HttpResponse};
use mongodb::bson::doc;
use serde::Deserialize;

use crate::database::MongoDB;
use crate::middleware::RateLimiter;
use crate::services::auth_service;

#[derive(Debug, Deserialize)]
pub struct AnalyticsEventRequest {
    pub event: String,
    pub properties: Option<serde_json::Value>,
}

/// Ingest a raw analytics event. This route has its own rate limiter,
/// tighter than the global one and sharing no state with it.
pub async fn record_event(
    db: web::Data<MongoDB>,
    limiter: web::Data<RateLimiter>,
    req: HttpRequest,
    request: web::Json<AnalyticsEventRequest>,
) -> HttpResponse {
    let connection_info = req.connection_info().clone();
    let key = connection_info.realip_remote_addr().unwrap_or("unknown");

    if let Err(retry_after) = limiter.check(key) {
        log::warn!("🚦 Analytics rate limit exceeded for {}", key);
        crate::api::metrics::increment_rate_limited_count();
        return HttpResponse::TooManyRequests()
            .insert_header(("Retry-After", retry_after.to_string()))
            .json(serde_json::json!({
                "success": false,
                "error": "Too many requests. Please try again later."
            }));
    }

    let event = request.event.trim();
    if event.is_empty() || event.chars().count() > 100 {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": "Event name must be between 1 and 100 characters"
        }));
    }

    let properties = match &request.properties {
        Some(value) => match mongodb::bson::to_bson(value) {
            Ok(bson) => bson,
            Err(_) => {
                return HttpResponse::BadRequest().json(serde_json::json!({
                    "success": false,
                    "error": "Invalid event properties"
                }));
            }
        },
        None => mongodb::bson::Bson::Null,
    };

    // Events are accepted from anonymous callers; the user id is attached
    // when a valid token happens to be present
    let user_id = auth_service::claims_from_request(&req).map(|claims| claims.sub);

    let document = doc! {
        "event": event,
        "user_id": user_id,
        "properties": properties,
        "created_at": chrono::Utc::now().timestamp(),
    };

    match db
        .collection::<mongodb::bson::Document>("analytics_events")
        .insert_one(document)
        .await
    {
        Ok(_) => HttpResponse::Created().json(serde_json::json!({
            "success": true
        })),
        Err(e) => crate::utils::error::AppError::from(e).to_response(),
    }
}
