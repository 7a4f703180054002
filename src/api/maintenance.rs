use actix_web::{web, HttpRequest, HttpResponse};

use crate::database::MongoDB;
use crate::services::rating_service;

fn cron_secret_is_valid(req: &HttpRequest) -> bool {
    let secret = match std::env::var("CRON_SECRET") {
        Ok(secret) if !secret.is_empty() => secret,
        _ => return false,
    };

    req.headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(|token| token == secret)
        .unwrap_or(false)
}

/// Scheduled maintenance: recompute the denormalized rating aggregates for
/// every recipe. Gated by the cron secret, not user JWTs.
pub async fn recompute_ratings(db: web::Data<MongoDB>, req: HttpRequest) -> HttpResponse {
    if !cron_secret_is_valid(&req) {
        log::warn!("❌ Maintenance call rejected: bad cron secret");
        return HttpResponse::Forbidden().json(serde_json::json!({
            "success": false,
            "error": "Forbidden"
        }));
    }

    log::info!("🔧 POST /maintenance/recompute-ratings");

    match rating_service::recompute_all(&db).await {
        Ok(updated) => {
            log::info!("✅ Rating aggregates recomputed for {} recipes", updated);
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "recipes_updated": updated
            }))
        }
        Err(e) => e.to_response(),
    }
}
