use actix_web::{web, HttpResponse, Responder};
use mongodb::bson::doc;
use serde::{Deserialize, Serialize};

use crate::database::MongoDB;

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: i64,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        service: "recipe-service".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().timestamp(),
    })
}

/// Readiness probe: actually round-trips to MongoDB, unlike the liveness
/// check above.
#[utoipa::path(
    get,
    path = "/api/v1/database/health",
    tag = "Health",
    responses(
        (status = 200, description = "Database is reachable"),
        (status = 503, description = "Database is unavailable")
    )
)]
pub async fn database_health(db: web::Data<MongoDB>) -> HttpResponse {
    match db.database().run_command(doc! { "ping": 1 }).await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "status": "ready",
            "timestamp": chrono::Utc::now().timestamp()
        })),
        Err(e) => {
            log::error!("❌ Database health check failed: {}", e);
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "success": false,
                "error": "Database unavailable"
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};

    #[actix_rt::test]
    async fn test_health_check_reports_healthy() {
        let app =
            test::init_service(App::new().route("/health", web::get().to(health_check))).await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: HealthResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body.status, "healthy");
        assert_eq!(body.service, "recipe-service");
    }
}
