use actix_web::{web, HttpRequest, HttpResponse};
use mongodb::bson::{doc, DateTime as BsonDateTime};
use serde::Deserialize;

use crate::database::MongoDB;
use crate::models::User;
use crate::services::auth_service;
use crate::utils::error::AppError;

#[derive(Debug, Deserialize)]
pub struct IdentityWebhookUser {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IdentityWebhookPayload {
    pub event: String,
    pub user: IdentityWebhookUser,
}

fn signature_is_valid(req: &HttpRequest, secret: &str) -> bool {
    req.headers()
        .get("X-Webhook-Signature")
        .and_then(|value| value.to_str().ok())
        .map(|signature| signature == secret)
        .unwrap_or(false)
}

/// Identity-provider sync: keeps the local users collection in step with the
/// upstream identity system.
pub async fn identity_webhook(
    db: web::Data<MongoDB>,
    req: HttpRequest,
    payload: web::Json<IdentityWebhookPayload>,
) -> HttpResponse {
    let secret = match std::env::var("WEBHOOK_SECRET") {
        Ok(secret) if !secret.is_empty() => secret,
        _ => {
            log::error!("❌ WEBHOOK_SECRET not configured");
            return AppError::Database("WEBHOOK_SECRET not configured".to_string()).to_response();
        }
    };

    if !signature_is_valid(&req, &secret) {
        log::warn!("❌ Webhook rejected: invalid signature");
        return HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": "Invalid webhook signature"
        }));
    }

    log::info!("🔔 Webhook received: {} for user {}", payload.event, payload.user.id);

    let result = match payload.event.as_str() {
        "user.created" | "user.updated" => upsert_user(&db, &payload.user).await,
        "user.deleted" => match auth_service::delete_user_account(&db, &payload.user.id).await {
            // Deletes are idempotent from the provider's point of view
            Err(AppError::NotFound(_)) => {
                log::warn!("⚠️ Webhook delete for unknown user {}", payload.user.id);
                Ok(())
            }
            other => other,
        },
        other => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "error": format!("Unknown event type: {}", other)
            }));
        }
    };

    match result {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "success": true
        })),
        Err(e) => e.to_response(),
    }
}

async fn upsert_user(db: &MongoDB, user: &IdentityWebhookUser) -> Result<(), AppError> {
    let mut set_doc = doc! {
        "name": user.name.clone(),
        "picture": user.picture.clone(),
        "updated_at": BsonDateTime::now(),
    };
    if let Some(email) = &user.email {
        set_doc.insert("email", email);
    }

    db.collection::<User>("users")
        .update_one(
            doc! { "user_id": &user.id },
            doc! {
                "$set": set_doc,
                "$setOnInsert": {
                    "user_id": &user.id,
                    "provider": "identity",
                    "is_private": false,
                    "is_active": true,
                    "created_at": BsonDateTime::now(),
                },
            },
        )
        .upsert(true)
        .await?;

    Ok(())
}
