use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::database::MongoDB;
use crate::services::auth_service;
use crate::services::auth_service::{AuthResponse, LoginRequest, RegisterRequest, UserInfo};

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    db: web::Data<MongoDB>,
    request: web::Json<auth_service::LoginRequest>,
) -> HttpResponse {
    log::info!("🔐 POST /auth/login - email: {}", request.email);

    match auth_service::login(&db, &request).await {
        Ok(response) => {
            log::info!("✅ Login successful: {}", request.email);
            HttpResponse::Ok().json(response)
        }
        Err(e) => {
            log::warn!("❌ Login failed: {} - {}", request.email, e);
            e.to_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registration successful", body = AuthResponse),
        (status = 400, description = "Invalid request or user already exists")
    )
)]
pub async fn register(
    db: web::Data<MongoDB>,
    request: web::Json<auth_service::RegisterRequest>,
) -> HttpResponse {
    let email_str = request.email.as_deref().unwrap_or("N/A");
    let provider = request.provider.as_deref().unwrap_or("local");
    log::info!("📝 POST /auth/register - email: {}, provider: {}", email_str, provider);

    match auth_service::register(&db, &request).await {
        Ok(response) => {
            log::info!("✅ Registration successful: {}", email_str);
            HttpResponse::Created().json(response)
        }
        Err(e) => {
            log::warn!("❌ Registration failed: {} - {}", email_str, e);
            e.to_response()
        }
    }
}

pub async fn refresh_token(
    db: web::Data<MongoDB>,
    request: web::Json<auth_service::RefreshTokenRequest>,
) -> HttpResponse {
    log::info!("🔄 POST /auth/refresh");

    match auth_service::refresh_token(&db, &request).await {
        Ok(response) => {
            log::info!("✅ Token refreshed");
            HttpResponse::Ok().json(response)
        }
        Err(e) => {
            log::warn!("❌ Token refresh failed: {}", e);
            e.to_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/verify",
    tag = "Auth",
    responses(
        (status = 200, description = "Token is valid"),
        (status = 401, description = "Invalid or expired token")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn verify_token(req: HttpRequest) -> HttpResponse {
    match auth_service::claims_from_request(&req) {
        Some(claims) => {
            log::info!("✅ Token valid for user: {}", claims.sub);
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "valid": true,
                "user_id": claims.sub,
                "email": claims.email,
                "exp": claims.exp
            }))
        }
        None => HttpResponse::Unauthorized().json(serde_json::json!({
            "success": false,
            "valid": false,
            "error": "Invalid or expired token"
        })),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "User information retrieved", body = UserInfo),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_me(db: web::Data<MongoDB>, req: HttpRequest) -> HttpResponse {
    log::info!("👤 GET /auth/me");

    let claims = match auth_service::require_claims(&req) {
        Ok(claims) => claims,
        Err(e) => return e.to_response(),
    };

    match auth_service::get_current_user(&db, &claims.sub).await {
        Ok(user) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "user": user
        })),
        Err(e) => {
            log::error!("❌ Failed to get user {}: {}", claims.sub, e);
            e.to_response()
        }
    }
}

pub async fn google_auth() -> HttpResponse {
    log::info!("🔐 GET /auth/google - Generating OAuth URL");

    match auth_service::generate_google_oauth_url() {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => {
            log::error!("❌ Failed to generate Google OAuth URL: {}", e);
            e.to_response()
        }
    }
}

#[derive(Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    #[allow(dead_code)]
    state: Option<String>,
    error: Option<String>,
}

pub async fn google_callback(
    db: web::Data<MongoDB>,
    query: web::Query<CallbackQuery>,
) -> HttpResponse {
    log::info!("🔐 GET /auth/callback - Processing Google OAuth");

    let app_url =
        std::env::var("APP_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

    if let Some(error) = &query.error {
        log::error!("❌ OAuth error: {}", error);
        return HttpResponse::Found()
            .append_header((
                "Location",
                format!("{}/auth-callback.html?error={}", app_url, error),
            ))
            .finish();
    }

    let code = match &query.code {
        Some(c) => c,
        None => {
            log::error!("❌ No authorization code provided");
            return HttpResponse::Found()
                .append_header((
                    "Location",
                    format!("{}/auth-callback.html?error=no_code", app_url),
                ))
                .finish();
        }
    };

    match auth_service::handle_google_callback(&db, code).await {
        Ok(response) => {
            log::info!("✅ Google OAuth successful for user {}", response.user.id);

            let redirect_url = format!(
                "{}/auth-callback.html?access_token={}&user_id={}&email={}&name={}",
                app_url,
                response.token,
                urlencoding::encode(&response.user.id),
                urlencoding::encode(&response.user.email),
                urlencoding::encode(response.user.name.as_deref().unwrap_or(""))
            );

            HttpResponse::Found()
                .append_header(("Location", redirect_url))
                .finish()
        }
        Err(e) => {
            log::error!("❌ Google OAuth failed: {}", e);
            HttpResponse::Found()
                .append_header((
                    "Location",
                    format!(
                        "{}/auth-callback.html?error={}",
                        app_url,
                        urlencoding::encode(&e.to_string())
                    ),
                ))
                .finish()
        }
    }
}

/// Deletes the caller's account and all associated data
pub async fn delete_account(db: web::Data<MongoDB>, req: HttpRequest) -> HttpResponse {
    log::info!("🗑️ DELETE /auth/delete-account");

    let claims = match auth_service::require_claims(&req) {
        Ok(claims) => claims,
        Err(e) => return e.to_response(),
    };

    match auth_service::delete_user_account(&db, &claims.sub).await {
        Ok(()) => {
            log::info!("✅ Account deleted successfully: {}", claims.sub);
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "message": "Account deleted successfully"
            }))
        }
        Err(e) => {
            log::error!("❌ Failed to delete account {}: {}", claims.sub, e);
            e.to_response()
        }
    }
}
