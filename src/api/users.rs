use actix_web::{web, HttpRequest, HttpResponse};

use crate::api::recipes::PageQuery;
use crate::database::MongoDB;
use crate::models::{UpdateProfileRequest, UserProfileResponse};
use crate::services::auth_service::Claims;
use crate::services::{auth_service, user_service};
use crate::utils::pagination;

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    tag = "Users",
    params(
        ("id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Public profile", body = UserProfileResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_profile(
    db: web::Data<MongoDB>,
    req: HttpRequest,
    path: web::Path<String>,
) -> HttpResponse {
    let user_id = path.into_inner();
    let claims = auth_service::claims_from_request(&req);
    let viewer = claims.as_ref().map(|c| c.sub.as_str());

    match user_service::get_profile(&db, &user_id, viewer).await {
        Ok(profile) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "profile": profile
        })),
        Err(e) => e.to_response(),
    }
}

pub async fn update_me(
    db: web::Data<MongoDB>,
    req: HttpRequest,
    request: web::Json<UpdateProfileRequest>,
) -> HttpResponse {
    let claims = match auth_service::require_claims(&req) {
        Ok(claims) => claims,
        Err(e) => return e.to_response(),
    };

    log::info!("👤 PUT /users/me - user: {}", claims.sub);

    match user_service::update_profile(&db, &claims.sub, request.into_inner()).await {
        Ok(profile) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "profile": profile
        })),
        Err(e) => e.to_response(),
    }
}

/// Activity feed: recent published recipes from followed users
pub async fn get_feed(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    query: web::Query<PageQuery>,
) -> HttpResponse {
    let page = pagination::clamp_page(query.page);
    let limit = pagination::clamp_limit(query.limit);

    match user_service::feed(&db, &claims.sub, page, limit).await {
        Ok((recipes, pagination)) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "recipes": recipes,
            "pagination": pagination
        })),
        Err(e) => e.to_response(),
    }
}
