use actix_web::{web, HttpRequest, HttpResponse};

use crate::database::MongoDB;
use crate::services::{auth_service, social_service};

// Edge writes respond 200; only resource creation (recipes, ratings) uses 201.

fn following_response(is_following: bool) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "is_following": is_following
    }))
}

fn saved_response(is_saved: bool) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "is_saved": is_saved
    }))
}

pub async fn follow_user(
    db: web::Data<MongoDB>,
    req: HttpRequest,
    path: web::Path<String>,
) -> HttpResponse {
    let claims = match auth_service::require_claims(&req) {
        Ok(claims) => claims,
        Err(e) => return e.to_response(),
    };
    let target_id = path.into_inner();

    log::info!("➕ POST /users/{}/follow - user: {}", target_id, claims.sub);

    match social_service::follow_user(&db, &claims.sub, &target_id).await {
        Ok(()) => following_response(true),
        Err(e) => e.to_response(),
    }
}

pub async fn unfollow_user(
    db: web::Data<MongoDB>,
    req: HttpRequest,
    path: web::Path<String>,
) -> HttpResponse {
    let claims = match auth_service::require_claims(&req) {
        Ok(claims) => claims,
        Err(e) => return e.to_response(),
    };
    let target_id = path.into_inner();

    match social_service::unfollow_user(&db, &claims.sub, &target_id).await {
        Ok(()) => following_response(false),
        Err(e) => e.to_response(),
    }
}

/// Follow status. Anonymous callers get `false`, never an error.
pub async fn follow_status(
    db: web::Data<MongoDB>,
    req: HttpRequest,
    path: web::Path<String>,
) -> HttpResponse {
    let target_id = path.into_inner();
    let claims = auth_service::claims_from_request(&req);
    let viewer = claims.as_ref().map(|c| c.sub.as_str());

    match social_service::is_following(&db, viewer, &target_id).await {
        Ok(is_following) => following_response(is_following),
        Err(e) => e.to_response(),
    }
}

pub async fn save_recipe(
    db: web::Data<MongoDB>,
    req: HttpRequest,
    path: web::Path<String>,
) -> HttpResponse {
    let claims = match auth_service::require_claims(&req) {
        Ok(claims) => claims,
        Err(e) => return e.to_response(),
    };
    let recipe_id = path.into_inner();

    log::info!("🔖 POST /recipes/{}/save - user: {}", recipe_id, claims.sub);

    match social_service::save_recipe(&db, &claims.sub, &recipe_id).await {
        Ok(()) => saved_response(true),
        Err(e) => e.to_response(),
    }
}

pub async fn unsave_recipe(
    db: web::Data<MongoDB>,
    req: HttpRequest,
    path: web::Path<String>,
) -> HttpResponse {
    let claims = match auth_service::require_claims(&req) {
        Ok(claims) => claims,
        Err(e) => return e.to_response(),
    };
    let recipe_id = path.into_inner();

    match social_service::unsave_recipe(&db, &claims.sub, &recipe_id).await {
        Ok(()) => saved_response(false),
        Err(e) => e.to_response(),
    }
}

pub async fn save_status(
    db: web::Data<MongoDB>,
    req: HttpRequest,
    path: web::Path<String>,
) -> HttpResponse {
    let recipe_id = path.into_inner();
    let claims = auth_service::claims_from_request(&req);
    let viewer = claims.as_ref().map(|c| c.sub.as_str());

    match social_service::is_saved(&db, viewer, &recipe_id).await {
        Ok(is_saved) => saved_response(is_saved),
        Err(e) => e.to_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_writes_respond_200() {
        assert_eq!(following_response(true).status().as_u16(), 200);
        assert_eq!(following_response(false).status().as_u16(), 200);
        assert_eq!(saved_response(true).status().as_u16(), 200);
        assert_eq!(saved_response(false).status().as_u16(), 200);
    }
}
