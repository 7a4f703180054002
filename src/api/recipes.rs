use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::database::MongoDB;
use crate::models::{CreateRecipeRequest, RateRecipeRequest, RecipeResponse, UpdateRecipeRequest};
use crate::services::{auth_service, rating_service, recipe_service};
use crate::utils::pagination;

#[derive(Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/api/v1/recipes",
    tag = "Recipes",
    responses(
        (status = 200, description = "Published recipes, newest first")
    )
)]
pub async fn list_recipes(db: web::Data<MongoDB>, query: web::Query<PageQuery>) -> HttpResponse {
    let page = pagination::clamp_page(query.page);
    let limit = pagination::clamp_limit(query.limit);

    match recipe_service::list_published(&db, page, limit).await {
        Ok((recipes, pagination)) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "recipes": recipes,
            "pagination": pagination
        })),
        Err(e) => e.to_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/recipes",
    tag = "Recipes",
    request_body = CreateRecipeRequest,
    responses(
        (status = 201, description = "Recipe created", body = RecipeResponse),
        (status = 400, description = "Invalid recipe"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_recipe(
    db: web::Data<MongoDB>,
    req: HttpRequest,
    request: web::Json<CreateRecipeRequest>,
) -> HttpResponse {
    let claims = match auth_service::require_claims(&req) {
        Ok(claims) => claims,
        Err(e) => return e.to_response(),
    };

    log::info!("🍳 POST /recipes - user: {}", claims.sub);

    match recipe_service::create_recipe(&db, &claims.sub, request.into_inner()).await {
        Ok(recipe) => HttpResponse::Created().json(serde_json::json!({
            "success": true,
            "recipe": recipe
        })),
        Err(e) => e.to_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/recipes/{id}",
    tag = "Recipes",
    params(
        ("id" = String, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Recipe found", body = RecipeResponse),
        (status = 404, description = "Recipe not found or not visible")
    )
)]
pub async fn get_recipe(
    db: web::Data<MongoDB>,
    req: HttpRequest,
    path: web::Path<String>,
) -> HttpResponse {
    let recipe_id = path.into_inner();
    // Anonymous callers are fine here; drafts stay invisible to them
    let claims = auth_service::claims_from_request(&req);
    let viewer = claims.as_ref().map(|c| c.sub.as_str());

    match recipe_service::get_recipe(&db, &recipe_id, viewer).await {
        Ok(recipe) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "recipe": recipe
        })),
        Err(e) => e.to_response(),
    }
}

pub async fn update_recipe(
    db: web::Data<MongoDB>,
    req: HttpRequest,
    path: web::Path<String>,
    request: web::Json<UpdateRecipeRequest>,
) -> HttpResponse {
    let claims = match auth_service::require_claims(&req) {
        Ok(claims) => claims,
        Err(e) => return e.to_response(),
    };
    let recipe_id = path.into_inner();

    log::info!("✏️ PUT /recipes/{} - user: {}", recipe_id, claims.sub);

    match recipe_service::update_recipe(&db, &claims.sub, &recipe_id, request.into_inner()).await {
        Ok(recipe) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "recipe": recipe
        })),
        Err(e) => e.to_response(),
    }
}

pub async fn delete_recipe(
    db: web::Data<MongoDB>,
    req: HttpRequest,
    path: web::Path<String>,
) -> HttpResponse {
    let claims = match auth_service::require_claims(&req) {
        Ok(claims) => claims,
        Err(e) => return e.to_response(),
    };
    let recipe_id = path.into_inner();

    log::info!("🗑️ DELETE /recipes/{} - user: {}", recipe_id, claims.sub);

    match recipe_service::delete_recipe(&db, &claims.sub, &recipe_id).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Recipe deleted"
        })),
        Err(e) => e.to_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/recipes/{id}/rating",
    tag = "Recipes",
    params(
        ("id" = String, Path, description = "Recipe ID")
    ),
    request_body = RateRecipeRequest,
    responses(
        (status = 201, description = "Rating recorded", body = crate::models::RatingSummary),
        (status = 400, description = "Rating out of range"),
        (status = 404, description = "Recipe not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn rate_recipe(
    db: web::Data<MongoDB>,
    req: HttpRequest,
    path: web::Path<String>,
    request: web::Json<RateRecipeRequest>,
) -> HttpResponse {
    let claims = match auth_service::require_claims(&req) {
        Ok(claims) => claims,
        Err(e) => return e.to_response(),
    };
    let recipe_id = path.into_inner();

    log::info!("⭐ POST /recipes/{}/rating - user: {}", recipe_id, claims.sub);

    match rating_service::rate_recipe(&db, &claims.sub, &recipe_id, request.rating).await {
        Ok(summary) => HttpResponse::Created().json(serde_json::json!({
            "success": true,
            "average_rating": summary.average_rating,
            "rating_count": summary.rating_count
        })),
        Err(e) => e.to_response(),
    }
}
