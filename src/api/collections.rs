use actix_web::{web, HttpResponse};

use crate::database::MongoDB;
use crate::models::{AddCollectionRecipeRequest, CreateCollectionRequest, UpdateCollectionRequest};
use crate::services::auth_service::Claims;
use crate::services::collection_service;

pub async fn create_collection(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    request: web::Json<CreateCollectionRequest>,
) -> HttpResponse {
    log::info!("📁 POST /collections - user: {}", claims.sub);

    match collection_service::create_collection(&db, &claims.sub, request.into_inner()).await {
        Ok(collection) => HttpResponse::Created().json(serde_json::json!({
            "success": true,
            "collection": collection
        })),
        Err(e) => e.to_response(),
    }
}

pub async fn list_collections(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    match collection_service::list_collections(&db, &claims.sub).await {
        Ok(collections) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "collections": collections
        })),
        Err(e) => e.to_response(),
    }
}

pub async fn get_collection(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> HttpResponse {
    match collection_service::get_collection(&db, &claims.sub, &path.into_inner()).await {
        Ok(collection) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "collection": collection
        })),
        Err(e) => e.to_response(),
    }
}

pub async fn update_collection(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
    request: web::Json<UpdateCollectionRequest>,
) -> HttpResponse {
    match collection_service::update_collection(
        &db,
        &claims.sub,
        &path.into_inner(),
        request.into_inner(),
    )
    .await
    {
        Ok(collection) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "collection": collection
        })),
        Err(e) => e.to_response(),
    }
}

pub async fn delete_collection(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> HttpResponse {
    let collection_id = path.into_inner();
    log::info!("🗑️ DELETE /collections/{} - user: {}", collection_id, claims.sub);

    match collection_service::delete_collection(&db, &claims.sub, &collection_id).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Collection deleted"
        })),
        Err(e) => e.to_response(),
    }
}

// Membership writes respond 200, like the other edge routes
fn membership_response(message: &str) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": message
    }))
}

pub async fn add_recipe(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
    request: web::Json<AddCollectionRecipeRequest>,
) -> HttpResponse {
    let collection_id = path.into_inner();

    match collection_service::add_recipe(&db, &claims.sub, &collection_id, &request).await {
        Ok(()) => membership_response("Recipe added to collection"),
        Err(e) => e.to_response(),
    }
}

pub async fn remove_recipe(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    path: web::Path<(String, String)>,
) -> HttpResponse {
    let (collection_id, recipe_id) = path.into_inner();

    match collection_service::remove_recipe(&db, &claims.sub, &collection_id, &recipe_id).await {
        Ok(()) => membership_response("Recipe removed from collection"),
        Err(e) => e.to_response(),
    }
}

pub async fn list_recipes(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> HttpResponse {
    match collection_service::list_recipes(&db, &claims.sub, &path.into_inner()).await {
        Ok(recipes) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "recipes": recipes
        })),
        Err(e) => e.to_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_writes_respond_200() {
        assert_eq!(
            membership_response("Recipe added to collection").status().as_u16(),
            200
        );
    }
}
