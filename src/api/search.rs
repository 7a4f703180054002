use actix_web::{web, HttpResponse};

use crate::database::MongoDB;
use crate::models::RecipeSummary;
use crate::services::search_service;
use crate::services::search_service::SearchQuery;
use crate::utils::pagination::Pagination;

/// Search results use the same `recipes` key as the other listings so
/// clients can share response handling.
fn search_response(recipes: Vec<RecipeSummary>, pagination: Pagination) -> serde_json::Value {
    serde_json::json!({
        "success": true,
        "recipes": recipes,
        "pagination": pagination
    })
}

#[utoipa::path(
    get,
    path = "/api/v1/search",
    tag = "Search",
    params(
        ("q" = String, Query, description = "Search text, at least 2 characters"),
        ("category" = Option<String>, Query, description = "Category filter"),
        ("difficulty" = Option<String>, Query, description = "easy | medium | hard"),
        ("tag" = Option<String>, Query, description = "Tag filter"),
        ("sort" = Option<String>, Query, description = "relevance | title | created | rating"),
        ("limit" = Option<i64>, Query, description = "Page size, capped at 50"),
        ("page" = Option<i64>, Query, description = "Page number, starting at 1")
    ),
    responses(
        (status = 200, description = "Ranked search results"),
        (status = 400, description = "Invalid query or filter")
    )
)]
pub async fn search_recipes(
    db: web::Data<MongoDB>,
    query: web::Query<SearchQuery>,
) -> HttpResponse {
    log::info!("🔍 GET /search - q: \"{}\"", query.q);

    match search_service::search(&db, &query).await {
        Ok((recipes, pagination)) => HttpResponse::Ok().json(search_response(recipes, pagination)),
        Err(e) => e.to_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_body_lists_recipes_like_other_listings() {
        let body = search_response(Vec::new(), Pagination::build(1, 20, 0));
        assert!(body.get("recipes").is_some());
        assert!(body.get("results").is_none());
        assert_eq!(body["success"], true);
    }
}
