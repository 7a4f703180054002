use crate::database::MongoDB;
use crate::models::{Rating, RatingSummary, Recipe};
use crate::services::recipe_service;
use crate::utils::error::AppError;
use futures::stream::TryStreamExt;
use mongodb::bson::doc;

/// Submit a 1–5 rating for a published recipe. One row per (user, recipe)
/// pair: the unique index backs this, and the write is an upsert so a second
/// submission replaces the previous score instead of conflicting.
pub async fn rate_recipe(
    db: &MongoDB,
    user_id: &str,
    recipe_id: &str,
    rating: i32,
) -> Result<RatingSummary, AppError> {
    if !(1..=5).contains(&rating) {
        return Err(AppError::Validation(
            "Rating must be an integer between 1 and 5".to_string(),
        ));
    }

    let object_id = recipe_service::parse_object_id(recipe_id, "recipe")?;
    let recipe = db
        .collection::<Recipe>("recipes")
        .find_one(doc! { "_id": object_id })
        .await?
        .ok_or_else(|| AppError::NotFound("Recipe not found".to_string()))?;

    if !recipe.is_published {
        return Err(AppError::NotFound("Recipe not found".to_string()));
    }

    let now = chrono::Utc::now().timestamp();
    db.collection::<Rating>("ratings")
        .update_one(
            doc! { "user_id": user_id, "recipe_id": recipe_id },
            doc! {
                "$set": { "rating": rating, "updated_at": now },
                "$setOnInsert": { "created_at": now },
            },
        )
        .upsert(true)
        .await?;

    let (average, count) = recipe_service::recompute_rating_aggregates(db, recipe_id).await?;

    Ok(RatingSummary {
        average_rating: average,
        rating_count: count,
    })
}

/// Maintenance pass: recompute the denormalized aggregates for every recipe.
pub async fn recompute_all(db: &MongoDB) -> Result<u64, AppError> {
    let recipes: Vec<Recipe> = db
        .collection::<Recipe>("recipes")
        .find(doc! {})
        .await?
        .try_collect()
        .await?;

    let mut updated = 0u64;
    for recipe in recipes {
        if let Some(id) = recipe.id {
            recipe_service::recompute_rating_aggregates(db, &id.to_hex()).await?;
            updated += 1;
        }
    }

    Ok(updated)
}
