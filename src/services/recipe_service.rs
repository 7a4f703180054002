use crate::database::MongoDB;
use crate::models::{
    CreateRecipeRequest, Rating, Recipe, RecipeResponse, UpdateRecipeRequest, DIFFICULTIES,
};
use crate::utils::error::AppError;
use crate::utils::pagination::Pagination;
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};

pub fn parse_object_id(id: &str, what: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(id).map_err(|_| AppError::Validation(format!("Invalid {} ID", what)))
}

/// Visibility rule shared by every read path: unpublished recipes exist only
/// for their owner. Everyone else gets 404, not 403, so drafts are not
/// discoverable.
pub fn check_visibility(recipe: &Recipe, viewer: Option<&str>) -> Result<(), AppError> {
    if !recipe.is_published && viewer != Some(recipe.user_id.as_str()) {
        return Err(AppError::NotFound("Recipe not found".to_string()));
    }
    Ok(())
}

/// Ownership rung of the existence → ownership → mutation ladder. The
/// resource is known to exist at this point, so a mismatch is 403.
pub fn ensure_owner(owner_id: &str, user_id: &str, message: &str) -> Result<(), AppError> {
    if owner_id != user_id {
        return Err(AppError::Forbidden(message.to_string()));
    }
    Ok(())
}

fn validate_difficulty(difficulty: &Option<String>) -> Result<(), AppError> {
    if let Some(value) = difficulty {
        if !DIFFICULTIES.contains(&value.as_str()) {
            return Err(AppError::Validation(format!(
                "Invalid difficulty. Must be one of: {}",
                DIFFICULTIES.join(", ")
            )));
        }
    }
    Ok(())
}

fn validate_create(request: &CreateRecipeRequest) -> Result<(), AppError> {
    let title = request.title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }
    // Character count, not byte length; multibyte titles get the full budget
    if title.chars().count() > 200 {
        return Err(AppError::Validation(
            "Title must be at most 200 characters".to_string(),
        ));
    }
    if request.instructions.trim().is_empty() {
        return Err(AppError::Validation("Instructions are required".to_string()));
    }
    if let Some(servings) = request.servings {
        if servings < 1 {
            return Err(AppError::Validation("Servings must be at least 1".to_string()));
        }
    }
    validate_difficulty(&request.difficulty)
}

pub async fn create_recipe(
    db: &MongoDB,
    user_id: &str,
    request: CreateRecipeRequest,
) -> Result<RecipeResponse, AppError> {
    validate_create(&request)?;

    let collection = db.collection::<Recipe>("recipes");

    let now = chrono::Utc::now().timestamp();
    let recipe = Recipe {
        id: None,
        user_id: user_id.to_string(),
        title: request.title.trim().to_string(),
        description: request.description,
        instructions: request.instructions,
        category: request.category,
        difficulty: request.difficulty,
        tags: request.tags.unwrap_or_default(),
        prep_time_minutes: request.prep_time_minutes,
        cook_time_minutes: request.cook_time_minutes,
        servings: request.servings,
        image_url: request.image_url,
        is_published: request.is_published.unwrap_or(false),
        avg_rating: None,
        rating_count: 0,
        created_at: now,
        updated_at: now,
    };

    let result = collection.insert_one(&recipe).await?;

    let mut created = recipe;
    created.id = result.inserted_id.as_object_id();

    Ok(RecipeResponse::from(created))
}

/// Published recipes, newest first
pub async fn list_published(
    db: &MongoDB,
    page: i64,
    limit: i64,
) -> Result<(Vec<RecipeResponse>, Pagination), AppError> {
    let collection = db.collection::<Recipe>("recipes");

    let filter = doc! { "is_published": true };
    let total_count = collection.count_documents(filter.clone()).await? as i64;

    let recipes: Vec<Recipe> = collection
        .find(filter)
        .sort(doc! { "created_at": -1 })
        .skip(((page - 1) * limit) as u64)
        .limit(limit)
        .await?
        .try_collect()
        .await?;

    let responses = recipes.into_iter().map(RecipeResponse::from).collect();
    Ok((responses, Pagination::build(page, limit, total_count)))
}

/// Look up a recipe and apply the visibility rule: unpublished recipes exist
/// only for their owner; everyone else gets 404, not 403, so drafts are not
/// discoverable.
pub async fn get_recipe(
    db: &MongoDB,
    recipe_id: &str,
    viewer: Option<&str>,
) -> Result<RecipeResponse, AppError> {
    let object_id = parse_object_id(recipe_id, "recipe")?;
    let collection = db.collection::<Recipe>("recipes");

    let recipe = collection
        .find_one(doc! { "_id": object_id })
        .await?
        .ok_or_else(|| AppError::NotFound("Recipe not found".to_string()))?;

    check_visibility(&recipe, viewer)?;

    Ok(RecipeResponse::from(recipe))
}

/// Fetch a recipe enforcing the existence → ownership ladder shared by every
/// write route: absent → 404, wrong owner → 403.
async fn find_owned_recipe(
    db: &MongoDB,
    user_id: &str,
    recipe_id: &str,
) -> Result<Recipe, AppError> {
    let object_id = parse_object_id(recipe_id, "recipe")?;
    let collection = db.collection::<Recipe>("recipes");

    let recipe = collection
        .find_one(doc! { "_id": object_id })
        .await?
        .ok_or_else(|| AppError::NotFound("Recipe not found".to_string()))?;

    ensure_owner(
        &recipe.user_id,
        user_id,
        "You do not have permission to modify this recipe",
    )?;

    Ok(recipe)
}

pub async fn update_recipe(
    db: &MongoDB,
    user_id: &str,
    recipe_id: &str,
    request: UpdateRecipeRequest,
) -> Result<RecipeResponse, AppError> {
    let recipe = find_owned_recipe(db, user_id, recipe_id).await?;
    let object_id = recipe.id.ok_or_else(|| AppError::Database("Recipe without id".to_string()))?;

    if let Some(title) = &request.title {
        if title.trim().is_empty() || title.trim().chars().count() > 200 {
            return Err(AppError::Validation(
                "Title must be between 1 and 200 characters".to_string(),
            ));
        }
    }
    validate_difficulty(&request.difficulty)?;
    if let Some(servings) = request.servings {
        if servings < 1 {
            return Err(AppError::Validation("Servings must be at least 1".to_string()));
        }
    }

    let mut update_doc = doc! {
        "updated_at": chrono::Utc::now().timestamp()
    };

    if let Some(title) = &request.title {
        update_doc.insert("title", title.trim());
    }
    if let Some(description) = &request.description {
        update_doc.insert("description", description);
    }
    if let Some(instructions) = &request.instructions {
        update_doc.insert("instructions", instructions);
    }
    if let Some(category) = &request.category {
        update_doc.insert("category", category);
    }
    if let Some(difficulty) = &request.difficulty {
        update_doc.insert("difficulty", difficulty);
    }
    if let Some(tags) = &request.tags {
        update_doc.insert("tags", tags.clone());
    }
    if let Some(prep) = request.prep_time_minutes {
        update_doc.insert("prep_time_minutes", prep);
    }
    if let Some(cook) = request.cook_time_minutes {
        update_doc.insert("cook_time_minutes", cook);
    }
    if let Some(servings) = request.servings {
        update_doc.insert("servings", servings);
    }
    if let Some(image_url) = &request.image_url {
        update_doc.insert("image_url", image_url);
    }
    if let Some(is_published) = request.is_published {
        update_doc.insert("is_published", is_published);
    }

    let collection = db.collection::<Recipe>("recipes");
    collection
        .update_one(doc! { "_id": object_id }, doc! { "$set": update_doc })
        .await?;

    let updated = collection
        .find_one(doc! { "_id": object_id })
        .await?
        .ok_or_else(|| AppError::NotFound("Recipe not found".to_string()))?;

    Ok(RecipeResponse::from(updated))
}

/// Delete a recipe and cascade to its dependent rows (ratings, saves,
/// collection memberships).
pub async fn delete_recipe(db: &MongoDB, user_id: &str, recipe_id: &str) -> Result<(), AppError> {
    let recipe = find_owned_recipe(db, user_id, recipe_id).await?;
    let object_id = recipe.id.ok_or_else(|| AppError::Database("Recipe without id".to_string()))?;
    let recipe_hex = object_id.to_hex();

    let documents = |name: &str| db.collection::<mongodb::bson::Document>(name);

    let filter = doc! { "recipe_id": &recipe_hex };
    documents("ratings").delete_many(filter.clone()).await?;
    documents("saved_recipes").delete_many(filter.clone()).await?;
    documents("collection_recipes").delete_many(filter).await?;

    db.collection::<Recipe>("recipes")
        .delete_one(doc! { "_id": object_id })
        .await?;

    log::info!("🗑️ Recipe {} deleted with dependents", recipe_hex);
    Ok(())
}

/// Recompute the denormalized rating aggregates stored on a recipe.
pub async fn recompute_rating_aggregates(db: &MongoDB, recipe_id: &str) -> Result<(Option<f64>, i64), AppError> {
    let object_id = parse_object_id(recipe_id, "recipe")?;

    let ratings: Vec<Rating> = db
        .collection::<Rating>("ratings")
        .find(doc! { "recipe_id": recipe_id })
        .await?
        .try_collect()
        .await?;

    let count = ratings.len() as i64;
    let average = if count == 0 {
        None
    } else {
        let sum: i64 = ratings.iter().map(|r| r.rating as i64).sum();
        Some(sum as f64 / count as f64)
    };

    db.collection::<Recipe>("recipes")
        .update_one(
            doc! { "_id": object_id },
            doc! { "$set": { "avg_rating": average, "rating_count": count } },
        )
        .await?;

    Ok((average, count))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_request() -> CreateRecipeRequest {
        CreateRecipeRequest {
            title: "Shakshuka".to_string(),
            description: "Eggs in tomato sauce".to_string(),
            instructions: "Simmer tomatoes, crack eggs, cover.".to_string(),
            category: Some("breakfast".to_string()),
            difficulty: Some("easy".to_string()),
            tags: None,
            prep_time_minutes: Some(10),
            cook_time_minutes: Some(20),
            servings: Some(2),
            image_url: None,
            is_published: None,
        }
    }

    #[test]
    fn test_valid_create_request_passes() {
        assert!(validate_create(&create_request()).is_ok());
    }

    #[test]
    fn test_empty_title_rejected() {
        let mut request = create_request();
        request.title = "   ".to_string();
        assert!(validate_create(&request).is_err());
    }

    #[test]
    fn test_unknown_difficulty_rejected() {
        let mut request = create_request();
        request.difficulty = Some("impossible".to_string());
        assert!(validate_create(&request).is_err());
    }

    #[test]
    fn test_zero_servings_rejected() {
        let mut request = create_request();
        request.servings = Some(0);
        assert!(validate_create(&request).is_err());
    }

    #[test]
    fn test_invalid_object_id_is_validation_error() {
        let err = parse_object_id("not-an-oid", "recipe").unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_title_length_counts_characters_not_bytes() {
        let mut request = create_request();
        // 200 two-byte characters stay within the limit
        request.title = "é".repeat(200);
        assert!(validate_create(&request).is_ok());

        request.title = "é".repeat(201);
        assert!(validate_create(&request).is_err());
    }

    fn draft_recipe(owner: &str) -> Recipe {
        Recipe {
            id: None,
            user_id: owner.to_string(),
            title: "Shakshuka".to_string(),
            description: String::new(),
            instructions: String::new(),
            category: None,
            difficulty: None,
            tags: vec![],
            prep_time_minutes: None,
            cook_time_minutes: None,
            servings: None,
            image_url: None,
            is_published: false,
            avg_rating: None,
            rating_count: 0,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_unpublished_recipe_hidden_from_everyone_but_owner() {
        let mut recipe = draft_recipe("user-1");

        // Drafts 404 for anonymous callers and other users alike
        assert_eq!(check_visibility(&recipe, None).unwrap_err().status_code(), 404);
        assert_eq!(
            check_visibility(&recipe, Some("user-2")).unwrap_err().status_code(),
            404
        );
        assert!(check_visibility(&recipe, Some("user-1")).is_ok());

        // Publishing makes the recipe visible to everyone
        recipe.is_published = true;
        assert!(check_visibility(&recipe, None).is_ok());
        assert!(check_visibility(&recipe, Some("user-2")).is_ok());
    }

    #[test]
    fn test_non_owner_mutation_is_forbidden() {
        let err = ensure_owner("user-1", "user-2", "no").unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert!(ensure_owner("user-1", "user-1", "no").is_ok());
    }
}
