use crate::database::{is_duplicate_key_error, MongoDB};
use crate::models::{
    AddCollectionRecipeRequest, CollectionRecipe, CollectionResponse, CreateCollectionRequest,
    Recipe, RecipeCollection, RecipeResponse, UpdateCollectionRequest,
};
use crate::services::recipe_service;
use crate::utils::error::AppError;
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};

fn validate_name(name: &str) -> Result<(), AppError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.chars().count() > 100 {
        return Err(AppError::Validation(
            "Collection name must be between 1 and 100 characters".to_string(),
        ));
    }
    Ok(())
}

pub async fn create_collection(
    db: &MongoDB,
    user_id: &str,
    request: CreateCollectionRequest,
) -> Result<CollectionResponse, AppError> {
    validate_name(&request.name)?;
    let name = request.name.trim();

    let now = chrono::Utc::now().timestamp();
    let collection = RecipeCollection {
        id: None,
        user_id: user_id.to_string(),
        name: name.to_string(),
        description: request.description,
        created_at: now,
        updated_at: now,
    };

    let result = db
        .collection::<RecipeCollection>("collections")
        .insert_one(&collection)
        .await?;

    let mut created = collection;
    created.id = result.inserted_id.as_object_id();

    Ok(CollectionResponse::from(created))
}

pub async fn list_collections(
    db: &MongoDB,
    user_id: &str,
) -> Result<Vec<CollectionResponse>, AppError> {
    let collections: Vec<RecipeCollection> = db
        .collection::<RecipeCollection>("collections")
        .find(doc! { "user_id": user_id })
        .await?
        .try_collect()
        .await?;

    let mut responses: Vec<CollectionResponse> =
        collections.into_iter().map(CollectionResponse::from).collect();
    responses.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

    Ok(responses)
}

/// Existence → ownership ladder for collection mutations
async fn find_owned_collection(
    db: &MongoDB,
    user_id: &str,
    collection_id: &str,
) -> Result<(ObjectId, RecipeCollection), AppError> {
    let object_id = recipe_service::parse_object_id(collection_id, "collection")?;

    let collection = db
        .collection::<RecipeCollection>("collections")
        .find_one(doc! { "_id": object_id })
        .await?
        .ok_or_else(|| AppError::NotFound("Collection not found".to_string()))?;

    recipe_service::ensure_owner(
        &collection.user_id,
        user_id,
        "You do not have permission to modify this collection",
    )?;

    Ok((object_id, collection))
}

pub async fn get_collection(
    db: &MongoDB,
    user_id: &str,
    collection_id: &str,
) -> Result<CollectionResponse, AppError> {
    let (_, collection) = find_owned_collection(db, user_id, collection_id).await?;
    Ok(CollectionResponse::from(collection))
}

pub async fn update_collection(
    db: &MongoDB,
    user_id: &str,
    collection_id: &str,
    request: UpdateCollectionRequest,
) -> Result<CollectionResponse, AppError> {
    let (object_id, _) = find_owned_collection(db, user_id, collection_id).await?;

    if let Some(name) = &request.name {
        validate_name(name)?;
    }

    let mut update_doc = doc! { "updated_at": chrono::Utc::now().timestamp() };
    if let Some(name) = &request.name {
        update_doc.insert("name", name.trim());
    }
    if let Some(description) = &request.description {
        update_doc.insert("description", description);
    }

    let store = db.collection::<RecipeCollection>("collections");
    store
        .update_one(doc! { "_id": object_id }, doc! { "$set": update_doc })
        .await?;

    let updated = store
        .find_one(doc! { "_id": object_id })
        .await?
        .ok_or_else(|| AppError::NotFound("Collection not found".to_string()))?;

    Ok(CollectionResponse::from(updated))
}

/// Delete a collection and its membership rows
pub async fn delete_collection(
    db: &MongoDB,
    user_id: &str,
    collection_id: &str,
) -> Result<(), AppError> {
    let (object_id, _) = find_owned_collection(db, user_id, collection_id).await?;

    db.collection::<CollectionRecipe>("collection_recipes")
        .delete_many(doc! { "collection_id": collection_id })
        .await?;

    db.collection::<RecipeCollection>("collections")
        .delete_one(doc! { "_id": object_id })
        .await?;

    Ok(())
}

/// Add a recipe to a collection. The recipe must exist and be visible to the
/// caller; the (collection, recipe) pair is unique and a duplicate add is a
/// conflict.
pub async fn add_recipe(
    db: &MongoDB,
    user_id: &str,
    collection_id: &str,
    request: &AddCollectionRecipeRequest,
) -> Result<(), AppError> {
    find_owned_collection(db, user_id, collection_id).await?;

    let recipe_oid = recipe_service::parse_object_id(&request.recipe_id, "recipe")?;
    let recipe = db
        .collection::<Recipe>("recipes")
        .find_one(doc! { "_id": recipe_oid })
        .await?
        .ok_or_else(|| AppError::NotFound("Recipe not found".to_string()))?;

    recipe_service::check_visibility(&recipe, Some(user_id))?;

    let membership = CollectionRecipe {
        id: None,
        collection_id: collection_id.to_string(),
        recipe_id: request.recipe_id.clone(),
        added_at: chrono::Utc::now().timestamp(),
    };

    db.collection::<CollectionRecipe>("collection_recipes")
        .insert_one(&membership)
        .await
        .map_err(|e| {
            if is_duplicate_key_error(&e) {
                AppError::Conflict("Recipe is already in this collection".to_string())
            } else {
                AppError::from(e)
            }
        })?;

    Ok(())
}

pub async fn remove_recipe(
    db: &MongoDB,
    user_id: &str,
    collection_id: &str,
    recipe_id: &str,
) -> Result<(), AppError> {
    find_owned_collection(db, user_id, collection_id).await?;

    let result = db
        .collection::<CollectionRecipe>("collection_recipes")
        .delete_one(doc! { "collection_id": collection_id, "recipe_id": recipe_id })
        .await?;

    if result.deleted_count == 0 {
        return Err(AppError::NotFound(
            "Recipe is not in this collection".to_string(),
        ));
    }

    Ok(())
}

/// Membership join: fetch the rows, then resolve the recipes with one $in
pub async fn list_recipes(
    db: &MongoDB,
    user_id: &str,
    collection_id: &str,
) -> Result<Vec<RecipeResponse>, AppError> {
    find_owned_collection(db, user_id, collection_id).await?;

    let memberships: Vec<CollectionRecipe> = db
        .collection::<CollectionRecipe>("collection_recipes")
        .find(doc! { "collection_id": collection_id })
        .await?
        .try_collect()
        .await?;

    if memberships.is_empty() {
        return Ok(Vec::new());
    }

    let recipe_oids: Vec<ObjectId> = memberships
        .iter()
        .filter_map(|m| ObjectId::parse_str(&m.recipe_id).ok())
        .collect();

    let recipes: Vec<Recipe> = db
        .collection::<Recipe>("recipes")
        .find(doc! { "_id": { "$in": recipe_oids } })
        .await?
        .try_collect()
        .await?;

    Ok(recipes.into_iter().map(RecipeResponse::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_length_counts_characters_not_bytes() {
        assert!(validate_name("Weeknight dinners").is_ok());
        assert!(validate_name(&"é".repeat(100)).is_ok());
        assert!(validate_name(&"é".repeat(101)).is_err());
        assert!(validate_name("   ").is_err());
    }
}
