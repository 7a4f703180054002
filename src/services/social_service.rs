use crate::database::{is_duplicate_key_error, MongoDB};
use crate::models::{Follow, Recipe, SavedRecipe, User};
use crate::services::recipe_service;
use crate::utils::error::AppError;
use mongodb::bson::doc;

// Edge writes here deliberately skip any check-then-insert step: the unique
// index decides, and a duplicate-key error becomes the 409. Two concurrent
// submissions cannot both win.

fn validate_follow(follower_id: &str, target_id: &str) -> Result<(), AppError> {
    if follower_id == target_id {
        return Err(AppError::Validation("You cannot follow yourself".to_string()));
    }
    Ok(())
}

/// Edge removal: zero deleted rows means the edge never existed.
fn ensure_edge_removed(deleted_count: u64, message: &str) -> Result<(), AppError> {
    if deleted_count == 0 {
        return Err(AppError::NotFound(message.to_string()));
    }
    Ok(())
}

pub async fn follow_user(db: &MongoDB, follower_id: &str, target_id: &str) -> Result<(), AppError> {
    validate_follow(follower_id, target_id)?;

    let target = db
        .collection::<User>("users")
        .find_one(doc! { "user_id": target_id })
        .await?;
    if target.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    let follow = Follow {
        id: None,
        follower_id: follower_id.to_string(),
        following_id: target_id.to_string(),
        created_at: chrono::Utc::now().timestamp(),
    };

    db.collection::<Follow>("follows")
        .insert_one(&follow)
        .await
        .map_err(|e| {
            if is_duplicate_key_error(&e) {
                AppError::Conflict("Already following this user".to_string())
            } else {
                AppError::from(e)
            }
        })?;

    Ok(())
}

pub async fn unfollow_user(db: &MongoDB, follower_id: &str, target_id: &str) -> Result<(), AppError> {
    let result = db
        .collection::<Follow>("follows")
        .delete_one(doc! { "follower_id": follower_id, "following_id": target_id })
        .await?;

    ensure_edge_removed(result.deleted_count, "Not following this user")
}

/// Anonymous callers simply have no relation; this never errors on a
/// missing session.
pub async fn is_following(
    db: &MongoDB,
    follower_id: Option<&str>,
    target_id: &str,
) -> Result<bool, AppError> {
    let follower_id = match follower_id {
        Some(id) => id,
        None => return Ok(false),
    };

    let edge = db
        .collection::<Follow>("follows")
        .find_one(doc! { "follower_id": follower_id, "following_id": target_id })
        .await?;

    Ok(edge.is_some())
}

/// Visibility check shared by the save routes: the recipe must exist and be
/// either published or owned by the caller.
async fn find_visible_recipe(
    db: &MongoDB,
    recipe_id: &str,
    viewer: &str,
) -> Result<Recipe, AppError> {
    let object_id = recipe_service::parse_object_id(recipe_id, "recipe")?;

    let recipe = db
        .collection::<Recipe>("recipes")
        .find_one(doc! { "_id": object_id })
        .await?
        .ok_or_else(|| AppError::NotFound("Recipe not found".to_string()))?;

    recipe_service::check_visibility(&recipe, Some(viewer))?;

    Ok(recipe)
}

pub async fn save_recipe(db: &MongoDB, user_id: &str, recipe_id: &str) -> Result<(), AppError> {
    find_visible_recipe(db, recipe_id, user_id).await?;

    let saved = SavedRecipe {
        id: None,
        user_id: user_id.to_string(),
        recipe_id: recipe_id.to_string(),
        created_at: chrono::Utc::now().timestamp(),
    };

    db.collection::<SavedRecipe>("saved_recipes")
        .insert_one(&saved)
        .await
        .map_err(|e| {
            if is_duplicate_key_error(&e) {
                AppError::Conflict("Recipe already saved".to_string())
            } else {
                AppError::from(e)
            }
        })?;

    Ok(())
}

pub async fn unsave_recipe(db: &MongoDB, user_id: &str, recipe_id: &str) -> Result<(), AppError> {
    let result = db
        .collection::<SavedRecipe>("saved_recipes")
        .delete_one(doc! { "user_id": user_id, "recipe_id": recipe_id })
        .await?;

    ensure_edge_removed(result.deleted_count, "Recipe is not saved")
}

pub async fn is_saved(
    db: &MongoDB,
    user_id: Option<&str>,
    recipe_id: &str,
) -> Result<bool, AppError> {
    let user_id = match user_id {
        Some(id) => id,
        None => return Ok(false),
    };

    let edge = db
        .collection::<SavedRecipe>("saved_recipes")
        .find_one(doc! { "user_id": user_id, "recipe_id": recipe_id })
        .await?;

    Ok(edge.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_follow_is_rejected() {
        let err = validate_follow("user-1", "user-1").unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(validate_follow("user-1", "user-2").is_ok());
    }

    #[test]
    fn test_removing_missing_edge_is_not_found() {
        let err = ensure_edge_removed(0, "Not following this user").unwrap_err();
        assert_eq!(err.status_code(), 404);
        assert!(ensure_edge_removed(1, "Not following this user").is_ok());
    }
}
