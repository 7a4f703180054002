use crate::database::MongoDB;
use crate::models::{
    AuthorInfo, Follow, Recipe, RecipeSummary, UpdateProfileRequest, User, UserProfileResponse,
};
use crate::utils::error::AppError;
use crate::utils::pagination::Pagination;
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, DateTime as BsonDateTime};
use std::collections::HashMap;
use std::future::IntoFuture;

/// Resolve author info for a set of user ids in one query. Used to join
/// author name/picture onto search results and feed entries.
pub async fn author_map(
    db: &MongoDB,
    user_ids: &[String],
) -> Result<HashMap<String, AuthorInfo>, AppError> {
    if user_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let users: Vec<User> = db
        .collection::<User>("users")
        .find(doc! { "user_id": { "$in": user_ids } })
        .await?
        .try_collect()
        .await?;

    Ok(users
        .into_iter()
        .map(|user| {
            (
                user.user_id.clone(),
                AuthorInfo {
                    id: user.user_id,
                    name: user.name,
                    picture: user.picture,
                },
            )
        })
        .collect())
}

/// Public profile. The recipe and collection counts are independent reads,
/// issued concurrently. Private profiles hide the counts from everyone but
/// the owner.
pub async fn get_profile(
    db: &MongoDB,
    user_id: &str,
    viewer: Option<&str>,
) -> Result<UserProfileResponse, AppError> {
    let user = db
        .collection::<User>("users")
        .find_one(doc! { "user_id": user_id })
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let is_owner = viewer == Some(user_id);

    if user.is_private && !is_owner {
        return Ok(UserProfileResponse {
            id: user.user_id,
            name: user.name,
            picture: user.picture,
            is_private: true,
            recipe_count: None,
            collection_count: None,
        });
    }

    // Only published recipes count for non-owners
    let recipe_filter = if is_owner {
        doc! { "user_id": user_id }
    } else {
        doc! { "user_id": user_id, "is_published": true }
    };

    let recipes = db.collection::<mongodb::bson::Document>("recipes");
    let collections = db.collection::<mongodb::bson::Document>("collections");

    let (recipe_count, collection_count) = futures::try_join!(
        recipes.count_documents(recipe_filter).into_future(),
        collections.count_documents(doc! { "user_id": user_id }).into_future()
    )?;

    Ok(UserProfileResponse {
        id: user.user_id,
        name: user.name,
        picture: user.picture,
        is_private: user.is_private,
        recipe_count: Some(recipe_count),
        collection_count: Some(collection_count),
    })
}

fn validate_display_name(name: &str) -> Result<(), AppError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.chars().count() > 100 {
        return Err(AppError::Validation(
            "Name must be between 1 and 100 characters".to_string(),
        ));
    }
    Ok(())
}

pub async fn update_profile(
    db: &MongoDB,
    user_id: &str,
    request: UpdateProfileRequest,
) -> Result<UserProfileResponse, AppError> {
    if let Some(name) = &request.name {
        validate_display_name(name)?;
    }

    let mut update_doc = doc! { "updated_at": BsonDateTime::now() };
    if let Some(name) = &request.name {
        update_doc.insert("name", name.trim());
    }
    if let Some(picture) = &request.picture {
        update_doc.insert("picture", picture);
    }
    if let Some(is_private) = request.is_private {
        update_doc.insert("is_private", is_private);
    }

    let result = db
        .collection::<User>("users")
        .update_one(doc! { "user_id": user_id }, doc! { "$set": update_doc })
        .await?;

    if result.matched_count == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    get_profile(db, user_id, Some(user_id)).await
}

/// Activity feed: recent published recipes from followed users, newest
/// first. A fetch of the follow edges, a join against recipes, and a sort.
pub async fn feed(
    db: &MongoDB,
    user_id: &str,
    page: i64,
    limit: i64,
) -> Result<(Vec<RecipeSummary>, Pagination), AppError> {
    let follows: Vec<Follow> = db
        .collection::<Follow>("follows")
        .find(doc! { "follower_id": user_id })
        .await?
        .try_collect()
        .await?;

    let following_ids: Vec<String> = follows.into_iter().map(|f| f.following_id).collect();

    if following_ids.is_empty() {
        return Ok((Vec::new(), Pagination::build(page, limit, 0)));
    }

    let recipes = db.collection::<Recipe>("recipes");
    let filter = doc! {
        "user_id": { "$in": &following_ids },
        "is_published": true
    };

    let total_count = recipes.count_documents(filter.clone()).await? as i64;

    let page_items: Vec<Recipe> = recipes
        .find(filter)
        .sort(doc! { "created_at": -1 })
        .skip(((page - 1) * limit) as u64)
        .limit(limit)
        .await?
        .try_collect()
        .await?;

    let author_ids: Vec<String> = page_items.iter().map(|r| r.user_id.clone()).collect();
    let authors = author_map(db, &author_ids).await?;

    let summaries = page_items
        .into_iter()
        .map(|recipe| {
            let author = authors.get(&recipe.user_id).cloned();
            RecipeSummary::from_recipe(recipe, author)
        })
        .collect();

    Ok((summaries, Pagination::build(page, limit, total_count)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_length_counts_characters_not_bytes() {
        assert!(validate_display_name("Cook").is_ok());
        assert!(validate_display_name(&"é".repeat(100)).is_ok());
        assert!(validate_display_name(&"é".repeat(101)).is_err());
        assert!(validate_display_name("  ").is_err());
    }
}
