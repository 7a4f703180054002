use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::AuthorInfo;

/// Accepted difficulty values
pub const DIFFICULTIES: [&str; 3] = ["easy", "medium", "hard"];

/// Recipe (stored in MongoDB)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    /// Owner user_id; every write route checks this
    pub user_id: String,

    pub title: String,

    pub description: String,

    /// Free-text preparation steps
    pub instructions: String,

    pub category: Option<String>,

    /// "easy" | "medium" | "hard"
    pub difficulty: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    pub prep_time_minutes: Option<i32>,
    pub cook_time_minutes: Option<i32>,
    pub servings: Option<i32>,

    pub image_url: Option<String>,

    /// Only published recipes are visible to non-owners
    #[serde(default)]
    pub is_published: bool,

    /// Denormalized rating aggregates, recomputed on every rating write
    pub avg_rating: Option<f64>,
    #[serde(default)]
    pub rating_count: i64,

    /// Unix timestamps
    pub created_at: i64,
    pub updated_at: i64,
}

/// Request to create a recipe
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateRecipeRequest {
    pub title: String,
    pub description: String,
    pub instructions: String,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub tags: Option<Vec<String>>,
    pub prep_time_minutes: Option<i32>,
    pub cook_time_minutes: Option<i32>,
    pub servings: Option<i32>,
    pub image_url: Option<String>,
    pub is_published: Option<bool>,
}

/// Request to update a recipe (all fields optional)
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateRecipeRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub instructions: Option<String>,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub tags: Option<Vec<String>>,
    pub prep_time_minutes: Option<i32>,
    pub cook_time_minutes: Option<i32>,
    pub servings: Option<i32>,
    pub image_url: Option<String>,
    pub is_published: Option<bool>,
}

/// Full recipe response
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RecipeResponse {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub instructions: String,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub tags: Vec<String>,
    pub prep_time_minutes: Option<i32>,
    pub cook_time_minutes: Option<i32>,
    pub servings: Option<i32>,
    pub image_url: Option<String>,
    pub is_published: bool,
    pub avg_rating: Option<f64>,
    pub rating_count: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<Recipe> for RecipeResponse {
    fn from(recipe: Recipe) -> Self {
        RecipeResponse {
            id: recipe.id.map(|id| id.to_hex()).unwrap_or_default(),
            user_id: recipe.user_id,
            title: recipe.title,
            description: recipe.description,
            instructions: recipe.instructions,
            category: recipe.category,
            difficulty: recipe.difficulty,
            tags: recipe.tags,
            prep_time_minutes: recipe.prep_time_minutes,
            cook_time_minutes: recipe.cook_time_minutes,
            servings: recipe.servings,
            image_url: recipe.image_url,
            is_published: recipe.is_published,
            avg_rating: recipe.avg_rating,
            rating_count: recipe.rating_count,
            created_at: recipe.created_at,
            updated_at: recipe.updated_at,
        }
    }
}

/// Compact recipe summary with joined author info (search results, feed)
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RecipeSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub tags: Vec<String>,
    pub prep_time_minutes: Option<i32>,
    pub cook_time_minutes: Option<i32>,
    pub servings: Option<i32>,
    pub image_url: Option<String>,
    pub avg_rating: Option<f64>,
    pub rating_count: i64,
    pub author: Option<AuthorInfo>,
    pub created_at: i64,
}

impl RecipeSummary {
    pub fn from_recipe(recipe: Recipe, author: Option<AuthorInfo>) -> Self {
        RecipeSummary {
            id: recipe.id.map(|id| id.to_hex()).unwrap_or_default(),
            title: recipe.title,
            description: recipe.description,
            category: recipe.category,
            difficulty: recipe.difficulty,
            tags: recipe.tags,
            prep_time_minutes: recipe.prep_time_minutes,
            cook_time_minutes: recipe.cook_time_minutes,
            servings: recipe.servings,
            image_url: recipe.image_url,
            avg_rating: recipe.avg_rating,
            rating_count: recipe.rating_count,
            author,
            created_at: recipe.created_at,
        }
    }
}
