use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Rating (stored in MongoDB). One row per (user_id, recipe_id) pair,
/// enforced by a unique index; a second submission replaces the score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rating {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub user_id: String,
    pub recipe_id: String,

    /// 1 to 5
    pub rating: i32,

    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RateRecipeRequest {
    pub rating: i32,
}

/// Aggregates returned after a rating write
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RatingSummary {
    pub average_rating: Option<f64>,
    pub rating_count: i64,
}
