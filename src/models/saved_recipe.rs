use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Bookmark edge. (user_id, recipe_id) is unique at the index level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedRecipe {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub user_id: String,
    pub recipe_id: String,

    pub created_at: i64,
}
