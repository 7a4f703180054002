use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Recipe collection (stored in MongoDB), owned by one user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeCollection {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    /// Owner user_id
    pub user_id: String,

    pub name: String,

    pub description: Option<String>,

    pub created_at: i64,
    pub updated_at: i64,
}

/// Join row: membership of a recipe in a collection.
/// A (collection_id, recipe_id) pair is unique at the index level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionRecipe {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub collection_id: String,
    pub recipe_id: String,

    pub added_at: i64,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateCollectionRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateCollectionRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Request to add a recipe to a collection
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct AddCollectionRecipeRequest {
    pub recipe_id: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CollectionResponse {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<RecipeCollection> for CollectionResponse {
    fn from(collection: RecipeCollection) -> Self {
        CollectionResponse {
            id: collection.id.map(|id| id.to_hex()).unwrap_or_default(),
            user_id: collection.user_id,
            name: collection.name,
            description: collection.description,
            created_at: collection.created_at,
            updated_at: collection.updated_at,
        }
    }
}
