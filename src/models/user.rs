use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

/// User account (stored in MongoDB). `user_id` is the primary identifier;
/// OAuth users carry no password.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub user_id: String,

    pub email: String,

    /// None for OAuth-only accounts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    pub name: Option<String>,

    /// Profile image URL
    pub picture: Option<String>,

    /// "local" or "google"
    pub provider: Option<String>,

    pub google_id: Option<String>,

    /// Private profiles hide counts from other users
    #[serde(default)]
    pub is_private: bool,

    #[serde(default = "default_is_active")]
    pub is_active: bool,

    pub created_at: Option<BsonDateTime>,
    pub updated_at: Option<BsonDateTime>,
    pub last_login: Option<BsonDateTime>,
}

fn default_is_active() -> bool {
    true
}

/// Compact author info joined onto recipe listings
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct AuthorInfo {
    pub id: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Public profile response. Counts are omitted for private profiles
/// viewed by anyone other than the owner.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UserProfileResponse {
    pub id: String,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub is_private: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipe_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_count: Option<u64>,
}

/// Request to update the caller's own profile
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub picture: Option<String>,
    pub is_private: Option<bool>,
}
