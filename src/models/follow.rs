use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Directed follow edge between two users.
/// (follower_id, following_id) is unique at the index level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Follow {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub follower_id: String,
    pub following_id: String,

    pub created_at: i64,
}
