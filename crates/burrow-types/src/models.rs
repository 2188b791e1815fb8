use serde::{Deserialize, Serialize};

/// A user as exposed to clients. The password hash never leaves the
/// persistence layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub created_at: String,
    pub active: bool,
}

/// One directed friendship edge. A relationship is two of these rows,
/// one per direction, each with its own block flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendEdge {
    pub user_friend_id: i64,
    pub user_id: i64,
    pub friend_id: i64,
    pub blocked: bool,
    /// Snapshot of the other party's name at friendship creation.
    pub display_name: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub chat_id: i64,
    pub title: String,
    pub created_at: String,
}

/// Author and reply fields are denormalized name/content snapshots, not
/// foreign keys, so historical display survives renames.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub content: String,
    pub reply_username: Option<String>,
    pub reply_content: Option<String>,
    pub username: String,
    pub chat_id: i64,
    pub created_at: String,
}
