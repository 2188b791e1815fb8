//! Database row types — these map directly to SQLite rows.
//! Distinct from the burrow-types API models to keep the DB layer
//! independent; conversions to client-facing models live here too.

use burrow_types::models::{Chat, FriendEdge, Message, User};

pub struct UserRow {
    pub user_id: i64,
    pub username: String,
    pub password: String,
    pub email: String,
    pub display_name: String,
    pub created_at: String,
    pub active: bool,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            user_id: row.user_id,
            username: row.username,
            email: row.email,
            display_name: row.display_name,
            created_at: row.created_at,
            active: row.active,
        }
    }
}

pub struct FriendRow {
    pub user_friend_id: i64,
    pub user_id: i64,
    pub friend_id: i64,
    pub blocked: bool,
    pub display_name: String,
    pub created_at: String,
}

impl From<FriendRow> for FriendEdge {
    fn from(row: FriendRow) -> Self {
        FriendEdge {
            user_friend_id: row.user_friend_id,
            user_id: row.user_id,
            friend_id: row.friend_id,
            blocked: row.blocked,
            display_name: row.display_name,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug)]
pub struct ChatRow {
    pub chat_id: i64,
    pub title: String,
    pub created_at: String,
}

impl From<ChatRow> for Chat {
    fn from(row: ChatRow) -> Self {
        Chat {
            chat_id: row.chat_id,
            title: row.title,
            created_at: row.created_at,
        }
    }
}

pub struct MessageRow {
    pub message_id: i64,
    pub content: String,
    pub reply_username: Option<String>,
    pub reply_content: Option<String>,
    pub username: String,
    pub chat_id: i64,
    pub created_at: String,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Message {
            message_id: row.message_id,
            content: row.content,
            reply_username: row.reply_username,
            reply_content: row.reply_content,
            username: row.username,
            chat_id: row.chat_id,
            created_at: row.created_at,
        }
    }
}
