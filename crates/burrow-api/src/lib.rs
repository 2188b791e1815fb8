pub mod auth;
pub mod chats;
pub mod comments;
pub mod error;
pub mod friends;
pub mod mail;
pub mod messages;
pub mod users;
