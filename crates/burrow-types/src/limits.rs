//! Field length limits, in characters.
//!
//! These mirror the storage column bounds. Where the original handler and
//! column disagreed (chat titles), the smaller storage bound wins.

pub const USERNAME_MAX: usize = 32;
pub const PASSWORD_MAX: usize = 80;
pub const EMAIL_MAX: usize = 255;
pub const CHAT_TITLE_MAX: usize = 80;
pub const MESSAGE_CONTENT_MAX: usize = 25_000;
pub const COMMENT_CONTENT_MAX: usize = 50_000;
