use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use burrow_types::api::{
    AddToChatRequest, CreateChatRequest, LeaveChatRequest, StatusMessage, UpdateChatRequest,
};
use burrow_types::limits::CHAT_TITLE_MAX;
use burrow_types::models::{Chat, User};

use crate::auth::AppState;
use crate::error::{ApiError, ensure_max_len, ensure_not_empty};

pub async fn create_chat(
    State(state): State<AppState>,
    Json(req): Json<CreateChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_not_empty("title", &req.title)?;
    ensure_max_len("title", &req.title, CHAT_TITLE_MAX)?;

    state
        .db
        .create_chat_with_members(&req.user, &req.friend, &req.title)?;
    Ok((
        StatusCode::CREATED,
        Json(StatusMessage::ok("Chat added successfully!")),
    ))
}

pub async fn get_chats(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<Chat>>, ApiError> {
    let chats = state
        .db
        .list_chats_for_user(user_id)?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(chats))
}

pub async fn get_chat(
    State(state): State<AppState>,
    Path(chat_id): Path<i64>,
) -> Result<Json<Chat>, ApiError> {
    let chat = state.db.get_chat(chat_id)?;
    Ok(Json(chat.into()))
}

pub async fn update_chat(
    State(state): State<AppState>,
    Path(chat_id): Path<i64>,
    Json(req): Json<UpdateChatRequest>,
) -> Result<Json<StatusMessage>, ApiError> {
    ensure_not_empty("title", &req.title)?;
    ensure_max_len("title", &req.title, CHAT_TITLE_MAX)?;

    state.db.update_chat_title(chat_id, &req.title)?;
    Ok(Json(StatusMessage::ok("Chat updated")))
}

pub async fn get_participants(
    State(state): State<AppState>,
    Path(chat_id): Path<i64>,
) -> Result<Json<Vec<User>>, ApiError> {
    let members = state
        .db
        .list_chat_members(chat_id)?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(members))
}

/// A chat is torn down exactly when its last member leaves; the cascade
/// (chat row plus its messages) happens in the same store transaction.
pub async fn leave_chat(
    State(state): State<AppState>,
    Path(chat_id): Path<i64>,
    Json(req): Json<LeaveChatRequest>,
) -> Result<Json<StatusMessage>, ApiError> {
    let torn_down = state.db.leave_chat(req.user_id, chat_id)?;
    if torn_down {
        info!("chat {} torn down after last member left", chat_id);
    }
    Ok(Json(StatusMessage::ok("Left chat")))
}

pub async fn add_friend_to_chat(
    State(state): State<AppState>,
    Path(chat_id): Path<i64>,
    Json(req): Json<AddToChatRequest>,
) -> Result<Json<StatusMessage>, ApiError> {
    state.db.add_chat_member(chat_id, &req.user, &req.friend)?;
    Ok(Json(StatusMessage::ok("Friend added to chat successfully!")))
}
