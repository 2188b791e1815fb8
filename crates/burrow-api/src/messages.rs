use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::error;

use burrow_types::api::{CreateMessageRequest, StatusMessage, UpdateMessageRequest};
use burrow_types::limits::MESSAGE_CONTENT_MAX;
use burrow_types::models::Message;

use crate::auth::AppState;
use crate::error::{ApiError, ensure_max_len, ensure_not_empty};

pub async fn create_message(
    State(state): State<AppState>,
    Json(req): Json<CreateMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_not_empty("content", &req.content)?;
    ensure_max_len("content", &req.content, MESSAGE_CONTENT_MAX)?;

    // Run the blocking store write off the async runtime
    let db = state.clone();
    tokio::task::spawn_blocking(move || {
        db.db.insert_message(
            &req.content,
            req.reply_username.as_deref(),
            req.reply_content.as_deref(),
            &req.user,
            req.chat_id,
        )
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Store
    })??;

    Ok((
        StatusCode::CREATED,
        Json(StatusMessage::ok("Message added successfully!")),
    ))
}

pub async fn get_messages(
    State(state): State<AppState>,
    Path(chat_id): Path<i64>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.list_messages(chat_id))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Store
        })??;

    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

pub async fn update_message(
    State(state): State<AppState>,
    Path(message_id): Path<i64>,
    Json(req): Json<UpdateMessageRequest>,
) -> Result<Json<StatusMessage>, ApiError> {
    ensure_not_empty("content", &req.content)?;
    ensure_max_len("content", &req.content, MESSAGE_CONTENT_MAX)?;

    state.db.update_message_content(message_id, &req.content)?;
    Ok(Json(StatusMessage::ok("Message updated")))
}
