use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};

use burrow_types::api::{CreateCommentRequest, StatusMessage};
use burrow_types::limits::{COMMENT_CONTENT_MAX, EMAIL_MAX};

use crate::auth::AppState;
use crate::error::{ApiError, ensure_max_len, ensure_not_empty};

/// Standalone feedback record; related to no other entity.
pub async fn create_comment(
    State(state): State<AppState>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_not_empty("content", &req.content)?;
    ensure_max_len("content", &req.content, COMMENT_CONTENT_MAX)?;
    ensure_max_len("email", &req.email, EMAIL_MAX)?;

    state.db.insert_comment(&req.email, &req.content)?;
    Ok((StatusCode::CREATED, Json(StatusMessage::ok("Comment sent"))))
}
