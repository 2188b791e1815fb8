use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use burrow_types::api::{AddFriendRequest, StatusMessage};
use burrow_types::models::User;

use crate::auth::AppState;
use crate::error::ApiError;

/// Friendships are symmetric at creation: one call inserts both directed
/// edges, or neither.
pub async fn add_friend(
    State(state): State<AppState>,
    Json(req): Json<AddFriendRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.add_friend_pair(&req.username, &req.friend)?;
    Ok((
        StatusCode::CREATED,
        Json(StatusMessage::ok("User Friend created successfully")),
    ))
}

pub async fn get_friends(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<User>>, ApiError> {
    let friends = state
        .db
        .list_friends(user_id)?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(friends))
}
