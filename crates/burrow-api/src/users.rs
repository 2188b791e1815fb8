use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use rand::{Rng, distr::Alphanumeric};
use tracing::error;

use burrow_types::api::{
    CreateUserRequest, FriendActionRequest, StatusMessage, UpdatePasswordRequest,
    UpdateUsernameRequest,
};
use burrow_types::limits::{EMAIL_MAX, PASSWORD_MAX, USERNAME_MAX};
use burrow_types::models::{FriendEdge, User};

use crate::auth::{AppState, hash_password};
use crate::error::{ApiError, ensure_max_len, ensure_not_empty};

pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_not_empty("username", &req.username)?;
    ensure_not_empty("password", &req.password)?;
    ensure_not_empty("email", &req.email)?;
    ensure_max_len("username", &req.username, USERNAME_MAX)?;
    ensure_max_len("password", &req.password, PASSWORD_MAX)?;
    ensure_max_len("email", &req.email, EMAIL_MAX)?;

    if state.db.get_user_by_username(&req.username)?.is_some() {
        return Err(ApiError::AlreadyExists("Username already exists".into()));
    }
    if state.db.get_user_by_email(&req.email)?.is_some() {
        return Err(ApiError::AlreadyExists(
            "An account associated with this email already exists".into(),
        ));
    }

    let password_hash = hash_password(&req.password)?;
    state.db.create_user(&req.username, &password_hash, &req.email)?;

    Ok((
        StatusCode::CREATED,
        Json(StatusMessage::ok("Sign up successful!")),
    ))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<User>, ApiError> {
    let user = state
        .db
        .get_user_by_id(user_id)?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;
    Ok(Json(user.into()))
}

pub async fn update_password(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(req): Json<UpdatePasswordRequest>,
) -> Result<Json<StatusMessage>, ApiError> {
    ensure_not_empty("password", &req.password)?;
    ensure_max_len("password", &req.password, PASSWORD_MAX)?;

    let password_hash = hash_password(&req.password)?;
    state.db.update_password(user_id, &password_hash)?;
    Ok(Json(StatusMessage::ok("Password updated")))
}

pub async fn update_username(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(req): Json<UpdateUsernameRequest>,
) -> Result<Json<StatusMessage>, ApiError> {
    ensure_not_empty("username", &req.username)?;
    ensure_max_len("username", &req.username, USERNAME_MAX)?;

    if let Some(existing) = state.db.get_user_by_username(&req.username)? {
        if existing.user_id != user_id {
            return Err(ApiError::AlreadyExists("Username already exists".into()));
        }
    }

    state.db.update_username(user_id, &req.username)?;
    Ok(Json(StatusMessage::ok("Username updated")))
}

pub async fn block_user(
    State(state): State<AppState>,
    Path(friend_name): Path<String>,
    Json(req): Json<FriendActionRequest>,
) -> Result<Json<StatusMessage>, ApiError> {
    state.db.set_friend_blocked(req.user_id, &friend_name, true)?;
    Ok(Json(StatusMessage::ok("User blocked")))
}

pub async fn unblock_user(
    State(state): State<AppState>,
    Path(friend_name): Path<String>,
    Json(req): Json<FriendActionRequest>,
) -> Result<Json<StatusMessage>, ApiError> {
    state.db.set_friend_blocked(req.user_id, &friend_name, false)?;
    Ok(Json(StatusMessage::ok("User unblocked")))
}

pub async fn get_user_friend(
    State(state): State<AppState>,
    Path(friend_name): Path<String>,
    Json(req): Json<FriendActionRequest>,
) -> Result<Json<FriendEdge>, ApiError> {
    let edge = state.db.get_friend_edge(req.user_id, &friend_name)?;
    Ok(Json(edge.into()))
}

/// Reset the account to a RANDOM single-use temporary password and mail it.
/// (The original shipped a fixed temporary password; a random credential is
/// generated here instead.)
pub async fn forgot_password(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<StatusMessage>, ApiError> {
    let user = state
        .db
        .get_user_by_email(&email)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let temp_password: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect();

    // The stored hash is replaced only once the credential has been mailed;
    // a failed delivery must not strand the account on a password nobody saw.
    state
        .mailer
        .send_temp_password(&email, &user.username, &temp_password)
        .await
        .map_err(|e| {
            error!("password recovery mail failed: {}", e);
            ApiError::Store
        })?;

    let password_hash = hash_password(&temp_password)?;
    state.db.update_password(user.user_id, &password_hash)?;

    Ok(Json(StatusMessage::ok("Recovery email sent")))
}

pub async fn forgot_username(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<StatusMessage>, ApiError> {
    let user = state
        .db
        .get_user_by_email(&email)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    state
        .mailer
        .send_username_reminder(&email, &user.username)
        .await
        .map_err(|e| {
            error!("username recovery mail failed: {}", e);
            ApiError::Store
        })?;

    Ok(Json(StatusMessage::ok("Recovery email sent")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use burrow_db::Database;

    use crate::auth::AppStateInner;
    use crate::mail::Mailer;

    fn state_with_dead_mailer() -> AppState {
        let db = Database::open_in_memory().unwrap();
        db.create_user("alice", "hash-a", "alice@example.com").unwrap();
        Arc::new(AppStateInner {
            db,
            jwt_secret: "test-secret".into(),
            // nothing listens on the discard port, so delivery always fails
            mailer: Mailer::new(Some("http://127.0.0.1:9/mail".into()), "noreply@test".into()),
        })
    }

    #[tokio::test]
    async fn failed_recovery_mail_leaves_password_untouched() {
        let state = state_with_dead_mailer();

        let result =
            forgot_password(State(state.clone()), Path("alice@example.com".into())).await;
        assert!(matches!(result.unwrap_err(), ApiError::Store));

        // the reset must not have been committed
        let user = state
            .db
            .get_user_by_email("alice@example.com")
            .unwrap()
            .unwrap();
        assert_eq!(user.password, "hash-a");
    }

    #[tokio::test]
    async fn recovery_for_unknown_email_is_not_found() {
        let state = state_with_dead_mailer();
        let result = forgot_password(State(state), Path("nobody@example.com".into())).await;
        assert!(matches!(result.unwrap_err(), ApiError::NotFound(_)));
    }
}
