use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use uuid::Uuid;

use crate::auth::{self, AuthUser};
use crate::services::users;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, success};

pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(current_user): AuthUser,
) -> Result<Response, AppError> {
    auth::authorize(&current_user, auth::USER_ADMIN)?;
    let users = users::list_users(&state.pool).await?;
    Ok(success(users, "Users retrieved").into_response())
}

/// Registration is open; no token required.
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<users::CreateUser>,
) -> Result<Response, AppError> {
    let user = users::create_user(&state.pool, payload).await?;
    Ok(created(user, "User created").into_response())
}

pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(current_user): AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Response, AppError> {
    auth::authorize(&current_user, auth::USER_ADMIN)?;
    let user = users::get_user(&state.pool, user_id).await?;
    Ok(success(user, "User retrieved").into_response())
}

pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(current_user): AuthUser,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<users::AdminUpdateUser>,
) -> Result<Response, AppError> {
    auth::authorize(&current_user, auth::USER_ADMIN)?;
    let user = users::update_user(&state.pool, user_id, payload).await?;
    Ok(success(user, "User updated").into_response())
}

pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(current_user): AuthUser,
    Json(payload): Json<users::UpdateSelf>,
) -> Result<Response, AppError> {
    auth::authorize(&current_user, auth::SELF_SERVICE)?;
    let user = users::update_self(&state.pool, current_user.id, payload).await?;
    Ok(success(user, "Profile updated").into_response())
}

pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(current_user): AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Response, AppError> {
    auth::authorize(&current_user, auth::USER_ADMIN)?;
    let user = users::delete_user(&state.pool, user_id).await?;
    Ok(success(user, "User deleted").into_response())
}
