use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use uuid::Uuid;

use crate::auth::{self, AuthUser};
use crate::services::sessions;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, success};

pub async fn list_sessions(
    State(state): State<AppState>,
    AuthUser(current_user): AuthUser,
) -> Result<Response, AppError> {
    auth::authorize(&current_user, auth::EVENT_READ)?;
    let sessions = sessions::list_all(&state.pool).await?;
    Ok(success(sessions, "Sessions retrieved").into_response())
}

pub async fn list_sessions_by_event(
    State(state): State<AppState>,
    AuthUser(current_user): AuthUser,
    Path(event_id): Path<Uuid>,
) -> Result<Response, AppError> {
    auth::authorize(&current_user, auth::EVENT_READ)?;
    let sessions = sessions::list_by_event(&state.pool, event_id).await?;
    Ok(success(sessions, "Sessions retrieved").into_response())
}

pub async fn create_session(
    State(state): State<AppState>,
    AuthUser(current_user): AuthUser,
    Path(event_id): Path<Uuid>,
    Json(payload): Json<sessions::CreateSession>,
) -> Result<Response, AppError> {
    auth::authorize(&current_user, auth::EVENT_WRITE)?;
    let session = sessions::create_session(&state.pool, event_id, payload, &current_user).await?;
    Ok(created(session, "Session created").into_response())
}

pub async fn update_session(
    State(state): State<AppState>,
    AuthUser(current_user): AuthUser,
    Path(session_id): Path<Uuid>,
    Json(payload): Json<sessions::UpdateSession>,
) -> Result<Response, AppError> {
    auth::authorize(&current_user, auth::EVENT_WRITE)?;
    let session = sessions::update_session(&state.pool, session_id, payload, &current_user).await?;
    Ok(success(session, "Session updated").into_response())
}

pub async fn delete_session(
    State(state): State<AppState>,
    AuthUser(current_user): AuthUser,
    Path(session_id): Path<Uuid>,
) -> Result<Response, AppError> {
    auth::authorize(&current_user, auth::EVENT_WRITE)?;
    let session = sessions::delete_session(&state.pool, session_id, &current_user).await?;
    Ok(success(session, "Session deleted").into_response())
}
