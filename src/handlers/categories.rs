use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::auth::{self, AuthUser};
use crate::services::categories;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, success};

pub async fn list_categories(
    State(state): State<AppState>,
    AuthUser(current_user): AuthUser,
) -> Result<Response, AppError> {
    auth::authorize(&current_user, auth::CATALOG_WRITE)?;
    let categories = categories::list_categories(&state.pool).await?;
    Ok(success(categories, "Categories retrieved").into_response())
}

pub async fn create_category(
    State(state): State<AppState>,
    AuthUser(current_user): AuthUser,
    Json(payload): Json<categories::CreateCategory>,
) -> Result<Response, AppError> {
    auth::authorize(&current_user, auth::CATALOG_WRITE)?;
    let category = categories::create_category(&state.pool, payload).await?;
    Ok(created(category, "Category created").into_response())
}
