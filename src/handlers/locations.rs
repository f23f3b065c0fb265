use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::auth::{self, AuthUser};
use crate::services::locations;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, success};

pub async fn list_countries(
    State(state): State<AppState>,
    AuthUser(current_user): AuthUser,
) -> Result<Response, AppError> {
    auth::authorize(&current_user, auth::CATALOG_WRITE)?;
    let countries = locations::list_countries(&state.pool).await?;
    Ok(success(countries, "Countries retrieved").into_response())
}

pub async fn create_country(
    State(state): State<AppState>,
    AuthUser(current_user): AuthUser,
    Json(payload): Json<locations::CreateCountry>,
) -> Result<Response, AppError> {
    auth::authorize(&current_user, auth::CATALOG_WRITE)?;
    let country = locations::create_country(&state.pool, payload).await?;
    Ok(created(country, "Country created").into_response())
}

pub async fn list_cities(
    State(state): State<AppState>,
    AuthUser(current_user): AuthUser,
) -> Result<Response, AppError> {
    auth::authorize(&current_user, auth::CATALOG_WRITE)?;
    let cities = locations::list_cities(&state.pool).await?;
    Ok(success(cities, "Cities retrieved").into_response())
}

pub async fn create_city(
    State(state): State<AppState>,
    AuthUser(current_user): AuthUser,
    Json(payload): Json<locations::CreateCity>,
) -> Result<Response, AppError> {
    auth::authorize(&current_user, auth::CATALOG_WRITE)?;
    let city = locations::create_city(&state.pool, payload).await?;
    Ok(created(city, "City created").into_response())
}
