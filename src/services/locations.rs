use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{City, Country};
use crate::utils::error::AppError;

#[derive(Debug, Deserialize)]
pub struct CreateCountry {
    pub name: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateCity {
    pub name: String,
    pub country_id: Uuid,
}

pub async fn list_countries(pool: &PgPool) -> Result<Vec<Country>, AppError> {
    let countries = sqlx::query_as::<_, Country>("SELECT * FROM countries ORDER BY name")
        .fetch_all(pool)
        .await?;
    Ok(countries)
}

pub async fn create_country(pool: &PgPool, country: CreateCountry) -> Result<Country, AppError> {
    let created = sqlx::query_as::<_, Country>(
        "INSERT INTO countries (name, code) VALUES ($1, $2) RETURNING *",
    )
    .bind(&country.name)
    .bind(&country.code)
    .fetch_one(pool)
    .await?;
    Ok(created)
}

pub async fn list_cities(pool: &PgPool) -> Result<Vec<City>, AppError> {
    let cities = sqlx::query_as::<_, City>("SELECT * FROM cities ORDER BY name")
        .fetch_all(pool)
        .await?;
    Ok(cities)
}

pub async fn create_city(pool: &PgPool, city: CreateCity) -> Result<City, AppError> {
    let created = sqlx::query_as::<_, City>(
        "INSERT INTO cities (name, country_id) VALUES ($1, $2) RETURNING *",
    )
    .bind(&city.name)
    .bind(city.country_id)
    .fetch_one(pool)
    .await?;
    Ok(created)
}
