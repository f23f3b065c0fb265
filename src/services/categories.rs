use serde::Deserialize;
use sqlx::PgPool;

use crate::models::Category;
use crate::utils::error::AppError;

#[derive(Debug, Deserialize)]
pub struct CreateCategory {
    pub name: String,
}

pub async fn list_categories(pool: &PgPool) -> Result<Vec<Category>, AppError> {
    let categories = sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name")
        .fetch_all(pool)
        .await?;
    Ok(categories)
}

pub async fn create_category(pool: &PgPool, category: CreateCategory) -> Result<Category, AppError> {
    let created =
        sqlx::query_as::<_, Category>("INSERT INTO categories (name) VALUES ($1) RETURNING *")
            .bind(&category.name)
            .fetch_one(pool)
            .await?;
    Ok(created)
}
