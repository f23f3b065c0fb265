use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{jwt, password};
use crate::config::Config;
use crate::models::{Role, User};
use crate::utils::error::AppError;

#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub fullname: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Fields an admin may change on any account.
#[derive(Debug, Default, Deserialize)]
pub struct AdminUpdateUser {
    pub fullname: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
    pub active: Option<bool>,
}

/// Fields a user may change on their own account.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateSelf {
    pub fullname: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

pub async fn list_users(pool: &PgPool) -> Result<Vec<User>, AppError> {
    let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at")
        .fetch_all(pool)
        .await?;
    Ok(users)
}

pub async fn create_user(pool: &PgPool, user: CreateUser) -> Result<User, AppError> {
    let existing: Option<Uuid> = sqlx::query_scalar("SELECT id FROM users WHERE email = $1")
        .bind(&user.email)
        .fetch_optional(pool)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(
            "There is already a user with that email".to_string(),
        ));
    }

    let hash = password::hash_password(&user.password).await?;

    let created = sqlx::query_as::<_, User>(
        "INSERT INTO users (fullname, email, active, role, password_hash) \
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(&user.fullname)
    .bind(&user.email)
    .bind(user.active)
    .bind(user.role)
    .bind(&hash)
    .fetch_one(pool)
    .await?;
    Ok(created)
}

pub async fn get_user(pool: &PgPool, user_id: Uuid) -> Result<User, AppError> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

pub async fn update_user(
    pool: &PgPool,
    user_id: Uuid,
    update: AdminUpdateUser,
) -> Result<User, AppError> {
    // Ensure the target exists before touching anything
    get_user(pool, user_id).await?;

    let hash = match &update.password {
        Some(plain) => Some(password::hash_password(plain).await?),
        None => None,
    };

    let updated = sqlx::query_as::<_, User>(
        "UPDATE users SET \
            fullname = COALESCE($2, fullname), \
            email = COALESCE($3, email), \
            password_hash = COALESCE($4, password_hash), \
            role = COALESCE($5, role), \
            active = COALESCE($6, active), \
            updated_at = now() \
         WHERE id = $1 RETURNING *",
    )
    .bind(user_id)
    .bind(&update.fullname)
    .bind(&update.email)
    .bind(&hash)
    .bind(update.role)
    .bind(update.active)
    .fetch_one(pool)
    .await?;
    Ok(updated)
}

pub async fn update_self(
    pool: &PgPool,
    user_id: Uuid,
    update: UpdateSelf,
) -> Result<User, AppError> {
    update_user(
        pool,
        user_id,
        AdminUpdateUser {
            fullname: update.fullname,
            email: update.email,
            password: update.password,
            role: None,
            active: None,
        },
    )
    .await
}

pub async fn delete_user(pool: &PgPool, user_id: Uuid) -> Result<User, AppError> {
    let user = get_user(pool, user_id).await?;
    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(user)
}

/// Verifies credentials and issues a bearer token with the user's email as
/// subject. Unknown email and bad password are indistinguishable to the
/// caller.
pub async fn login(
    pool: &PgPool,
    config: &Config,
    email: &str,
    plain_password: &str,
) -> Result<TokenResponse, AppError> {
    let invalid =
        || AppError::Unauthenticated("Incorrect username or password".to_string());

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?
        .ok_or_else(invalid)?;

    if !password::verify_password(plain_password, &user.password_hash).await? {
        return Err(invalid());
    }

    let access_token = jwt::encode_token(&user.email, &config.jwt_secret, config.token_ttl)?;
    Ok(TokenResponse {
        access_token,
        token_type: "bearer",
    })
}
