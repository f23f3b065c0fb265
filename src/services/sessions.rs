use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth;
use crate::models::{EventSession, User};
use crate::services::events;
use crate::utils::error::AppError;

#[derive(Debug, Deserialize)]
pub struct CreateSession {
    pub name: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub capacity: i32,
    pub speaker: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateSession {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub capacity: Option<i32>,
    pub speaker: Option<String>,
}

pub async fn list_all(pool: &PgPool) -> Result<Vec<EventSession>, AppError> {
    let sessions =
        sqlx::query_as::<_, EventSession>("SELECT * FROM event_sessions ORDER BY start_time")
            .fetch_all(pool)
            .await?;
    Ok(sessions)
}

pub async fn list_by_event(pool: &PgPool, event_id: Uuid) -> Result<Vec<EventSession>, AppError> {
    // 404 on a missing event rather than an empty list
    events::get_event(pool, event_id).await?;

    let sessions = sqlx::query_as::<_, EventSession>(
        "SELECT * FROM event_sessions WHERE event_id = $1 ORDER BY start_time",
    )
    .bind(event_id)
    .fetch_all(pool)
    .await?;
    Ok(sessions)
}

pub async fn get_session(pool: &PgPool, session_id: Uuid) -> Result<EventSession, AppError> {
    sqlx::query_as::<_, EventSession>("SELECT * FROM event_sessions WHERE id = $1")
        .bind(session_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))
}

pub async fn create_session(
    pool: &PgPool,
    event_id: Uuid,
    session: CreateSession,
    current_user: &User,
) -> Result<EventSession, AppError> {
    let event = events::get_event(pool, event_id).await?;
    auth::authorize_event_mutation(current_user, &event)?;

    let created = sqlx::query_as::<_, EventSession>(
        "INSERT INTO event_sessions (event_id, name, description, start_time, end_time, capacity, speaker) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
    )
    .bind(event_id)
    .bind(&session.name)
    .bind(&session.description)
    .bind(session.start_time)
    .bind(session.end_time)
    .bind(session.capacity)
    .bind(&session.speaker)
    .fetch_one(pool)
    .await?;
    Ok(created)
}

pub async fn update_session(
    pool: &PgPool,
    session_id: Uuid,
    update: UpdateSession,
    current_user: &User,
) -> Result<EventSession, AppError> {
    let session = get_session(pool, session_id).await?;
    let event = events::get_event(pool, session.event_id).await?;
    auth::authorize_event_mutation(current_user, &event)?;

    let updated = sqlx::query_as::<_, EventSession>(
        "UPDATE event_sessions SET \
            name = COALESCE($2, name), \
            description = COALESCE($3, description), \
            start_time = COALESCE($4, start_time), \
            end_time = COALESCE($5, end_time), \
            capacity = COALESCE($6, capacity), \
            speaker = COALESCE($7, speaker), \
            updated_at = now() \
         WHERE id = $1 RETURNING *",
    )
    .bind(session_id)
    .bind(&update.name)
    .bind(&update.description)
    .bind(update.start_time)
    .bind(update.end_time)
    .bind(update.capacity)
    .bind(&update.speaker)
    .fetch_one(pool)
    .await?;
    Ok(updated)
}

pub async fn delete_session(
    pool: &PgPool,
    session_id: Uuid,
    current_user: &User,
) -> Result<EventSession, AppError> {
    let session = get_session(pool, session_id).await?;
    let event = events::get_event(pool, session.event_id).await?;
    auth::authorize_event_mutation(current_user, &event)?;

    sqlx::query("DELETE FROM event_sessions WHERE id = $1")
        .bind(session_id)
        .execute(pool)
        .await?;
    Ok(session)
}
