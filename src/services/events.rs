use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::auth;
use crate::models::{Event, EventStatus, EventTicket, User};
use crate::search::EventDocument;
use crate::utils::error::AppError;

#[derive(Debug, Deserialize)]
pub struct CreateEvent {
    pub name: String,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    pub capacity: i32,
    pub status: EventStatus,
    pub location_id: Uuid,
    pub category_id: Uuid,
    pub owner_id: Uuid,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateEvent {
    pub name: Option<String>,
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub capacity: Option<i32>,
    pub status: Option<EventStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EventFilter {
    pub name: Option<String>,
    pub min_date: Option<DateTime<Utc>>,
    pub max_date: Option<DateTime<Utc>>,
    pub status: Option<EventStatus>,
    pub location_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub offset: i64,
    pub limit: Option<i64>,
}

const DEFAULT_PAGE_SIZE: i64 = 10;

pub async fn list_events(pool: &PgPool, filter: &EventFilter) -> Result<Vec<Event>, AppError> {
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM events WHERE TRUE");

    if let Some(name) = &filter.name {
        qb.push(" AND name ILIKE ").push_bind(format!("%{name}%"));
    }
    if let Some(min_date) = filter.min_date {
        qb.push(" AND date >= ").push_bind(min_date);
    }
    if let Some(max_date) = filter.max_date {
        qb.push(" AND date <= ").push_bind(max_date);
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(location_id) = filter.location_id {
        qb.push(" AND location_id = ").push_bind(location_id);
    }
    if let Some(category_id) = filter.category_id {
        qb.push(" AND category_id = ").push_bind(category_id);
    }

    qb.push(" ORDER BY date OFFSET ")
        .push_bind(filter.offset.max(0))
        .push(" LIMIT ")
        .push_bind(filter.limit.unwrap_or(DEFAULT_PAGE_SIZE));

    let events = qb.build_query_as::<Event>().fetch_all(pool).await?;
    Ok(events)
}

pub async fn create_event(pool: &PgPool, event: CreateEvent) -> Result<Event, AppError> {
    let created = sqlx::query_as::<_, Event>(
        "INSERT INTO events (name, description, date, capacity, status, location_id, category_id, owner_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
    )
    .bind(&event.name)
    .bind(&event.description)
    .bind(event.date)
    .bind(event.capacity)
    .bind(event.status)
    .bind(event.location_id)
    .bind(event.category_id)
    .bind(event.owner_id)
    .fetch_one(pool)
    .await?;
    Ok(created)
}

pub async fn get_event(pool: &PgPool, event_id: Uuid) -> Result<Event, AppError> {
    sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
        .bind(event_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))
}

/// Partial update. Lowering `capacity` below the already-issued ticket
/// count is rejected; the check runs under the same row lock the issuance
/// engine takes, so it cannot race a concurrent issuance.
pub async fn update_event(
    pool: &PgPool,
    event_id: Uuid,
    update: UpdateEvent,
    current_user: &User,
) -> Result<Event, AppError> {
    let mut tx = pool.begin().await?;

    let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1 FOR UPDATE")
        .bind(event_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

    auth::authorize_event_mutation(current_user, &event)?;

    if let Some(new_capacity) = update.capacity {
        let issued: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM event_tickets WHERE event_id = $1")
                .bind(event_id)
                .fetch_one(&mut *tx)
                .await?;
        if i64::from(new_capacity) < issued {
            return Err(AppError::Validation(format!(
                "Capacity {new_capacity} is below the {issued} tickets already issued"
            )));
        }
    }

    let updated = sqlx::query_as::<_, Event>(
        "UPDATE events SET \
            name = COALESCE($2, name), \
            description = COALESCE($3, description), \
            date = COALESCE($4, date), \
            capacity = COALESCE($5, capacity), \
            status = COALESCE($6, status), \
            updated_at = now() \
         WHERE id = $1 RETURNING *",
    )
    .bind(event_id)
    .bind(&update.name)
    .bind(&update.description)
    .bind(update.date)
    .bind(update.capacity)
    .bind(update.status)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(updated)
}

/// Deletes the event; sessions and tickets cascade.
pub async fn delete_event(
    pool: &PgPool,
    event_id: Uuid,
    current_user: &User,
) -> Result<Event, AppError> {
    let event = get_event(pool, event_id).await?;
    auth::authorize_event_mutation(current_user, &event)?;

    sqlx::query("DELETE FROM events WHERE id = $1")
        .bind(event_id)
        .execute(pool)
        .await?;
    Ok(event)
}

pub async fn get_ticket(pool: &PgPool, ticket_id: Uuid) -> Result<EventTicket, AppError> {
    sqlx::query_as::<_, EventTicket>("SELECT * FROM event_tickets WHERE id = $1")
        .bind(ticket_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Ticket not found".to_string()))
}

/// Denormalized view of an event with resolved category and location
/// names, as pushed to the search mirror.
pub async fn load_document(pool: &PgPool, event_id: Uuid) -> Result<Option<EventDocument>, AppError> {
    let doc = sqlx::query_as::<_, EventDocument>(
        "SELECT e.id, e.name, e.description, e.date, e.capacity, e.status, \
                e.location_id, c.name AS location_name, \
                e.category_id, cat.name AS category_name, \
                e.owner_id \
         FROM events e \
         JOIN cities c ON c.id = e.location_id \
         JOIN categories cat ON cat.id = e.category_id \
         WHERE e.id = $1",
    )
    .bind(event_id)
    .fetch_optional(pool)
    .await?;
    Ok(doc)
}
