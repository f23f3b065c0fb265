//! Ticket issuance engine: the single authority converting an issuance
//! request into a persisted ticket or a sold-out result.
//!
//! Capacity is enforced inside one transaction holding a row lock on the
//! event (`SELECT ... FOR UPDATE`), so two concurrent callers can never
//! both observe a free slot when only one remains. Arrival order is not a
//! correctness mechanism; the lock is.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::EventTicket;
use crate::utils::error::AppError;

/// Typed outcome of an issuance attempt. `SoldOut` is an expected business
/// result, not a fault.
#[derive(Debug)]
pub enum IssueOutcome {
    Issued(EventTicket),
    SoldOut,
    EventNotFound,
}

/// Seam between the queue workers and the engine; lets tests substitute an
/// in-memory engine for the PostgreSQL-backed one.
#[async_trait]
pub trait Issuer: Send + Sync {
    async fn issue(&self, event_id: Uuid, user_id: Uuid) -> Result<IssueOutcome, AppError>;
}

/// Production issuer backed by the shared pool. Each call acquires its own
/// connection, independent of the request-serving path.
pub struct PgIssuer {
    pool: PgPool,
    txn_timeout: Duration,
}

impl PgIssuer {
    pub fn new(pool: PgPool, txn_timeout: Duration) -> Self {
        Self { pool, txn_timeout }
    }
}

#[async_trait]
impl Issuer for PgIssuer {
    async fn issue(&self, event_id: Uuid, user_id: Uuid) -> Result<IssueOutcome, AppError> {
        issue_ticket(&self.pool, event_id, user_id, self.txn_timeout).await
    }
}

/// Issue one ticket against the event's capacity.
///
/// The whole check-and-insert runs under a bounded timeout so a stalled
/// lock holder cannot starve issuance for the event indefinitely.
pub async fn issue_ticket(
    pool: &PgPool,
    event_id: Uuid,
    user_id: Uuid,
    txn_timeout: Duration,
) -> Result<IssueOutcome, AppError> {
    tokio::time::timeout(txn_timeout, issue_in_txn(pool, event_id, user_id))
        .await
        .map_err(|_| AppError::Internal("Ticket issuance transaction timed out".to_string()))?
}

async fn issue_in_txn(
    pool: &PgPool,
    event_id: Uuid,
    user_id: Uuid,
) -> Result<IssueOutcome, AppError> {
    let mut tx = pool.begin().await?;

    // Row lock on the event serializes concurrent issuance attempts.
    let capacity: Option<i32> =
        sqlx::query_scalar("SELECT capacity FROM events WHERE id = $1 FOR UPDATE")
            .bind(event_id)
            .fetch_optional(&mut *tx)
            .await?;

    let Some(capacity) = capacity else {
        return Ok(IssueOutcome::EventNotFound);
    };

    let issued: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM event_tickets WHERE event_id = $1")
        .bind(event_id)
        .fetch_one(&mut *tx)
        .await?;

    if issued >= i64::from(capacity) {
        tx.rollback().await?;
        return Ok(IssueOutcome::SoldOut);
    }

    let ticket = sqlx::query_as::<_, EventTicket>(
        "INSERT INTO event_tickets (event_id, user_id) VALUES ($1, $2) RETURNING *",
    )
    .bind(event_id)
    .bind(user_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        event_id = %event_id,
        user_id = %user_id,
        ticket_id = %ticket.id,
        issued = issued + 1,
        capacity,
        "Ticket issued"
    );

    Ok(IssueOutcome::Issued(ticket))
}
