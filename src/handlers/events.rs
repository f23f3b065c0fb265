use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{self, AuthUser};
use crate::queue::IssueRequest;
use crate::search::SearchFilters;
use crate::services::events;
use crate::services::ticket::{self, IssueOutcome};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{accepted, created, error, success};

pub async fn list_events(
    State(state): State<AppState>,
    AuthUser(current_user): AuthUser,
    Query(filter): Query<events::EventFilter>,
) -> Result<Response, AppError> {
    auth::authorize(&current_user, auth::EVENT_READ)?;
    let events = events::list_events(&state.pool, &filter).await?;
    Ok(success(events, "Events retrieved").into_response())
}

pub async fn create_event(
    State(state): State<AppState>,
    AuthUser(current_user): AuthUser,
    Json(payload): Json<events::CreateEvent>,
) -> Result<Response, AppError> {
    auth::authorize(&current_user, auth::EVENT_WRITE)?;
    let event = events::create_event(&state.pool, payload).await?;

    // Mirror update happens after commit, outside the write path
    state.mirror.push(event.id);
    Ok(created(event, "Event created").into_response())
}

pub async fn get_event(
    State(state): State<AppState>,
    AuthUser(current_user): AuthUser,
    Path(event_id): Path<Uuid>,
) -> Result<Response, AppError> {
    auth::authorize(&current_user, auth::EVENT_READ)?;
    let event = events::get_event(&state.pool, event_id).await?;
    Ok(success(event, "Event retrieved").into_response())
}

pub async fn update_event(
    State(state): State<AppState>,
    AuthUser(current_user): AuthUser,
    Path(event_id): Path<Uuid>,
    Json(payload): Json<events::UpdateEvent>,
) -> Result<Response, AppError> {
    auth::authorize(&current_user, auth::EVENT_WRITE)?;
    let event = events::update_event(&state.pool, event_id, payload, &current_user).await?;

    state.mirror.push(event.id);
    Ok(success(event, "Event updated").into_response())
}

pub async fn delete_event(
    State(state): State<AppState>,
    AuthUser(current_user): AuthUser,
    Path(event_id): Path<Uuid>,
) -> Result<Response, AppError> {
    auth::authorize(&current_user, auth::EVENT_WRITE)?;
    let event = events::delete_event(&state.pool, event_id, &current_user).await?;
    Ok(success(event, "Event deleted").into_response())
}

/// Queued issuance: the request is handed to the worker pool and the call
/// returns immediately. The capacity decision happens in the engine, not
/// here.
pub async fn enqueue_ticket(
    State(state): State<AppState>,
    AuthUser(current_user): AuthUser,
    Path(event_id): Path<Uuid>,
) -> Result<Response, AppError> {
    auth::authorize(&current_user, auth::TICKET_CREATE)?;
    // Reject unknown events up front; the engine re-checks under lock
    events::get_event(&state.pool, event_id).await?;

    state.tickets.enqueue(IssueRequest {
        event_id,
        user_id: current_user.id,
    })?;
    Ok(accepted("Ticket request queued").into_response())
}

/// Synchronous issuance against the same capacity pool as the queued path.
pub async fn issue_ticket_now(
    State(state): State<AppState>,
    AuthUser(current_user): AuthUser,
    Path(event_id): Path<Uuid>,
) -> Result<Response, AppError> {
    auth::authorize(&current_user, auth::TICKET_CREATE)?;

    let outcome = ticket::issue_ticket(
        &state.pool,
        event_id,
        current_user.id,
        state.config.issue_txn_timeout,
    )
    .await?;

    Ok(issue_outcome_response(outcome))
}

pub async fn get_ticket(
    State(state): State<AppState>,
    AuthUser(current_user): AuthUser,
    Path(ticket_id): Path<Uuid>,
) -> Result<Response, AppError> {
    auth::authorize(&current_user, auth::EVENT_READ)?;
    let ticket = events::get_ticket(&state.pool, ticket_id).await?;
    Ok(success(ticket, "Ticket retrieved").into_response())
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    pub status: Option<crate::models::EventStatus>,
    pub category_name: Option<String>,
    pub location_name: Option<String>,
    pub min_date: Option<chrono::DateTime<chrono::Utc>>,
    pub max_date: Option<chrono::DateTime<chrono::Utc>>,
}

pub async fn search_events(
    State(state): State<AppState>,
    AuthUser(current_user): AuthUser,
    Query(params): Query<SearchParams>,
) -> Result<Response, AppError> {
    auth::authorize(&current_user, auth::EVENT_READ)?;
    let filters = SearchFilters {
        status: params.status,
        category_name: params.category_name,
        location_name: params.location_name,
        min_date: params.min_date,
        max_date: params.max_date,
    };
    let documents = state.search.search(&params.q, &filters).await?;
    Ok(success(documents, "Search results retrieved").into_response())
}

/// `SoldOut` maps to a dedicated 409 so clients can stop retrying, unlike
/// a 5xx which is retryable.
fn issue_outcome_response(outcome: IssueOutcome) -> Response {
    match outcome {
        IssueOutcome::Issued(ticket) => created(ticket, "Ticket issued").into_response(),
        IssueOutcome::SoldOut => error(
            "SOLD_OUT",
            "Event sold out",
            None,
            axum::http::StatusCode::CONFLICT,
        ),
        IssueOutcome::EventNotFound => {
            AppError::NotFound("Event not found".to_string()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventTicket;
    use axum::http::StatusCode;
    use chrono::Utc;

    #[test]
    fn test_issued_maps_to_created() {
        let ticket = EventTicket {
            id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let response = issue_outcome_response(IssueOutcome::Issued(ticket));
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[test]
    fn test_sold_out_maps_to_conflict() {
        let response = issue_outcome_response(IssueOutcome::SoldOut);
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_missing_event_maps_to_not_found() {
        let response = issue_outcome_response(IssueOutcome::EventNotFound);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
