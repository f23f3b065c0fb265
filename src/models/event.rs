use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Lifecycle status of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum EventStatus {
    Created,
    OnProcess,
    Finalized,
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EventStatus::Created => "created",
            EventStatus::OnProcess => "on-process",
            EventStatus::Finalized => "finalized",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    /// Maximum number of tickets issuable; never exceeded by issued tickets.
    pub capacity: i32,
    pub status: EventStatus,
    pub location_id: Uuid,
    pub category_id: Uuid,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EventSession {
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Stored but not enforced by the issuance engine.
    pub capacity: i32,
    pub speaker: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Created only by the issuance engine; immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EventTicket {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&EventStatus::OnProcess).unwrap(),
            "\"on-process\""
        );
        let parsed: EventStatus = serde_json::from_str("\"finalized\"").unwrap();
        assert_eq!(parsed, EventStatus::Finalized);
    }

    #[test]
    fn test_status_display_matches_wire_format() {
        assert_eq!(EventStatus::OnProcess.to_string(), "on-process");
        assert_eq!(EventStatus::Created.to_string(), "created");
    }
}
