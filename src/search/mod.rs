//! Best-effort search mirror.
//!
//! Event writes enqueue the event id; a worker rebuilds the denormalized
//! document from the system of record and pushes it to an
//! Elasticsearch-compatible index over HTTP. The push sits outside the
//! transactional boundary: mirror freshness is eventual and carries no
//! capacity or authorization guarantee.

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::SearchConfig;
use crate::models::EventStatus;
use crate::services::events;
use crate::utils::error::AppError;

const MIRROR_MAX_ATTEMPTS: u32 = 3;

/// Denormalized event view stored in the index: event fields plus resolved
/// category and location names.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventDocument {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    pub capacity: i32,
    pub status: EventStatus,
    pub location_id: Uuid,
    pub location_name: String,
    pub category_id: Uuid,
    pub category_name: String,
    pub owner_id: Uuid,
}

/// Exact-match filters accepted by the query endpoint, alongside free text.
#[derive(Debug, Default, Deserialize)]
pub struct SearchFilters {
    pub status: Option<EventStatus>,
    pub category_name: Option<String>,
    pub location_name: Option<String>,
    pub min_date: Option<DateTime<Utc>>,
    pub max_date: Option<DateTime<Utc>>,
}

pub struct SearchClient {
    http: reqwest::Client,
    config: SearchConfig,
}

impl SearchClient {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}/{}", self.config.base_url, self.config.index, path);
        let mut builder = self.http.request(method, url);
        if let Some(username) = &self.config.username {
            builder = builder.basic_auth(username, self.config.password.as_deref());
        }
        builder
    }

    pub async fn index_document(&self, doc: &EventDocument) -> Result<(), AppError> {
        let response = self
            .request(reqwest::Method::PUT, &format!("_doc/{}", doc.id))
            .json(doc)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Mirror push failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Internal(format!(
                "Mirror push rejected with status {}",
                response.status()
            )));
        }
        Ok(())
    }

    pub async fn search(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> Result<Vec<EventDocument>, AppError> {
        let body = build_query_body(query, filters);
        let response = self
            .request(reqwest::Method::POST, "_search")
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Search request failed: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            // Index not created yet: nothing has been mirrored
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(AppError::Internal(format!(
                "Search rejected with status {}",
                response.status()
            )));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| AppError::Internal(format!("Malformed search response: {e}")))?;

        Ok(body
            .hits
            .hits
            .into_iter()
            .map(|hit| hit._source)
            .collect())
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    hits: SearchHits,
}

#[derive(Deserialize)]
struct SearchHits {
    hits: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    _source: EventDocument,
}

/// Free text becomes a `multi_match` over name and description; filters
/// become exact `term` / `range` clauses.
fn build_query_body(query: &str, filters: &SearchFilters) -> Value {
    let must = if query.is_empty() {
        json!({ "match_all": {} })
    } else {
        json!({ "multi_match": { "query": query, "fields": ["name", "description"] } })
    };

    let mut filter_clauses = Vec::new();
    if let Some(status) = filters.status {
        filter_clauses.push(json!({ "term": { "status": status.to_string() } }));
    }
    if let Some(category_name) = &filters.category_name {
        filter_clauses.push(json!({ "term": { "category_name": category_name } }));
    }
    if let Some(location_name) = &filters.location_name {
        filter_clauses.push(json!({ "term": { "location_name": location_name } }));
    }
    if filters.min_date.is_some() || filters.max_date.is_some() {
        let mut range = serde_json::Map::new();
        if let Some(min_date) = filters.min_date {
            range.insert("gte".to_string(), json!(min_date));
        }
        if let Some(max_date) = filters.max_date {
            range.insert("lte".to_string(), json!(max_date));
        }
        filter_clauses.push(json!({ "range": { "date": range } }));
    }

    json!({
        "query": {
            "bool": {
                "must": [must],
                "filter": filter_clauses
            }
        }
    })
}

/// Producer side of the mirror channel. Pushes are fire-and-forget from
/// the request path; a full channel drops the update and logs it, keeping
/// staleness visible and bounded instead of blocking a write.
#[derive(Clone)]
pub struct MirrorQueue {
    tx: mpsc::Sender<Uuid>,
}

impl MirrorQueue {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Uuid>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    pub fn push(&self, event_id: Uuid) {
        if let Err(e) = self.tx.try_send(event_id) {
            tracing::warn!(event_id = %event_id, error = %e, "Mirror update dropped");
        }
    }
}

pub fn spawn_mirror_worker(
    pool: PgPool,
    client: Arc<SearchClient>,
    mut rx: mpsc::Receiver<Uuid>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event_id) = rx.recv().await {
            if let Err(e) = mirror_event(&pool, &client, event_id).await {
                tracing::error!(event_id = %event_id, error = %e, "Mirror update failed");
            }
        }
        tracing::debug!("Mirror queue closed, worker exiting");
    })
}

async fn mirror_event(
    pool: &PgPool,
    client: &SearchClient,
    event_id: Uuid,
) -> Result<(), AppError> {
    let Some(doc) = events::load_document(pool, event_id).await? else {
        // Deleted between commit and mirror pass; nothing to index
        tracing::debug!(event_id = %event_id, "Skipping mirror update for missing event");
        return Ok(());
    };

    let mut last_err = None;
    for attempt in 0..MIRROR_MAX_ATTEMPTS {
        match client.index_document(&doc).await {
            Ok(()) => {
                tracing::debug!(event_id = %event_id, "Mirror document updated");
                return Ok(());
            }
            Err(e) => {
                tracing::warn!(event_id = %event_id, attempt, error = %e, "Mirror push retry");
                last_err = Some(e);
                tokio::time::sleep(std::time::Duration::from_millis(200 << attempt)).await;
            }
        }
    }
    Err(last_err.unwrap_or_else(|| AppError::Internal("Mirror push failed".to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_body_free_text_only() {
        let body = build_query_body("rustconf", &SearchFilters::default());
        assert_eq!(
            body["query"]["bool"]["must"][0]["multi_match"]["query"],
            "rustconf"
        );
        assert_eq!(body["query"]["bool"]["filter"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_query_body_empty_text_matches_all() {
        let body = build_query_body("", &SearchFilters::default());
        assert!(body["query"]["bool"]["must"][0]["match_all"].is_object());
    }

    #[test]
    fn test_query_body_filters() {
        let filters = SearchFilters {
            status: Some(EventStatus::OnProcess),
            category_name: Some("music".to_string()),
            location_name: None,
            min_date: Some(Utc::now()),
            max_date: None,
        };
        let body = build_query_body("festival", &filters);
        let clauses = body["query"]["bool"]["filter"].as_array().unwrap();
        assert_eq!(clauses.len(), 3);
        assert_eq!(clauses[0]["term"]["status"], "on-process");
        assert_eq!(clauses[1]["term"]["category_name"], "music");
        assert!(clauses[2]["range"]["date"]["gte"].is_string());
        assert!(clauses[2]["range"]["date"].get("lte").is_none());
    }

    #[test]
    fn test_document_round_trips_through_json() {
        let doc = EventDocument {
            id: Uuid::new_v4(),
            name: "RustConf".to_string(),
            description: Some("All things Rust".to_string()),
            date: Utc::now(),
            capacity: 500,
            status: EventStatus::Created,
            location_id: Uuid::new_v4(),
            location_name: "Berlin".to_string(),
            category_id: Uuid::new_v4(),
            category_name: "tech".to_string(),
            owner_id: Uuid::new_v4(),
        };
        let json = serde_json::to_string(&doc).unwrap();
        let parsed: EventDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, doc.id);
        assert_eq!(parsed.location_name, "Berlin");
        assert_eq!(parsed.status, EventStatus::Created);
    }
}
