use std::env;
use std::time::Duration;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::create_security_headers_layer;

const DEFAULT_TOKEN_TTL_MINUTES: i64 = 15;
const DEFAULT_ISSUE_WORKERS: usize = 4;
const DEFAULT_ISSUE_QUEUE_CAPACITY: usize = 1024;
const DEFAULT_ISSUE_MAX_RETRIES: u32 = 3;
const DEFAULT_ISSUE_TXN_TIMEOUT_SECS: u64 = 5;
const DEFAULT_MIRROR_QUEUE_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    pub issue_workers: usize,
    pub issue_queue_capacity: usize,
    pub issue_max_retries: u32,
    pub issue_txn_timeout: Duration,
    pub mirror_queue_capacity: usize,
    pub search: SearchConfig,
}

/// Connection settings for the Elasticsearch-compatible mirror.
#[derive(Clone)]
pub struct SearchConfig {
    pub base_url: String,
    pub index: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost/eventdesk".to_string()),
            port: parse_env("PORT", 3001),
            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| "change-me".to_string()),
            token_ttl: chrono::Duration::minutes(parse_env(
                "TOKEN_TTL_MINUTES",
                DEFAULT_TOKEN_TTL_MINUTES,
            )),
            issue_workers: parse_env("ISSUE_WORKERS", DEFAULT_ISSUE_WORKERS),
            issue_queue_capacity: parse_env("ISSUE_QUEUE_CAPACITY", DEFAULT_ISSUE_QUEUE_CAPACITY),
            issue_max_retries: parse_env("ISSUE_MAX_RETRIES", DEFAULT_ISSUE_MAX_RETRIES),
            issue_txn_timeout: Duration::from_secs(parse_env(
                "ISSUE_TXN_TIMEOUT_SECS",
                DEFAULT_ISSUE_TXN_TIMEOUT_SECS,
            )),
            mirror_queue_capacity: parse_env(
                "MIRROR_QUEUE_CAPACITY",
                DEFAULT_MIRROR_QUEUE_CAPACITY,
            ),
            search: SearchConfig {
                base_url: env::var("SEARCH_URL")
                    .unwrap_or_else(|_| "http://localhost:9200".to_string()),
                index: env::var("SEARCH_INDEX").unwrap_or_else(|_| "event".to_string()),
                username: env::var("SEARCH_USERNAME").ok(),
                password: env::var("SEARCH_PASSWORD").ok(),
            },
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_falls_back_to_default() {
        std::env::remove_var("EVENTDESK_TEST_MISSING");
        let value: u16 = parse_env("EVENTDESK_TEST_MISSING", 42);
        assert_eq!(value, 42);
    }

    #[test]
    fn test_parse_env_ignores_garbage() {
        std::env::set_var("EVENTDESK_TEST_GARBAGE", "not-a-number");
        let value: usize = parse_env("EVENTDESK_TEST_GARBAGE", 7);
        assert_eq!(value, 7);
        std::env::remove_var("EVENTDESK_TEST_GARBAGE");
    }
}
