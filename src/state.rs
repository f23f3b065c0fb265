use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::queue::TicketQueue;
use crate::search::{MirrorQueue, SearchClient};

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub tickets: TicketQueue,
    pub mirror: MirrorQueue,
    pub search: Arc<SearchClient>,
}
