use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use eventdesk_server::config::Config;
use eventdesk_server::queue::TicketQueue;
use eventdesk_server::routes::create_routes;
use eventdesk_server::search::{spawn_mirror_worker, MirrorQueue, SearchClient};
use eventdesk_server::services::ticket::PgIssuer;
use eventdesk_server::state::AppState;
use eventdesk_server::queue;

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Arc::new(Config::from_env());

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Successfully connected to database");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    tracing::info!("Migrations run successfully");

    // Issuance worker pool, fed by the HTTP layer through the queue
    let (tickets, issue_rx) = TicketQueue::new(config.issue_queue_capacity);
    let issuer = Arc::new(PgIssuer::new(pool.clone(), config.issue_txn_timeout));
    queue::spawn_issue_workers(
        config.issue_workers,
        issuer,
        issue_rx,
        config.issue_max_retries,
    );

    // Search mirror worker, fed by post-commit event ids
    let search_client = Arc::new(SearchClient::new(config.search.clone()));
    let (mirror, mirror_rx) = MirrorQueue::new(config.mirror_queue_capacity);
    spawn_mirror_worker(pool.clone(), Arc::clone(&search_client), mirror_rx);

    let state = AppState {
        pool,
        config: Arc::clone(&config),
        tickets,
        mirror,
        search: search_client,
    };

    let app: Router = create_routes(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server running at http://{}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app).await.expect("Server failed");
}
