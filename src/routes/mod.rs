use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::config::{create_cors_layer, create_security_headers_layer};
use crate::handlers::{auth, categories, events, health_check, locations, sessions, users};
use crate::state::AppState;

pub fn create_routes(state: AppState) -> Router {
    let api = Router::new()
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/me", patch(users::update_me))
        .route(
            "/users/:user_id",
            get(users::get_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        )
        .route("/events", get(events::list_events).post(events::create_event))
        .route("/events/search", get(events::search_events))
        .route("/events/ticket/:event_id", post(events::enqueue_ticket))
        .route(
            "/events/ticket/:event_id/now",
            post(events::issue_ticket_now),
        )
        .route("/events/tickets/:ticket_id", get(events::get_ticket))
        .route(
            "/events/:event_id",
            get(events::get_event)
                .patch(events::update_event)
                .delete(events::delete_event),
        )
        .route("/sessions", get(sessions::list_sessions))
        .route(
            "/sessions/:id",
            get(sessions::list_sessions_by_event)
                .post(sessions::create_session)
                .patch(sessions::update_session)
                .delete(sessions::delete_session),
        )
        .route(
            "/categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/locations/country",
            get(locations::list_countries).post(locations::create_country),
        )
        .route(
            "/locations/city",
            get(locations::list_cities).post(locations::create_city),
        );

    Router::new()
        .route("/health", get(health_check))
        .route("/login", post(auth::login))
        .nest("/api", api)
        .layer(create_security_headers_layer())
        .layer(create_cors_layer())
        .with_state(state)
}
