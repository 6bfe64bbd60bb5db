//! Route definitions for the NotiHub HTTP API.
//!
//! All domain routes are organized per resource and mounted under
//! `/api/v1`; health probes live at the root. The router receives
//! `AppState` and passes it to all handlers via Axum's `State` extractor.

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(group_routes())
        .merge(notification_routes())
        .merge(scheduled_routes())
        .merge(subscription_routes())
        .merge(queue_routes())
        .route("/ws", get(handlers::ws::ws_upgrade));

    let cors = build_cors_layer(&state);

    Router::new()
        .nest("/api/v1", api_routes)
        .merge(health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Group CRUD and membership management
fn group_routes() -> Router<AppState> {
    Router::new()
        .route("/groups", post(handlers::group::create_group))
        .route("/groups", get(handlers::group::list_groups))
        .route("/groups/{id}", get(handlers::group::get_group))
        .route("/groups/{id}", put(handlers::group::update_group))
        .route("/groups/{id}", delete(handlers::group::delete_group))
        .route("/groups/{id}/members", post(handlers::group::add_member))
        .route("/groups/{id}/members", get(handlers::group::list_members))
        .route(
            "/groups/{id}/members/{member_id}",
            get(handlers::group::get_member),
        )
        .route(
            "/groups/{id}/members/{member_id}",
            put(handlers::group::update_member),
        )
        .route(
            "/groups/{id}/members/{member_id}",
            delete(handlers::group::remove_member),
        )
}

/// Notification CRUD, lookups, and the send endpoints
fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", post(handlers::notification::create))
        .route("/notifications", get(handlers::notification::list))
        .route("/notifications/me", get(handlers::notification::my_notifications))
        .route("/notifications/{id}", get(handlers::notification::get))
        .route("/notifications/{id}", put(handlers::notification::update))
        .route(
            "/notifications/{id}",
            delete(handlers::notification::delete),
        )
        .route(
            "/notifications/{id}/read",
            post(handlers::notification::mark_read),
        )
        .route(
            "/notifications/cpf/{cpf}",
            get(handlers::notification::by_cpf),
        )
        .route(
            "/notifications/phone/{phone}",
            get(handlers::notification::by_phone),
        )
        .route(
            "/notifications/email/{email}",
            get(handlers::notification::by_email),
        )
        .route(
            "/notifications/group/{group_id}",
            get(handlers::notification::by_group),
        )
        .route(
            "/notifications/send/user",
            post(handlers::notification::send_to_user),
        )
        .route(
            "/notifications/send/group/{group_id}",
            post(handlers::notification::send_to_group),
        )
        .route(
            "/notifications/send/broadcast",
            post(handlers::notification::send_broadcast),
        )
        .route(
            "/notifications/send/batch",
            post(handlers::notification::send_batch),
        )
}

/// Scheduled notification listing and cancellation
fn scheduled_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/scheduled-notifications",
            get(handlers::scheduled::list_scheduled),
        )
        .route(
            "/scheduled-notifications/{id}/cancel",
            post(handlers::scheduled::cancel_scheduled),
        )
}

/// Push subscription registration
fn subscription_routes() -> Router<AppState> {
    Router::new()
        .route("/subscriptions", post(handlers::subscription::subscribe))
        .route(
            "/subscriptions",
            delete(handlers::subscription::unsubscribe),
        )
}

/// Broker inspection
fn queue_routes() -> Router<AppState> {
    Router::new()
        .route("/queue/stats", get(handlers::queue::stats))
        .route("/queue/purge", post(handlers::queue::purge))
}

/// Health check endpoints (no auth required)
fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/health/live", get(handlers::health::liveness))
        .route("/health/ready", get(handlers::health::readiness))
}

/// Build CORS layer from configuration
fn build_cors_layer(state: &AppState) -> CorsLayer {
    use http::Method;
    use tower_http::cors::Any;

    let cors_config = &state.config.server.cors;

    let mut cors = CorsLayer::new();

    if cors_config.allowed_origins.contains(&"*".to_string()) {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<http::HeaderValue> = cors_config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors = cors.allow_origin(origins);
    }

    let methods: Vec<Method> = cors_config
        .allowed_methods
        .iter()
        .filter_map(|m| m.parse().ok())
        .collect();
    cors = cors.allow_methods(methods);

    if cors_config.allowed_headers.contains(&"*".to_string()) {
        cors = cors.allow_headers(Any);
    }

    cors.max_age(std::time::Duration::from_secs(
        cors_config.max_age_seconds,
    ))
}
