//! Application router configuration.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware,
    response::Response,
    routing::{get, post, put},
};

use crate::{
    AppState, change_password::put_change_password, endpoints, json::render_error,
    list_users::get_users, log_in::post_log_in, logging::logging_middleware,
};

/// The largest request body the server will read, 2 MiB.
pub const MAX_REQUEST_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::LOG_IN, post(post_log_in))
        .route(endpoints::USERS, get(get_users))
        .route(endpoints::CHANGE_PASSWORD, put(put_change_password))
        .fallback(get_404_not_found)
        .layer(middleware::from_fn(logging_middleware))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .with_state(state)
}

async fn get_404_not_found() -> Response {
    render_error(StatusCode::NOT_FOUND, "Not found")
}
