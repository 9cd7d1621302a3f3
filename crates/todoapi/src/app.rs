use std::time::Duration;

use axum::{
    http::{header, HeaderName, Method, StatusCode},
    routing::get,
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use todoapi_core::timing::{SERVER_TIMING_HEADER, TIMING_HEADER, TIMING_JSON_HEADER};

use crate::{
    handlers::{
        diagnostics::select_one,
        health::{healthcheck, livez},
        todos::{create_todo, delete_todo, get_todo, list_todos, update_todo},
    },
    state::AppState,
};

/// Create the application router with all routes and middleware.
///
/// Requests running longer than `request_timeout` are answered with 408.
pub fn create_app(state: AppState, request_timeout: Duration) -> Router {
    // CORS configuration for API endpoints. Browsers only expose the timing
    // headers when they are listed here.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .expose_headers([
            HeaderName::from_static(TIMING_JSON_HEADER),
            HeaderName::from_static(TIMING_HEADER),
            HeaderName::from_static(SERVER_TIMING_HEADER),
        ]);

    let api_routes = Router::new()
        .route("/todo", get(list_todos).post(create_todo))
        .route(
            "/todo/{id}",
            get(get_todo).put(update_todo).delete(delete_todo),
        )
        .route("/test/select-one", get(select_one))
        .route("/healthcheck", get(healthcheck))
        .layer(cors);

    Router::new()
        .route("/livez", get(livez))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .with_state(state)
}
