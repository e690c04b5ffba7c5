//! HTTP routes
//!
//! - [`health`] - liveness check
//! - [`drinks`] - menu routes
//! - [`extract`] - body / path extractors that fail with [`AppError`]

pub mod drinks;
pub mod extract;
pub mod health;

use std::any::Any;

use axum::{Router, http::Uri, response::IntoResponse, response::Response, routing::get};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

use crate::core::ServerState;
use crate::utils::AppError;

/// Build the application router
pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .merge(drinks::router(&state))
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn not_found(uri: Uri) -> AppError {
    AppError::not_found(format!("route {}", uri.path()))
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    AppError::internal(format!("handler panicked: {detail}")).into_response()
}
