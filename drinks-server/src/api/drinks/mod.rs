//! Drinks API

mod handler;

use axum::{
    Router, middleware,
    routing::{delete, get, patch, post},
};

use crate::auth::{permissions, require_permission};
use crate::core::ServerState;

/// | Route | Permission |
/// |-------|------------|
/// | GET /drinks | public |
/// | GET /drinks-detail | read:detail |
/// | POST /drinks | create:item |
/// | PATCH /drinks/{id} | update:item |
/// | DELETE /drinks/{id} | delete:item |
pub fn router(state: &ServerState) -> Router<ServerState> {
    let public_routes = Router::new().route("/drinks", get(handler::list));

    let detail_routes = Router::new()
        .route("/drinks-detail", get(handler::detail))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_permission(permissions::READ_DETAIL),
        ));

    let create_routes = Router::new()
        .route("/drinks", post(handler::create))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_permission(permissions::CREATE_ITEM),
        ));

    let update_routes = Router::new()
        .route("/drinks/{id}", patch(handler::update))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_permission(permissions::UPDATE_ITEM),
        ));

    let delete_routes = Router::new()
        .route("/drinks/{id}", delete(handler::delete))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_permission(permissions::DELETE_ITEM),
        ));

    public_routes
        .merge(detail_routes)
        .merge(create_routes)
        .merge(update_routes)
        .merge(delete_routes)
}
