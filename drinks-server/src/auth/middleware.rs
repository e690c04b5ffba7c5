//! Authorization middleware
//!
//! Axum middleware gating a route on a single permission.

use std::future::Future;
use std::pin::Pin;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::AppError;
use crate::auth::{AuthError, authorize, permissions};
use crate::core::ServerState;
use crate::security_log;

/// Permission check middleware - verify the bearer token, then require `permission`
///
/// Runs before any extractor of the wrapped handler, so a rejected request
/// never has its body read. On success the verified [`ClaimSet`] is inserted
/// into the request extensions for the handler.
///
/// # Usage
///
/// ```ignore
/// use axum::middleware;
/// Router::new()
///     .route("/drinks-detail", get(handler::detail))
///     .route_layer(middleware::from_fn_with_state(
///         state.clone(),
///         require_permission(permissions::READ_DETAIL),
///     ));
/// ```
///
/// # Errors
///
/// | Failure | HTTP status |
/// |---------|-------------|
/// | header missing / malformed, bad token, bad claims | 401 |
/// | permission not granted | 403 |
///
/// [`ClaimSet`]: crate::auth::ClaimSet
pub fn require_permission(
    permission: &'static str,
) -> impl Fn(
    State<ServerState>,
    Request,
    Next,
) -> Pin<Box<dyn Future<Output = Result<Response, AppError>> + Send>>
+ Clone {
    debug_assert!(permissions::is_valid_permission(permission));

    move |State(state): State<ServerState>, req: Request, next: Next| {
        Box::pin(check_permission(state, permission, req, next))
    }
}

async fn check_permission(
    state: ServerState,
    permission: &'static str,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = match req.headers().get(http::header::AUTHORIZATION) {
        Some(value) => Some(
            value
                .to_str()
                .map_err(|_| {
                    AuthError::MalformedHeader("Authorization header must start with \"Bearer\".")
                })?
                .to_owned(),
        ),
        None => None,
    };

    let claims = match state.verifier.verify(header.as_deref()).await {
        Ok(claims) => claims,
        Err(e) => {
            security_log!(
                "WARN",
                "auth_failed",
                reason = e.code(),
                path = req.uri().path()
            );
            return Err(e.into());
        }
    };

    if let Err(e) = authorize(permission, &claims) {
        security_log!(
            "WARN",
            "permission_denied",
            reason = e.code(),
            subject = claims.subject(),
            required_permission = permission
        );
        return Err(e.into());
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
