//! Request extractors
//!
//! Axum's own rejections answer in plain text; these wrap them so every
//! failure goes through [`AppError`].

use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::{StatusCode, request::Parts},
};
use serde_json::{Map, Value};

use crate::utils::AppError;

/// Request body parsed as a JSON object
///
/// The content type is not checked; the bytes must parse. Empty bodies,
/// invalid JSON, non-object values and bodies over axum's size limit are
/// all `400`.
#[derive(Debug)]
pub struct JsonBody(pub Map<String, Value>);

impl<S: Send + Sync> FromRequest<S> for JsonBody {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|e| {
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                tracing::warn!(error = %e, "Request body over size limit");
            }
            AppError::bad_request(format!("unreadable body: {e}"))
        })?;

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(map)) => Ok(JsonBody(map)),
            Ok(other) => Err(AppError::bad_request(format!(
                "body must be a JSON object, got {}",
                json_kind(&other)
            ))),
            Err(e) => Err(AppError::bad_request(format!("body is not JSON: {e}"))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Integer drink id from the `{id}` path segment; anything else is `404`
#[derive(Debug, Clone, Copy)]
pub struct DrinkId(pub i64);

impl<S: Send + Sync> FromRequestParts<S> for DrinkId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::not_found("drink"))?;
        raw.parse()
            .map(DrinkId)
            .map_err(|_| AppError::not_found(format!("drink {raw}")))
    }
}
