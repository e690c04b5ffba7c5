//! API Response types
//!
//! Every response body carries `success`. Successful drink responses hold
//! the affected drinks under `items`:
//! ```json
//! { "success": true, "items": [ { "id": 1, "title": "Water", "recipe": [...] } ] }
//! ```
//! Failures use [`ErrorBody`]:
//! ```json
//! { "success": false, "error": 404, "message": "not found: drink 9", "code": "not_found" }
//! ```

use serde::{Deserialize, Serialize};

/// Successful list/detail/create/update response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrinksResponse<T> {
    pub success: bool,
    pub items: Vec<T>,
}

impl<T> DrinksResponse<T> {
    pub fn ok(items: Vec<T>) -> Self {
        Self {
            success: true,
            items,
        }
    }
}

/// Successful delete response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedResponse {
    pub success: bool,
    pub deleted_id: i64,
}

impl DeletedResponse {
    pub fn ok(deleted_id: i64) -> Self {
        Self {
            success: true,
            deleted_id,
        }
    }
}

/// Uniform failure envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    /// HTTP status code
    pub error: u16,
    /// Human-readable message
    pub message: String,
    /// Machine-readable reason (`bad_request`, `unauthorized`, ...)
    pub code: String,
}

impl ErrorBody {
    pub fn new(status: u16, message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            success: false,
            error: status,
            message: message.into(),
            code: code.into(),
        }
    }
}
