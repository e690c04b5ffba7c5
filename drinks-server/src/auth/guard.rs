//! Permission check against a verified claim set

use crate::auth::{AuthError, ClaimSet};

/// Require `required` to be one of the claim set's permissions
///
/// A token without a `permissions` claim is rejected as `invalid_claims`
/// rather than `unauthorized`.
pub fn authorize(required: &str, claims: &ClaimSet) -> Result<(), AuthError> {
    let permissions = claims
        .permissions
        .as_ref()
        .ok_or(AuthError::InvalidClaims("Permissions not included in JWT."))?;

    if permissions.iter().any(|p| p == required) {
        Ok(())
    } else {
        Err(AuthError::Unauthorized)
    }
}
