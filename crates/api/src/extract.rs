//! Request extractors.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use domain::{AccountId, Actor, Role};

use crate::error::ApiError;

/// Header carrying the authenticated account's UUID.
pub const ACCOUNT_ID_HEADER: &str = "x-account-id";
/// Header carrying the role the account acts in.
pub const ACCOUNT_ROLE_HEADER: &str = "x-account-role";

/// The authenticated caller, as asserted by the upstream gateway.
///
/// Rejects with 401 if either header is missing or malformed.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub Actor);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(caller) = parts.extensions.get::<Caller>() {
            return Ok(*caller);
        }

        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
        };

        let (Some(id), Some(role)) = (header(ACCOUNT_ID_HEADER), header(ACCOUNT_ROLE_HEADER))
        else {
            tracing::debug!(uri = %parts.uri, "request without caller identity");
            return Err(ApiError::Unauthorized(
                "caller identity headers are required".to_string(),
            ));
        };

        let id: AccountId = id
            .parse()
            .map_err(|e| ApiError::Unauthorized(format!("malformed {ACCOUNT_ID_HEADER}: {e}")))?;
        let role: Role = role
            .parse()
            .map_err(|e| ApiError::Unauthorized(format!("malformed {ACCOUNT_ROLE_HEADER}: {e}")))?;

        let caller = Caller(Actor::new(id, role));
        parts.extensions.insert(caller);
        Ok(caller)
    }
}
