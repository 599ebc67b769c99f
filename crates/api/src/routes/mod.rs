//! HTTP route handlers.

pub mod accounts;
pub mod dashboard;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod products;
pub mod shipments;

use axum::http::{Method, Uri};

use crate::error::ApiError;

/// Fallback for requests no route matches.
pub async fn not_found(method: Method, uri: Uri) -> ApiError {
    ApiError::NotFound(format!("no route for {method} {}", uri.path()))
}
