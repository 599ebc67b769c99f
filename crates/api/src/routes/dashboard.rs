//! Dashboard endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use domain::Dashboard;
use record_store::RecordStore;

use crate::error::ApiError;
use crate::extract::Caller;
use crate::state::AppState;

/// GET /dashboard — the caller's records and statistics for its role.
#[tracing::instrument(skip(state))]
pub async fn get<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Caller(actor): Caller,
) -> Result<Json<Dashboard>, ApiError> {
    Ok(Json(state.dashboards.for_actor(actor).await?))
}
