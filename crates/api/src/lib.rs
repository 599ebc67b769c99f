//! HTTP API server with observability for the fulfillment platform.
//!
//! Provides REST endpoints for the catalog, orders, shipments and public
//! tracking, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post};
use domain::Repository;
use metrics_exporter_prometheus::PrometheusHandle;
use record_store::RecordStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
pub use state::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: RecordStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/accounts", post(routes::accounts::register::<S>))
        .route(
            "/products",
            get(routes::products::list::<S>).post(routes::products::create::<S>),
        )
        .route(
            "/products/{id}",
            get(routes::products::get::<S>).patch(routes::products::update::<S>),
        )
        .route(
            "/orders",
            get(routes::orders::list::<S>).post(routes::orders::create::<S>),
        )
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}/status", patch(routes::orders::transition::<S>))
        .route("/orders/{id}/track", get(routes::orders::track::<S>))
        .route(
            "/shipping/available-orders",
            get(routes::orders::available::<S>),
        )
        .route(
            "/shipments",
            get(routes::shipments::list::<S>).post(routes::shipments::create::<S>),
        )
        .route("/shipments/{id}", get(routes::shipments::get::<S>))
        .route(
            "/shipments/{id}/status",
            patch(routes::shipments::update_status::<S>),
        )
        .route("/dashboard", get(routes::dashboard::get::<S>))
        .with_state(state)
        .merge(metrics_router)
        .fallback(routes::not_found)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over the given store.
pub fn create_default_state<S: RecordStore + Clone + 'static>(
    store: S,
    config: &Config,
) -> Arc<AppState<S>> {
    let repo = Repository::new(store).with_max_attempts(config.commit_attempts);
    Arc::new(AppState::new(repo))
}
