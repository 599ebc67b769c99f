//! Order placement, supplier transitions, reads and public tracking.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use domain::{
    CreateOrder, Order, OrderDetails, OrderId, OrderQuery, OrderStatus, ProductId, TrackingView,
};
use record_store::RecordStore;
use serde::Deserialize;

use crate::error::ApiError;
use crate::extract::Caller;
use crate::state::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub product_id: ProductId,
    pub quantity: i64,
    #[serde(default)]
    pub shipping_address: String,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct TransitionRequest {
    pub status: String,
}

#[derive(Deserialize)]
pub struct TrackQuery {
    pub email: Option<String>,
}

// -- Handlers --

/// POST /orders — place an order (merchants).
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Caller(actor): Caller,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let Json(req) = payload?;
    let cmd = CreateOrder {
        product_id: req.product_id,
        quantity: req.quantity,
        shipping_address: req.shipping_address,
        notes: req.notes,
    };
    let order = state.orders.create_order(actor, cmd).await?;

    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /orders — the caller's own orders, optionally by status.
#[tracing::instrument(skip(state, query))]
pub async fn list<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Caller(actor): Caller,
    query: Result<Query<OrderQuery>, QueryRejection>,
) -> Result<Json<Vec<Order>>, ApiError> {
    let Query(query) = query?;
    Ok(Json(state.orders.list(actor, query).await?))
}

/// GET /orders/{id} — an order and its shipment (merchant or supplier on the order).
#[tracing::instrument(skip(state, id))]
pub async fn get<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Caller(actor): Caller,
    id: Result<Path<OrderId>, PathRejection>,
) -> Result<Json<OrderDetails>, ApiError> {
    let Path(id) = id?;
    Ok(Json(state.orders.get(actor, id).await?))
}

/// PATCH /orders/{id}/status — supplier moves the order along its lifecycle.
#[tracing::instrument(skip(state, id, payload))]
pub async fn transition<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Caller(actor): Caller,
    id: Result<Path<OrderId>, PathRejection>,
    payload: Result<Json<TransitionRequest>, JsonRejection>,
) -> Result<Json<Order>, ApiError> {
    let Path(id) = id?;
    let Json(req) = payload?;
    let status: OrderStatus = req.status.parse()?;
    Ok(Json(state.orders.transition_status(actor, id, status).await?))
}

/// GET /orders/{id}/track?email= — public tracking view.
#[tracing::instrument(skip(state, id, query))]
pub async fn track<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    id: Result<Path<OrderId>, PathRejection>,
    query: Result<Query<TrackQuery>, QueryRejection>,
) -> Result<Json<TrackingView>, ApiError> {
    let Path(id) = id?;
    let Query(query) = query?;
    let email = query.email.unwrap_or_default();
    Ok(Json(state.tracking.get_tracking(id, &email).await?))
}

/// GET /shipping/available-orders — ready orders no shipment has claimed.
#[tracing::instrument(skip(state))]
pub async fn available<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Caller(actor): Caller,
) -> Result<Json<Vec<Order>>, ApiError> {
    Ok(Json(state.orders.list_available(actor).await?))
}
