//! Shipment endpoints for shipping companies.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::NaiveDate;
use domain::{
    CreateShipment, Money, OrderId, Shipment, ShipmentId, ShipmentQuery, ShipmentStatus,
    UpdateShipmentStatus,
};
use record_store::RecordStore;
use serde::Deserialize;

use crate::error::ApiError;
use crate::extract::Caller;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateShipmentRequest {
    pub order_id: OrderId,
    pub estimated_delivery_date: NaiveDate,
    pub shipping_cost_cents: i64,
    pub pickup_address: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
    pub location: Option<String>,
    pub notes: Option<String>,
}

/// POST /shipments — claim a ready order.
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Caller(actor): Caller,
    payload: Result<Json<CreateShipmentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Shipment>), ApiError> {
    let Json(req) = payload?;
    let shipment = state
        .shipments
        .create_shipment(
            actor,
            CreateShipment {
                order_id: req.order_id,
                estimated_delivery_date: req.estimated_delivery_date,
                shipping_cost: Money::from_cents(req.shipping_cost_cents),
                pickup_address: req.pickup_address,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(shipment)))
}

/// GET /shipments — the caller's shipments, optionally by status.
#[tracing::instrument(skip(state, query))]
pub async fn list<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Caller(actor): Caller,
    query: Result<Query<ShipmentQuery>, QueryRejection>,
) -> Result<Json<Vec<Shipment>>, ApiError> {
    let Query(query) = query?;
    Ok(Json(state.shipments.list_for_company(actor, query).await?))
}

/// GET /shipments/{id} — one of the caller's shipments.
#[tracing::instrument(skip(state, id))]
pub async fn get<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Caller(actor): Caller,
    id: Result<Path<ShipmentId>, PathRejection>,
) -> Result<Json<Shipment>, ApiError> {
    let Path(id) = id?;
    Ok(Json(state.shipments.get(actor, id).await?))
}

/// PATCH /shipments/{id}/status — report progress; `delivered` completes the order.
#[tracing::instrument(skip(state, id, payload))]
pub async fn update_status<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Caller(actor): Caller,
    id: Result<Path<ShipmentId>, PathRejection>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<Shipment>, ApiError> {
    let Path(id) = id?;
    let Json(req) = payload?;
    let status: ShipmentStatus = req.status.parse()?;
    let cmd = UpdateShipmentStatus {
        status,
        location: req.location,
        notes: req.notes,
    };
    Ok(Json(state.shipments.update_status(actor, id, cmd).await?))
}
