//! Product catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use domain::{CreateProduct, Money, Product, ProductId, ProductQuery, UpdateProduct};
use record_store::RecordStore;
use serde::Deserialize;

use crate::error::ApiError;
use crate::extract::Caller;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: Option<String>,
    pub price_cents: i64,
    pub quantity: u32,
}

/// POST /products — list a new product (suppliers).
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Caller(actor): Caller,
    payload: Result<Json<CreateProductRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let Json(req) = payload?;
    let product = state
        .products
        .create_product(
            actor,
            CreateProduct {
                name: req.name,
                description: req.description,
                category: req.category,
                price: Money::from_cents(req.price_cents),
                quantity: req.quantity,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(product)))
}

/// GET /products — public catalog with optional filters.
#[tracing::instrument(skip(state, query))]
pub async fn list<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    query: Result<Query<ProductQuery>, QueryRejection>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let Query(query) = query?;
    Ok(Json(state.products.list(query).await?))
}

/// GET /products/{id} — a single product.
#[tracing::instrument(skip(state, id))]
pub async fn get<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    id: Result<Path<ProductId>, PathRejection>,
) -> Result<Json<Product>, ApiError> {
    let Path(id) = id?;
    Ok(Json(state.products.get(id).await?))
}

/// PATCH /products/{id} — edit catalog fields (owning supplier).
#[tracing::instrument(skip(state, id, payload))]
pub async fn update<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Caller(actor): Caller,
    id: Result<Path<ProductId>, PathRejection>,
    payload: Result<Json<UpdateProduct>, JsonRejection>,
) -> Result<Json<Product>, ApiError> {
    let Path(id) = id?;
    let Json(update) = payload?;
    Ok(Json(
        state.products.update_product(actor, id, update).await?,
    ))
}
