//! Public tracking of an order and its shipment.
//!
//! Callers are not authenticated. They prove interest in an order by
//! presenting the email of the merchant account that placed it; a wrong email
//! is indistinguishable from an unknown order.

use chrono::{DateTime, NaiveDate, Utc};
use record_store::RecordStore;
use serde::Serialize;

use crate::account::Account;
use crate::error::DomainError;
use crate::order::{Order, OrderStatus};
use crate::repository::Repository;
use crate::shipment::{Shipment, ShipmentStatus, StatusHistoryEntry};
use crate::value_objects::OrderId;

/// What a tracking caller gets to see.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackingView {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub product_name: String,
    pub quantity: u32,
    pub tracking: Option<ShipmentTracking>,
}

/// The shipment part of a [`TrackingView`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShipmentTracking {
    pub tracking_number: String,
    pub status: ShipmentStatus,
    pub current_location: Option<String>,
    pub estimated_delivery_date: NaiveDate,
    pub status_history: Vec<StatusHistoryEntry>,
}

impl From<Shipment> for ShipmentTracking {
    fn from(shipment: Shipment) -> Self {
        Self {
            tracking_number: shipment.tracking_number,
            status: shipment.status,
            current_location: shipment.current_location,
            estimated_delivery_date: shipment.estimated_delivery_date,
            status_history: shipment.status_history,
        }
    }
}

/// Read-only tracking lookups.
pub struct TrackingGateway<S: RecordStore> {
    repo: Repository<S>,
}

impl<S: RecordStore> TrackingGateway<S> {
    /// Creates a new gateway over the given repository.
    pub fn new(repo: Repository<S>) -> Self {
        Self { repo }
    }

    /// Returns the tracking view of an order, if `email` belongs to the
    /// merchant who placed it.
    #[tracing::instrument(skip(self, email))]
    pub async fn get_tracking(
        &self,
        order_id: OrderId,
        email: &str,
    ) -> Result<TrackingView, DomainError> {
        if email.trim().is_empty() {
            return Err(DomainError::InvalidArgument(
                "email is required for tracking".to_string(),
            ));
        }

        let order: Order = self.repo.require(order_id).await?;
        let merchant: Option<Account> = self.repo.load(order.merchant_id).await?;
        if !merchant.is_some_and(|m| m.email_matches(email)) {
            tracing::debug!("tracking email did not match the order's merchant");
            return Err(DomainError::not_found("Order", order_id));
        }

        let tracking = match order.shipment_id {
            Some(shipment_id) => self
                .repo
                .load::<Shipment>(shipment_id)
                .await?
                .map(ShipmentTracking::from),
            None => None,
        };

        Ok(TrackingView {
            order_id: order.id,
            status: order.status,
            created_at: order.created_at,
            product_name: order.product_name,
            quantity: order.quantity,
            tracking,
        })
    }
}
