//! Orders and their lifecycle.

mod commands;
mod service;
mod state;

pub use commands::{CreateOrder, OrderQuery};
pub use service::{OrderDetails, OrderService};
pub(crate) use service::ready_unclaimed;
pub use state::OrderStatus;

use chrono::{DateTime, Utc};
use common::RecordId;
use record_store::{Collection, Version};
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::DomainError;
use crate::value_objects::{AccountId, Money, OrderId, ProductId, ShipmentId};

/// A merchant's order for a quantity of one supplier product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub product_id: ProductId,
    /// Product name at the time the order was placed.
    pub product_name: String,
    pub quantity: u32,
    /// Unit price at creation times quantity. Never recomputed.
    #[serde(rename = "total_amount_cents")]
    pub total_amount: Money,
    pub shipping_address: String,
    pub notes: Option<String>,
    pub supplier_id: AccountId,
    pub merchant_id: AccountId,
    pub status: OrderStatus,
    /// Set exactly when the order is shipped or completed.
    pub shipment_id: Option<ShipmentId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(skip)]
    version: Version,
}

impl Order {
    /// Returns true if the account is the order's merchant or supplier.
    pub fn is_party(&self, account: AccountId) -> bool {
        self.merchant_id == account || self.supplier_id == account
    }

    /// Moves the order along an edge of its state machine.
    pub fn transition(&mut self, to: OrderStatus) -> Result<(), DomainError> {
        if !self.status.can_transition_to(to) {
            return Err(DomainError::InvalidTransition {
                entity: Self::ENTITY,
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Links the order to its shipment and marks it shipped.
    pub fn mark_shipped(&mut self, shipment_id: ShipmentId) -> Result<(), DomainError> {
        if self.status != OrderStatus::Ready || self.shipment_id.is_some() {
            return Err(DomainError::InvalidState(
                "order is not ready for shipping".to_string(),
            ));
        }
        self.transition(OrderStatus::Shipped)?;
        self.shipment_id = Some(shipment_id);
        Ok(())
    }

    /// Completes a shipped order once its shipment is delivered.
    pub fn complete(&mut self) -> Result<(), DomainError> {
        if self.status != OrderStatus::Shipped {
            return Err(DomainError::InvalidState(format!(
                "order {} is {} and cannot be completed",
                self.id, self.status
            )));
        }
        self.transition(OrderStatus::Completed)
    }
}

impl Document for Order {
    const COLLECTION: Collection = Collection::Orders;
    const ENTITY: &'static str = "Order";

    fn record_id(&self) -> RecordId {
        self.id.record_id()
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }
}
