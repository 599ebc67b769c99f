//! Shipments: claiming ready orders and tracking them to delivery.

mod commands;
mod service;
mod state;

pub use commands::{CreateShipment, DEFAULT_PICKUP_ADDRESS, ShipmentQuery, UpdateShipmentStatus};
pub use service::ShipmentService;
pub use state::ShipmentStatus;

use chrono::{DateTime, NaiveDate, Utc};
use common::RecordId;
use record_store::{Collection, Version};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::Document;
use crate::error::DomainError;
use crate::order::Order;
use crate::value_objects::{AccountId, Money, OrderId, ShipmentId};

/// One entry of a shipment's status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub status: ShipmentStatus,
    pub timestamp: DateTime<Utc>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

/// A shipping company's delivery of one order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    pub id: ShipmentId,
    pub order_id: OrderId,
    pub shipping_company_id: AccountId,
    pub tracking_number: String,
    pub pickup_address: String,
    /// Copied from the order when the shipment is opened.
    pub delivery_address: String,
    pub estimated_delivery_date: NaiveDate,
    #[serde(rename = "shipping_cost_cents")]
    pub shipping_cost: Money,
    pub status: ShipmentStatus,
    pub current_location: Option<String>,
    /// Append-only, oldest first. The first entry is always `pending`.
    pub status_history: Vec<StatusHistoryEntry>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(skip)]
    version: Version,
}

/// Generates an opaque tracking number. Uniqueness is enforced on commit.
pub fn generate_tracking_number() -> String {
    let hex = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("TRK{}", &hex[..12])
}

impl Shipment {
    /// Opens a pending shipment for an order.
    pub fn open(
        order: &Order,
        shipping_company_id: AccountId,
        estimated_delivery_date: NaiveDate,
        shipping_cost: Money,
        pickup_address: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ShipmentId::new(),
            order_id: order.id,
            shipping_company_id,
            tracking_number: generate_tracking_number(),
            pickup_address,
            delivery_address: order.shipping_address.clone(),
            estimated_delivery_date,
            shipping_cost,
            status: ShipmentStatus::Pending,
            current_location: None,
            status_history: vec![StatusHistoryEntry {
                status: ShipmentStatus::Pending,
                timestamp: now,
                location: None,
                notes: Some("Shipment created".to_string()),
            }],
            delivered_at: None,
            created_at: now,
            updated_at: now,
            version: Version::initial(),
        }
    }

    /// Returns true if the given company carries this shipment.
    pub fn is_carried_by(&self, account: AccountId) -> bool {
        self.shipping_company_id == account
    }

    /// Moves the shipment to `status` and appends a history entry.
    ///
    /// History timestamps never go backwards, even if the clock does.
    pub fn advance(
        &mut self,
        status: ShipmentStatus,
        location: Option<String>,
        notes: Option<String>,
    ) -> Result<(), DomainError> {
        if !self.status.can_transition_to(status) {
            return Err(DomainError::InvalidTransition {
                entity: Self::ENTITY,
                from: self.status.to_string(),
                to: status.to_string(),
            });
        }

        let now = self
            .status_history
            .last()
            .map_or_else(Utc::now, |last| last.timestamp.max(Utc::now()));

        self.status_history.push(StatusHistoryEntry {
            status,
            timestamp: now,
            location: location.clone(),
            notes,
        });
        self.status = status;
        if location.is_some() {
            self.current_location = location;
        }
        if status == ShipmentStatus::Delivered {
            self.delivered_at = Some(now);
        }
        self.updated_at = now;
        Ok(())
    }
}

impl Document for Shipment {
    const COLLECTION: Collection = Collection::Shipments;
    const ENTITY: &'static str = "Shipment";

    fn record_id(&self) -> RecordId {
        self.id.record_id()
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn unique_fields() -> &'static [&'static str] {
        &["tracking_number", "order_id"]
    }
}
