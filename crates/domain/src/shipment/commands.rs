//! Shipment commands.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::value_objects::{Money, OrderId};

use super::ShipmentStatus;

/// Pickup address used when the shipping company does not supply one.
pub const DEFAULT_PICKUP_ADDRESS: &str = "Supplier Address";

/// Command to claim a ready order and open its shipment.
#[derive(Debug, Clone)]
pub struct CreateShipment {
    pub order_id: OrderId,
    pub estimated_delivery_date: NaiveDate,
    pub shipping_cost: Money,
    pub pickup_address: Option<String>,
}

/// Command to report a shipment status change.
#[derive(Debug, Clone)]
pub struct UpdateShipmentStatus {
    pub status: ShipmentStatus,
    pub location: Option<String>,
    pub notes: Option<String>,
}

impl UpdateShipmentStatus {
    /// Creates a status update with no location or notes.
    pub fn new(status: ShipmentStatus) -> Self {
        Self {
            status,
            location: None,
            notes: None,
        }
    }

    /// Sets where the shipment is.
    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Sets free-form notes for the history entry.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Shipment listing filter.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ShipmentQuery {
    pub status: Option<ShipmentStatus>,
}
