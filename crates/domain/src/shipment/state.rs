//! Shipment state machine.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// The status of a shipment.
///
/// Shipments only move forward:
/// ```text
/// Pending ──► PickedUp ──► InTransit ──► OutForDelivery ──► Delivered
///    │           │            │   ▲            │
///    │           │            └───┘            │
///    └───────────┴────────────┴────────────────┴──► Failed
/// ```
/// A later status may be reached directly (a courier can report a delivery
/// without every intermediate scan). `InTransit` may repeat to post a new
/// location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    #[default]
    Pending,
    PickedUp,
    InTransit,
    OutForDelivery,
    /// Terminal. Completes the order.
    Delivered,
    /// Terminal.
    Failed,
}

impl ShipmentStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [ShipmentStatus; 6] = [
        ShipmentStatus::Pending,
        ShipmentStatus::PickedUp,
        ShipmentStatus::InTransit,
        ShipmentStatus::OutForDelivery,
        ShipmentStatus::Delivered,
        ShipmentStatus::Failed,
    ];

    fn rank(&self) -> u8 {
        match self {
            ShipmentStatus::Pending => 0,
            ShipmentStatus::PickedUp => 1,
            ShipmentStatus::InTransit => 2,
            ShipmentStatus::OutForDelivery => 3,
            ShipmentStatus::Delivered | ShipmentStatus::Failed => 4,
        }
    }

    /// Returns true if a shipment in this status may move to `next`.
    pub fn can_transition_to(&self, next: ShipmentStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            ShipmentStatus::Pending => false,
            ShipmentStatus::InTransit if *self == ShipmentStatus::InTransit => true,
            _ => next.rank() > self.rank(),
        }
    }

    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ShipmentStatus::Delivered | ShipmentStatus::Failed)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStatus::Pending => "pending",
            ShipmentStatus::PickedUp => "picked_up",
            ShipmentStatus::InTransit => "in_transit",
            ShipmentStatus::OutForDelivery => "out_for_delivery",
            ShipmentStatus::Delivered => "delivered",
            ShipmentStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ShipmentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        ShipmentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                DomainError::InvalidArgument(format!("unknown shipment status '{s}'"))
            })
    }
}
