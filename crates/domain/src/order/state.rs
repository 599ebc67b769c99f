//! Order state machine.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// The status of an order in its lifecycle.
///
/// State transitions:
/// ```text
/// Pending ──┬──► Accepted ──► Processing ──► Ready ──► Shipped ──► Completed
///           │
///           └──► Rejected
/// ```
///
/// The supplier drives the order up to `Ready`. `Shipped` is set when a
/// shipment claims the order and `Completed` only by its delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Placed by the merchant, stock already taken.
    #[default]
    Pending,

    /// Supplier agreed to fulfil the order.
    Accepted,

    /// Supplier declined the order (terminal state).
    Rejected,

    /// Supplier is preparing the goods.
    Processing,

    /// Goods are ready for pickup.
    Ready,

    /// A shipping company has claimed the order.
    Shipped,

    /// The shipment was delivered (terminal state).
    Completed,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Pending,
        OrderStatus::Accepted,
        OrderStatus::Rejected,
        OrderStatus::Processing,
        OrderStatus::Ready,
        OrderStatus::Shipped,
        OrderStatus::Completed,
    ];

    /// Returns true if `next` is an edge of the state machine from this status.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Accepted)
                | (Pending, Rejected)
                | (Accepted, Processing)
                | (Processing, Ready)
                | (Ready, Shipped)
                | (Shipped, Completed)
        )
    }

    /// Returns true if a supplier may request this status directly.
    pub fn is_supplier_settable(&self) -> bool {
        matches!(
            self,
            OrderStatus::Accepted
                | OrderStatus::Rejected
                | OrderStatus::Processing
                | OrderStatus::Ready
        )
    }

    /// Returns true if this is a terminal status (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Rejected | OrderStatus::Completed)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Accepted => "accepted",
            OrderStatus::Rejected => "rejected",
            OrderStatus::Processing => "processing",
            OrderStatus::Ready => "ready",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DomainError::InvalidArgument(format!("unknown order status '{s}'")))
    }
}
