//! Order commands.

use serde::Deserialize;

use crate::value_objects::ProductId;

use super::OrderStatus;

/// Command to place an order for a product.
#[derive(Debug, Clone)]
pub struct CreateOrder {
    pub product_id: ProductId,
    /// Signed so that non-positive requests are rejected by validation rather
    /// than by decoding.
    pub quantity: i64,
    pub shipping_address: String,
    pub notes: Option<String>,
}

impl CreateOrder {
    /// Creates a new command with no notes.
    pub fn new(product_id: ProductId, quantity: i64, shipping_address: impl Into<String>) -> Self {
        Self {
            product_id,
            quantity,
            shipping_address: shipping_address.into(),
            notes: None,
        }
    }

    /// Sets the order notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Order listing filter.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_notes() {
        let cmd = CreateOrder::new(ProductId::new(), 2, "Riyadh").with_notes("ring twice");
        assert_eq!(cmd.quantity, 2);
        assert_eq!(cmd.notes.as_deref(), Some("ring twice"));
    }

    #[test]
    fn query_decodes_status() {
        let query: OrderQuery = serde_json::from_str(r#"{"status":"ready"}"#).unwrap();
        assert_eq!(query.status, Some(OrderStatus::Ready));
    }
}
