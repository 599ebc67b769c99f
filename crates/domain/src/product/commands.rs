//! Product catalog commands.

use serde::Deserialize;

use crate::value_objects::{AccountId, Money};

/// Command to list a new product.
#[derive(Debug, Clone)]
pub struct CreateProduct {
    pub name: String,
    pub description: String,
    /// Falls back to `general` when absent or blank.
    pub category: Option<String>,
    pub price: Money,
    pub quantity: u32,
}

/// Partial update of a product's catalog fields. `None` leaves a field as is.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "price_cents")]
    pub price: Option<Money>,
    pub quantity: Option<u32>,
    pub available: Option<bool>,
}

impl UpdateProduct {
    /// Returns true if the update would change nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.price.is_none()
            && self.quantity.is_none()
            && self.available.is_none()
    }
}

/// Catalog listing filters. All set filters must match.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductQuery {
    pub supplier_id: Option<AccountId>,
    pub category: Option<String>,
    /// Case-insensitive substring of name or description.
    pub search: Option<String>,
}
