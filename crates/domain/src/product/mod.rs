//! Product catalog and the inventory ledger it carries.
//!
//! `quantity` and `available` together gate order creation. The order path
//! only ever decrements `quantity`, through [`Product::reserve`], and the
//! decrement is committed in the same batch as the order it pays for.

mod commands;
mod service;

pub use commands::{CreateProduct, ProductQuery, UpdateProduct};
pub use service::ProductService;

use chrono::{DateTime, Utc};
use common::RecordId;
use record_store::{Collection, Version};
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::DomainError;
use crate::value_objects::{AccountId, Money, ProductId};

/// Category assigned when a supplier does not pick one.
pub const DEFAULT_CATEGORY: &str = "general";

/// A product listed by a supplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub supplier_id: AccountId,
    pub name: String,
    pub description: String,
    pub category: String,
    /// Unit price in minor units.
    #[serde(rename = "price_cents")]
    pub price: Money,
    /// Units in stock.
    pub quantity: u32,
    /// Sale gate, independent of stock.
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(skip)]
    version: Version,
}

impl Product {
    /// Returns true if the given account owns this product.
    pub fn is_owned_by(&self, account: AccountId) -> bool {
        self.supplier_id == account
    }

    /// Takes `quantity` units out of stock and returns their total price.
    ///
    /// Stock is left untouched on error.
    pub fn reserve(&mut self, quantity: u32) -> Result<Money, DomainError> {
        let available = if self.available { self.quantity } else { 0 };
        if quantity > available {
            return Err(DomainError::InsufficientStock {
                product_id: self.id,
                requested: quantity,
                available,
            });
        }

        let total = self.price.checked_multiply(quantity).ok_or_else(|| {
            DomainError::InvalidArgument(format!(
                "order total overflows for {quantity} units of {}",
                self.price
            ))
        })?;

        self.quantity -= quantity;
        self.updated_at = Utc::now();
        Ok(total)
    }

    /// Returns true if `needle` (already lower-cased) appears in the name or
    /// description.
    fn mentions(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
    }
}

impl Document for Product {
    const COLLECTION: Collection = Collection::Products;
    const ENTITY: &'static str = "Product";

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
