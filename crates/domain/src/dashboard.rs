//! Per-role dashboards: the account's own records plus summary statistics.

use record_store::{Filter, RecordStore};
use serde::Serialize;

use crate::account::Role;
use crate::actor::Actor;
use crate::error::DomainError;
use crate::order::{Order, OrderStatus, ready_unclaimed};
use crate::product::Product;
use crate::repository::Repository;
use crate::shipment::{Shipment, ShipmentStatus};

/// What an account sees when it opens its dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Dashboard {
    Supplier {
        products: Vec<Product>,
        orders: Vec<Order>,
        statistics: SupplierStatistics,
    },
    Merchant {
        orders: Vec<Order>,
        /// Catalog entries that can currently be ordered.
        available_products: Vec<Product>,
        statistics: MerchantStatistics,
    },
    ShippingCompany {
        shipments: Vec<Shipment>,
        /// Ready orders no shipment has claimed.
        available_orders: Vec<Order>,
        statistics: ShippingStatistics,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SupplierStatistics {
    pub total_products: usize,
    pub total_orders: usize,
    pub pending_orders: usize,
    pub completed_orders: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MerchantStatistics {
    pub total_orders: usize,
    pub pending_orders: usize,
    pub processing_orders: usize,
    pub completed_orders: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShippingStatistics {
    pub total_shipments: usize,
    pub pending_shipments: usize,
    pub in_transit_shipments: usize,
    pub delivered_shipments: usize,
}

/// Computes dashboards from the stored records.
pub struct DashboardService<S: RecordStore> {
    repo: Repository<S>,
}

impl<S: RecordStore> DashboardService<S> {
    /// Creates a new dashboard service over the given repository.
    pub fn new(repo: Repository<S>) -> Self {
        Self { repo }
    }

    /// Returns the dashboard for the actor's role.
    pub async fn for_actor(&self, actor: Actor) -> Result<Dashboard, DomainError> {
        let owner = actor.id.to_string();
        match actor.role {
            Role::Supplier => {
                let products: Vec<Product> = self
                    .repo
                    .find(Filter::new().eq("supplier_id", owner.as_str()))
                    .await?;
                let orders: Vec<Order> = self
                    .repo
                    .find(Filter::new().eq("supplier_id", owner.as_str()))
                    .await?;
                let statistics = SupplierStatistics {
                    total_products: products.len(),
                    total_orders: orders.len(),
                    pending_orders: count_orders(&orders, OrderStatus::Pending),
                    completed_orders: count_orders(&orders, OrderStatus::Completed),
                };
                Ok(Dashboard::Supplier {
                    products,
                    orders,
                    statistics,
                })
            }
            Role::Merchant => {
                let orders: Vec<Order> = self
                    .repo
                    .find(Filter::new().eq("merchant_id", owner.as_str()))
                    .await?;
                let available_products: Vec<Product> = self
                    .repo
                    .find::<Product>(Filter::new().eq("available", true))
                    .await?
                    .into_iter()
                    .filter(|p| p.quantity > 0)
                    .collect();
                let statistics = MerchantStatistics {
                    total_orders: orders.len(),
                    pending_orders: count_orders(&orders, OrderStatus::Pending),
                    processing_orders: count_orders(&orders, OrderStatus::Processing),
                    completed_orders: count_orders(&orders, OrderStatus::Completed),
                };
                Ok(Dashboard::Merchant {
                    orders,
                    available_products,
                    statistics,
                })
            }
            Role::ShippingCompany => {
                let shipments: Vec<Shipment> = self
                    .repo
                    .find(Filter::new().eq("shipping_company_id", owner.as_str()))
                    .await?;
                let available_orders: Vec<Order> = self.repo.find(ready_unclaimed()).await?;
                let count = |status: ShipmentStatus| {
                    shipments.iter().filter(|s| s.status == status).count()
                };
                let statistics = ShippingStatistics {
                    total_shipments: shipments.len(),
                    pending_shipments: count(ShipmentStatus::Pending),
                    in_transit_shipments: count(ShipmentStatus::InTransit),
                    delivered_shipments: count(ShipmentStatus::Delivered),
                };
                Ok(Dashboard::ShippingCompany {
                    shipments,
                    available_orders,
                    statistics,
                })
            }
        }
    }
}

fn count_orders(orders: &[Order], status: OrderStatus) -> usize {
    orders.iter().filter(|o| o.status == status).count()
}
