//! Domain layer for the fulfillment platform.
//!
//! This crate holds the rules of the order-to-shipment pipeline:
//! - Accounts and the roles they act in
//! - The product catalog and its inventory ledger
//! - The order and shipment state machines, including the delivery cascade
//! - The public tracking view and per-role dashboards
//!
//! Services are generic over [`record_store::RecordStore`] and write every
//! multi-record effect as one atomic batch.

pub mod account;
pub mod actor;
pub mod dashboard;
pub mod document;
pub mod error;
pub mod order;
pub mod product;
pub mod repository;
pub mod shipment;
pub mod tracking;
pub mod value_objects;

pub use account::{Account, AccountService, RegisterAccount, Role};
pub use actor::Actor;
pub use dashboard::{
    Dashboard, DashboardService, MerchantStatistics, ShippingStatistics, SupplierStatistics,
};
pub use document::Document;
pub use error::{DomainError, ErrorKind};
pub use order::{CreateOrder, Order, OrderDetails, OrderQuery, OrderService, OrderStatus};
pub use product::{CreateProduct, Product, ProductQuery, ProductService, UpdateProduct};
pub use repository::{DEFAULT_COMMIT_ATTEMPTS, Repository};
pub use shipment::{
    CreateShipment, Shipment, ShipmentQuery, ShipmentService, ShipmentStatus, StatusHistoryEntry,
    UpdateShipmentStatus,
};
pub use tracking::{ShipmentTracking, TrackingGateway, TrackingView};
pub use value_objects::{AccountId, Money, OrderId, ProductId, ShipmentId};
