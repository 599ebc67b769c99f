//! Order service: placement, supplier transitions and scoped reads.

use chrono::Utc;
use record_store::{Filter, RecordStore, WriteBatch};
use serde::Serialize;

use crate::account::Role;
use crate::actor::Actor;
use crate::document::Document;
use crate::error::DomainError;
use crate::product::Product;
use crate::repository::Repository;
use crate::shipment::Shipment;
use crate::value_objects::OrderId;

use super::{CreateOrder, Order, OrderQuery, OrderStatus};

/// An order together with the shipment that carries it, if any.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    pub shipment: Option<Shipment>,
}

/// Service for managing orders.
pub struct OrderService<S: RecordStore> {
    repo: Repository<S>,
}

impl<S: RecordStore> OrderService<S> {
    /// Creates a new order service over the given repository.
    pub fn new(repo: Repository<S>) -> Self {
        Self { repo }
    }

    /// Places an order, taking its quantity out of the product's stock.
    ///
    /// The stock decrement and the order insert are committed together, the
    /// product write guarded by the version it was read at. Losing that race
    /// to other orders is retried until stock either covers the order or runs
    /// out.
    #[tracing::instrument(skip(self, cmd), fields(merchant_id = %actor.id, product_id = %cmd.product_id))]
    pub async fn create_order(&self, actor: Actor, cmd: CreateOrder) -> Result<Order, DomainError> {
        actor.require(Role::Merchant)?;

        if cmd.quantity <= 0 {
            return Err(DomainError::InvalidArgument(
                "quantity must be greater than zero".to_string(),
            ));
        }
        let quantity = u32::try_from(cmd.quantity).map_err(|_| {
            DomainError::InvalidArgument(format!("quantity {} is too large", cmd.quantity))
        })?;
        let shipping_address = cmd.shipping_address.trim().to_string();
        if shipping_address.is_empty() {
            return Err(DomainError::InvalidArgument(
                "shipping address is required".to_string(),
            ));
        }
        let product_id = cmd.product_id;
        let notes = cmd.notes.filter(|n| !n.trim().is_empty());

        // A lost race on the product means another order took stock from it,
        // so after at most `stock` losses the answer is either a commit or
        // InsufficientStock.
        let stock = self.repo.require::<Product>(product_id).await?.quantity;
        let max_attempts = self.repo.max_attempts().saturating_add(stock);

        let result = self
            .repo
            .with_retry_limit("create_order", max_attempts, || {
                let shipping_address = shipping_address.clone();
                let notes = notes.clone();
                async move {
                    let mut product: Product = self.repo.require(product_id).await?;
                    let total_amount = product.reserve(quantity)?;

                    let now = Utc::now();
                    let mut order = Order {
                        id: OrderId::new(),
                        product_id: product.id,
                        product_name: product.name.clone(),
                        quantity,
                        total_amount,
                        shipping_address,
                        notes,
                        supplier_id: product.supplier_id,
                        merchant_id: actor.id,
                        status: OrderStatus::Pending,
                        shipment_id: None,
                        created_at: now,
                        updated_at: now,
                        version: Default::default(),
                    };

                    let batch = WriteBatch::new()
                        .push(product.update_write()?)
                        .push(order.insert_write()?);
                    let records = self.repo.commit(batch).await?;
                    order.set_version(records[1].version);
                    Ok((order, product.quantity))
                }
            })
            .await;

        match result {
            Ok((order, remaining)) => {
                metrics::counter!("orders_created_total").increment(1);
                metrics::histogram!("order_total_cents").record(order.total_amount.cents() as f64);
                tracing::info!(order_id = %order.id, quantity, remaining, "order placed");
                Ok(order)
            }
            Err(e @ DomainError::InsufficientStock { .. }) => {
                metrics::counter!("order_stock_rejections_total").increment(1);
                tracing::info!(error = %e, "order rejected for stock");
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Moves an order to a supplier-settable status.
    #[tracing::instrument(skip(self), fields(supplier_id = %actor.id))]
    pub async fn transition_status(
        &self,
        actor: Actor,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, DomainError> {
        actor.require(Role::Supplier)?;
        if !status.is_supplier_settable() {
            return Err(DomainError::InvalidArgument(format!(
                "suppliers cannot set order status to {status}"
            )));
        }

        let order = self
            .repo
            .with_retry("transition_order", || async move {
                let mut order: Order = self.repo.require(order_id).await?;
                if order.supplier_id != actor.id {
                    return Err(DomainError::PermissionDenied(format!(
                        "order {order_id} belongs to another supplier"
                    )));
                }
                let from = order.status;
                order.transition(status)?;

                let records = self.repo.commit(order.update_write()?.into()).await?;
                order.set_version(records[0].version);
                Ok((order, from))
            })
            .await
            .map(|(order, from)| {
                metrics::counter!("order_transitions_total", "to" => status.as_str()).increment(1);
                tracing::info!(order_id = %order.id, %from, to = %status, "order status changed");
                order
            })?;

        Ok(order)
    }

    /// Reads an order and its shipment. Only the order's merchant or supplier
    /// may see it.
    pub async fn get(&self, actor: Actor, order_id: OrderId) -> Result<OrderDetails, DomainError> {
        let order: Order = self.repo.require(order_id).await?;
        if !order.is_party(actor.id) {
            return Err(DomainError::PermissionDenied(format!(
                "order {order_id} is not yours to view"
            )));
        }

        let shipment = match order.shipment_id {
            Some(shipment_id) => self.repo.load::<Shipment>(shipment_id).await?,
            None => None,
        };

        Ok(OrderDetails { order, shipment })
    }

    /// Lists the actor's own orders: placed by a merchant, or received by a
    /// supplier.
    pub async fn list(&self, actor: Actor, query: OrderQuery) -> Result<Vec<Order>, DomainError> {
        let filter = match actor.role {
            Role::Merchant => Filter::new().eq("merchant_id", actor.id.to_string()),
            Role::Supplier => Filter::new().eq("supplier_id", actor.id.to_string()),
            Role::ShippingCompany => {
                return Err(DomainError::PermissionDenied(
                    "shipping companies list shipments, not orders".to_string(),
                ));
            }
        };
        let filter = match query.status {
            Some(status) => filter.eq("status", status.as_str()),
            None => filter,
        };

        self.repo.find(filter).await
    }

    /// Lists orders that are ready and not yet claimed by a shipment.
    pub async fn list_available(&self, actor: Actor) -> Result<Vec<Order>, DomainError> {
        actor.require(Role::ShippingCompany)?;
        self.repo.find(ready_unclaimed()).await
    }
}

/// Matches orders that are ready and have no shipment yet.
pub(crate) fn ready_unclaimed() -> Filter {
    Filter::new()
        .eq("status", OrderStatus::Ready.as_str())
        .is_null("shipment_id")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::{CreateProduct, ProductService};
    use crate::value_objects::{AccountId, Money, ProductId};
    use record_store::InMemoryRecordStore;

    struct Fixture {
        orders: OrderService<InMemoryRecordStore>,
        products: ProductService<InMemoryRecordStore>,
        supplier: Actor,
        merchant: Actor,
    }

    impl Fixture {
        fn new() -> Self {
            let repo = Repository::new(InMemoryRecordStore::new());
            Self {
                orders: OrderService::new(repo.clone()),
                products: ProductService::new(repo),
                supplier: Actor::supplier(AccountId::new()),
                merchant: Actor::merchant(AccountId::new()),
            }
        }

        async fn product(&self, quantity: u32) -> Product {
            self.products
                .create_product(
                    self.supplier,
                    CreateProduct {
                        name: "Cardamom".into(),
                        description: "Green cardamom pods".into(),
                        category: Some("spices".into()),
                        price: Money::from_cents(1000),
                        quantity,
                    },
                )
                .await
                .unwrap()
        }

        async fn stock(&self, id: ProductId) -> u32 {
            self.products.get(id).await.unwrap().quantity
        }
    }

    #[tokio::test]
    async fn create_order_decrements_stock() {
        let f = Fixture::new();
        let product = f.product(10).await;

        let order = f
            .orders
            .create_order(f.merchant, CreateOrder::new(product.id, 3, "Riyadh"))
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_amount, Money::from_cents(3000));
        assert_eq!(order.supplier_id, f.supplier.id);
        assert_eq!(order.product_name, "Cardamom");
        assert_eq!(f.stock(product.id).await, 7);
    }

    #[tokio::test]
    async fn create_order_validates_input_before_touching_stock() {
        let f = Fixture::new();
        let product = f.product(10).await;

        for cmd in [
            CreateOrder::new(product.id, 0, "Riyadh"),
            CreateOrder::new(product.id, -2, "Riyadh"),
            CreateOrder::new(product.id, 1, "   "),
        ] {
            let err = f.orders.create_order(f.merchant, cmd).await.unwrap_err();
            assert!(matches!(err, DomainError::InvalidArgument(_)));
        }
        assert_eq!(f.stock(product.id).await, 10);
    }

    #[tokio::test]
    async fn create_order_requires_merchant() {
        let f = Fixture::new();
        let product = f.product(10).await;

        let err = f
            .orders
            .create_order(f.supplier, CreateOrder::new(product.id, 1, "Jeddah"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn create_order_for_unknown_product() {
        let f = Fixture::new();
        let err = f
            .orders
            .create_order(f.merchant, CreateOrder::new(ProductId::new(), 1, "Jeddah"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "Product", .. }));
    }

    #[tokio::test]
    async fn supplier_walks_order_to_ready() {
        let f = Fixture::new();
        let product = f.product(5).await;
        let order = f
            .orders
            .create_order(f.merchant, CreateOrder::new(product.id, 1, "Dammam"))
            .await
            .unwrap();

        for status in [
            OrderStatus::Accepted,
            OrderStatus::Processing,
            OrderStatus::Ready,
        ] {
            let updated = f
                .orders
                .transition_status(f.supplier, order.id, status)
                .await
                .unwrap();
            assert_eq!(updated.status, status);
        }
    }

    #[tokio::test]
    async fn transition_error_precedence() {
        let f = Fixture::new();
        let product = f.product(5).await;
        let order = f
            .orders
            .create_order(f.merchant, CreateOrder::new(product.id, 1, "Dammam"))
            .await
            .unwrap();

        let err = f
            .orders
            .transition_status(f.supplier, order.id, OrderStatus::Shipped)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidArgument(_)));

        let err = f
            .orders
            .transition_status(f.supplier, OrderId::new(), OrderStatus::Accepted)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));

        let other = Actor::supplier(AccountId::new());
        let err = f
            .orders
            .transition_status(other, order.id, OrderStatus::Accepted)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied(_)));

        let err = f
            .orders
            .transition_status(f.supplier, order.id, OrderStatus::Ready)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));

        let details = f.orders.get(f.merchant, order.id).await.unwrap();
        assert_eq!(details.order.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn reads_are_scoped_to_parties() {
        let f = Fixture::new();
        let product = f.product(5).await;
        let order = f
            .orders
            .create_order(f.merchant, CreateOrder::new(product.id, 2, "Abha"))
            .await
            .unwrap();

        let details = f.orders.get(f.supplier, order.id).await.unwrap();
        assert_eq!(details.order.id, order.id);
        assert!(details.shipment.is_none());

        let err = f
            .orders
            .get(Actor::merchant(AccountId::new()), order.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied(_)));

        assert_eq!(
            f.orders
                .list(f.merchant, OrderQuery::default())
                .await
                .unwrap()
                .len(),
            1
        );
        assert_eq!(
            f.orders
                .list(f.supplier, OrderQuery::default())
                .await
                .unwrap()
                .len(),
            1
        );
        assert!(
            f.orders
                .list(Actor::merchant(AccountId::new()), OrderQuery::default())
                .await
                .unwrap()
                .is_empty()
        );
        assert!(
            f.orders
                .list(
                    f.merchant,
                    OrderQuery {
                        status: Some(OrderStatus::Ready)
                    }
                )
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn available_orders_are_ready_and_unclaimed() {
        let f = Fixture::new();
        let product = f.product(5).await;
        let ready = f
            .orders
            .create_order(f.merchant, CreateOrder::new(product.id, 1, "Tabuk"))
            .await
            .unwrap();
        f.orders
            .create_order(f.merchant, CreateOrder::new(product.id, 1, "Tabuk"))
            .await
            .unwrap();
        for status in [
            OrderStatus::Accepted,
            OrderStatus::Processing,
            OrderStatus::Ready,
        ] {
            f.orders
                .transition_status(f.supplier, ready.id, status)
                .await
                .unwrap();
        }

        let company = Actor::shipping_company(AccountId::new());
        let available = f.orders.list_available(company).await.unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].id, ready.id);

        assert!(matches!(
            f.orders.list_available(f.merchant).await,
            Err(DomainError::PermissionDenied(_))
        ));
    }
}
