//! Shipment service: claiming orders, status updates and the delivery cascade.

use record_store::{Filter, RecordStore, WriteBatch};

use crate::account::Role;
use crate::actor::Actor;
use crate::document::Document;
use crate::error::DomainError;
use crate::order::Order;
use crate::repository::Repository;
use crate::value_objects::ShipmentId;

use super::{
    CreateShipment, DEFAULT_PICKUP_ADDRESS, Shipment, ShipmentQuery, ShipmentStatus,
    UpdateShipmentStatus,
};

/// Service for managing shipments.
pub struct ShipmentService<S: RecordStore> {
    repo: Repository<S>,
}

impl<S: RecordStore> ShipmentService<S> {
    /// Creates a new shipment service over the given repository.
    pub fn new(repo: Repository<S>) -> Self {
        Self { repo }
    }

    /// Claims a ready order and opens its shipment.
    ///
    /// The shipment insert and the order's move to `shipped` are one commit.
    /// The shipment's `order_id` is unique, so a competing claim loses on
    /// commit and then sees the order already shipped.
    #[tracing::instrument(skip(self, cmd), fields(company_id = %actor.id, order_id = %cmd.order_id))]
    pub async fn create_shipment(
        &self,
        actor: Actor,
        cmd: CreateShipment,
    ) -> Result<Shipment, DomainError> {
        actor.require(Role::ShippingCompany)?;
        if cmd.shipping_cost.is_negative() {
            return Err(DomainError::InvalidArgument(
                "shipping cost cannot be negative".to_string(),
            ));
        }
        let pickup_address = cmd
            .pickup_address
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| DEFAULT_PICKUP_ADDRESS.to_string());
        let order_id = cmd.order_id;
        let estimated_delivery_date = cmd.estimated_delivery_date;
        let shipping_cost = cmd.shipping_cost;

        let shipment = self
            .repo
            .with_retry("create_shipment", || {
                let pickup_address = pickup_address.clone();
                async move {
                    let mut order: Order = self.repo.require(order_id).await?;
                    let mut shipment = Shipment::open(
                        &order,
                        actor.id,
                        estimated_delivery_date,
                        shipping_cost,
                        pickup_address,
                    );
                    order.mark_shipped(shipment.id)?;

                    let batch = WriteBatch::new()
                        .push(shipment.insert_write()?)
                        .push(order.update_write()?);
                    let records = self.repo.commit(batch).await?;
                    shipment.set_version(records[0].version);
                    Ok(shipment)
                }
            })
            .await?;

        metrics::counter!("shipments_created_total").increment(1);
        tracing::info!(
            shipment_id = %shipment.id,
            tracking_number = %shipment.tracking_number,
            "shipment created"
        );
        Ok(shipment)
    }

    /// Reports a status change on a shipment the acting company carries.
    ///
    /// Delivery completes the order in the same commit.
    #[tracing::instrument(skip(self, cmd), fields(company_id = %actor.id, status = %cmd.status))]
    pub async fn update_status(
        &self,
        actor: Actor,
        shipment_id: ShipmentId,
        cmd: UpdateShipmentStatus,
    ) -> Result<Shipment, DomainError> {
        actor.require(Role::ShippingCompany)?;
        if cmd.status == ShipmentStatus::Pending {
            return Err(DomainError::InvalidArgument(
                "shipments cannot be set back to pending".to_string(),
            ));
        }
        let location = cmd.location.filter(|l| !l.trim().is_empty());
        let notes = cmd.notes.filter(|n| !n.trim().is_empty());
        let status = cmd.status;

        let shipment = self
            .repo
            .with_retry("update_shipment_status", || {
                let location = location.clone();
                let notes = notes.clone();
                async move {
                    let mut shipment: Shipment = self.repo.require(shipment_id).await?;
                    if !shipment.is_carried_by(actor.id) {
                        return Err(DomainError::PermissionDenied(format!(
                            "shipment {shipment_id} belongs to another shipping company"
                        )));
                    }
                    shipment.advance(status, location, notes)?;

                    let mut batch = WriteBatch::new().push(shipment.update_write()?);
                    if status == ShipmentStatus::Delivered {
                        let mut order: Order = self.repo.require(shipment.order_id).await?;
                        order.complete()?;
                        batch = batch.push(order.update_write()?);
                    }

                    let records = self.repo.commit(batch).await?;
                    shipment.set_version(records[0].version);
                    Ok(shipment)
                }
            })
            .await?;

        metrics::counter!("shipment_status_updates_total", "to" => status.as_str()).increment(1);
        if status == ShipmentStatus::Delivered {
            metrics::counter!("deliveries_total").increment(1);
            tracing::info!(shipment_id = %shipment.id, order_id = %shipment.order_id, "shipment delivered, order completed");
        } else {
            tracing::info!(shipment_id = %shipment.id, "shipment status changed");
        }
        Ok(shipment)
    }

    /// Loads a shipment the acting company carries.
    pub async fn get(
        &self,
        actor: Actor,
        shipment_id: ShipmentId,
    ) -> Result<Shipment, DomainError> {
        actor.require(Role::ShippingCompany)?;
        let shipment: Shipment = self.repo.require(shipment_id).await?;
        if !shipment.is_carried_by(actor.id) {
            return Err(DomainError::PermissionDenied(format!(
                "shipment {shipment_id} belongs to another shipping company"
            )));
        }
        Ok(shipment)
    }

    /// Lists the acting company's shipments.
    pub async fn list_for_company(
        &self,
        actor: Actor,
        query: ShipmentQuery,
    ) -> Result<Vec<Shipment>, DomainError> {
        actor.require(Role::ShippingCompany)?;
        let filter = Filter::new().eq("shipping_company_id", actor.id.to_string());
        let filter = match query.status {
            Some(status) => filter.eq("status", status.as_str()),
            None => filter,
        };
        self.repo.find(filter).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use record_store::InMemoryRecordStore;

    use super::*;
    use crate::order::{CreateOrder, OrderService, OrderStatus};
    use crate::product::{CreateProduct, ProductService};
    use crate::value_objects::{AccountId, Money, OrderId};

    struct Fixture {
        orders: OrderService<InMemoryRecordStore>,
        shipments: ShipmentService<InMemoryRecordStore>,
        merchant: Actor,
        company: Actor,
    }

    impl Fixture {
        /// Builds the services and one order walked to `ready`.
        async fn with_ready_order() -> (Self, OrderId) {
            let repo = Repository::new(InMemoryRecordStore::new());
            let products = ProductService::new(repo.clone());
            let f = Self {
                orders: OrderService::new(repo.clone()),
                shipments: ShipmentService::new(repo),
                merchant: Actor::merchant(AccountId::new()),
                company: Actor::shipping_company(AccountId::new()),
            };
            let supplier = Actor::supplier(AccountId::new());

            let product = products
                .create_product(
                    supplier,
                    CreateProduct {
                        name: "Coffee".into(),
                        description: "Khawlani beans".into(),
                        category: None,
                        price: Money::from_cents(2500),
                        quantity: 10,
                    },
                )
                .await
                .unwrap();
            let order = f
                .orders
                .create_order(f.merchant, CreateOrder::new(product.id, 3, "Olaya St, Riyadh"))
                .await
                .unwrap();
            for status in [
                OrderStatus::Accepted,
                OrderStatus::Processing,
                OrderStatus::Ready,
            ] {
                f.orders
                    .transition_status(supplier, order.id, status)
                    .await
                    .unwrap();
            }
            (f, order.id)
        }

        fn claim(order_id: OrderId) -> CreateShipment {
            CreateShipment {
                order_id,
                estimated_delivery_date: NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
                shipping_cost: Money::from_cents(50),
                pickup_address: None,
            }
        }

        async fn order(&self, order_id: OrderId) -> Order {
            self.orders.get(self.merchant, order_id).await.unwrap().order
        }
    }

    #[tokio::test]
    async fn create_shipment_links_order() {
        let (f, order_id) = Fixture::with_ready_order().await;

        let shipment = f
            .shipments
            .create_shipment(f.company, Fixture::claim(order_id))
            .await
            .unwrap();

        assert_eq!(shipment.pickup_address, DEFAULT_PICKUP_ADDRESS);
        assert_eq!(shipment.delivery_address, "Olaya St, Riyadh");
        assert!(shipment.tracking_number.starts_with("TRK"));

        let order = f.order(order_id).await;
        assert_eq!(order.status, OrderStatus::Shipped);
        assert_eq!(order.shipment_id, Some(shipment.id));
    }

    #[tokio::test]
    async fn second_claim_is_invalid_state() {
        let (f, order_id) = Fixture::with_ready_order().await;
        f.shipments
            .create_shipment(f.company, Fixture::claim(order_id))
            .await
            .unwrap();

        let other = Actor::shipping_company(AccountId::new());
        let err = f
            .shipments
            .create_shipment(other, Fixture::claim(order_id))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
        assert!(
            f.shipments
                .list_for_company(other, ShipmentQuery::default())
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn claim_rejects_unknown_order_and_negative_cost() {
        let (f, _) = Fixture::with_ready_order().await;

        let err = f
            .shipments
            .create_shipment(f.company, Fixture::claim(OrderId::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));

        let mut cmd = Fixture::claim(OrderId::new());
        cmd.shipping_cost = Money::from_cents(-5);
        let err = f.shipments.create_shipment(f.company, cmd).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn delivery_completes_order() {
        let (f, order_id) = Fixture::with_ready_order().await;
        let shipment = f
            .shipments
            .create_shipment(f.company, Fixture::claim(order_id))
            .await
            .unwrap();

        let delivered = f
            .shipments
            .update_status(
                f.company,
                shipment.id,
                UpdateShipmentStatus::new(ShipmentStatus::Delivered).at("Riyadh"),
            )
            .await
            .unwrap();

        assert_eq!(delivered.status, ShipmentStatus::Delivered);
        assert!(delivered.delivered_at.is_some());
        assert_eq!(delivered.status_history.len(), 2);
        assert_eq!(f.order(order_id).await.status, OrderStatus::Completed);
    }

    #[tokio::test]
    async fn failure_leaves_order_shipped() {
        let (f, order_id) = Fixture::with_ready_order().await;
        let shipment = f
            .shipments
            .create_shipment(f.company, Fixture::claim(order_id))
            .await
            .unwrap();

        f.shipments
            .update_status(
                f.company,
                shipment.id,
                UpdateShipmentStatus::new(ShipmentStatus::Failed).with_notes("address not found"),
            )
            .await
            .unwrap();
        assert_eq!(f.order(order_id).await.status, OrderStatus::Shipped);
    }

    #[tokio::test]
    async fn other_company_cannot_update() {
        let (f, order_id) = Fixture::with_ready_order().await;
        let shipment = f
            .shipments
            .create_shipment(f.company, Fixture::claim(order_id))
            .await
            .unwrap();

        let intruder = Actor::shipping_company(AccountId::new());
        let err = f
            .shipments
            .update_status(
                intruder,
                shipment.id,
                UpdateShipmentStatus::new(ShipmentStatus::Failed),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied(_)));

        let unchanged = f.shipments.get(f.company, shipment.id).await.unwrap();
        assert_eq!(unchanged, shipment);
    }

    #[tokio::test]
    async fn backward_and_pending_updates_rejected() {
        let (f, order_id) = Fixture::with_ready_order().await;
        let shipment = f
            .shipments
            .create_shipment(f.company, Fixture::claim(order_id))
            .await
            .unwrap();
        f.shipments
            .update_status(
                f.company,
                shipment.id,
                UpdateShipmentStatus::new(ShipmentStatus::OutForDelivery),
            )
            .await
            .unwrap();

        let err = f
            .shipments
            .update_status(
                f.company,
                shipment.id,
                UpdateShipmentStatus::new(ShipmentStatus::PickedUp),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));

        let err = f
            .shipments
            .update_status(
                f.company,
                shipment.id,
                UpdateShipmentStatus::new(ShipmentStatus::Pending),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn listing_filters_by_status() {
        let (f, order_id) = Fixture::with_ready_order().await;
        let shipment = f
            .shipments
            .create_shipment(f.company, Fixture::claim(order_id))
            .await
            .unwrap();

        let pending = f
            .shipments
            .list_for_company(
                f.company,
                ShipmentQuery {
                    status: Some(ShipmentStatus::Pending),
                },
            )
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, shipment.id);

        let delivered = f
            .shipments
            .list_for_company(
                f.company,
                ShipmentQuery {
                    status: Some(ShipmentStatus::Delivered),
                },
            )
            .await
            .unwrap();
        assert!(delivered.is_empty());
    }
}
