//! Shared application state.

use domain::{
    AccountService, DashboardService, OrderService, ProductService, Repository, ShipmentService,
    TrackingGateway,
};
use record_store::RecordStore;

/// Services shared by every handler, all over one record store.
pub struct AppState<S: RecordStore> {
    pub accounts: AccountService<S>,
    pub products: ProductService<S>,
    pub orders: OrderService<S>,
    pub shipments: ShipmentService<S>,
    pub tracking: TrackingGateway<S>,
    pub dashboards: DashboardService<S>,
}

impl<S: RecordStore + Clone> AppState<S> {
    /// Builds every service over the same repository.
    pub fn new(repo: Repository<S>) -> Self {
        Self {
            accounts: AccountService::new(repo.clone()),
            products: ProductService::new(repo.clone()),
            orders: OrderService::new(repo.clone()),
            shipments: ShipmentService::new(repo.clone()),
            tracking: TrackingGateway::new(repo.clone()),
            dashboards: DashboardService::new(repo),
        }
    }
}
