pub mod catalog;
pub mod common;
pub mod dispatch;
pub mod inventory;
pub mod orders;
pub mod production;
pub mod suppliers;

use crate::costing::GatePolicy;
use crate::db::DbPool;
use crate::events::EventSender;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<crate::services::catalog::CatalogService>,
    pub orders: Arc<crate::services::orders::OrderService>,
    pub inventory: Arc<crate::services::inventory::InventoryService>,
    pub production: Arc<crate::services::production::ProductionService>,
    pub dispatch: Arc<crate::services::dispatch::DispatchService>,
    pub suppliers: Arc<crate::services::suppliers::SupplierService>,
}

impl AppServices {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Option<Arc<EventSender>>,
        gate_policy: GatePolicy,
    ) -> Self {
        let catalog = Arc::new(crate::services::catalog::CatalogService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let orders = Arc::new(crate::services::orders::OrderService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let inventory = Arc::new(crate::services::inventory::InventoryService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let production = crate::services::production::ProductionService::new(
            db_pool.clone(),
            event_sender.clone(),
            gate_policy,
        );
        let dispatch = Arc::new(crate::services::dispatch::DispatchService::new(
            db_pool.clone(),
            event_sender.clone(),
            production.clone(),
        ));
        let suppliers = Arc::new(crate::services::suppliers::SupplierService::new(
            db_pool,
            event_sender,
        ));

        Self {
            catalog,
            orders,
            inventory,
            production: Arc::new(production),
            dispatch,
            suppliers,
        }
    }
}
