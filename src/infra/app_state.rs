use crate::{
    infra::db::DbPool,
    services::{cart::CartAdmission, checkout::CheckoutOrchestrator},
};

/// Shared state handed to every route. The core components receive the pool
/// at construction; nothing reaches for a global connection.
#[derive(Clone)]
pub struct AppState {
    pub db_pool: DbPool,
    pub carts: CartAdmission,
    pub checkout: CheckoutOrchestrator,
}

impl AppState {
    pub fn new(db_pool: DbPool) -> Self {
        Self {
            carts: CartAdmission::new(db_pool.clone()),
            checkout: CheckoutOrchestrator::new(db_pool.clone()),
            db_pool,
        }
    }
}
