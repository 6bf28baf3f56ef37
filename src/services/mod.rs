//! Service layer for business logic operations.
//!
//! Services encapsulate business logic and coordinate between
//! repositories and handlers.

mod resource_service;

pub use resource_service::ResourceService;

use crate::query::PaginationEngine;
use crate::repositories::Repositories;

/// Aggregates all services for convenient access.
///
/// This struct is designed to be used as Axum application state.
/// Cloning is cheap since accessors are shared behind `Arc`.
#[derive(Clone)]
pub struct Services {
    pub customers: ResourceService,
    pub suppliers: ResourceService,
    pub products: ResourceService,
    pub warehouses: ResourceService,
    pub bins: ResourceService,
    pub cycle_counts: ResourceService,
    pub notifications: ResourceService,
}

impl Services {
    /// Creates a new Services instance from Repositories.
    pub fn new(repos: Repositories, engine: PaginationEngine) -> Self {
        Self {
            customers: ResourceService::new(repos.customers, engine, "customer"),
            suppliers: ResourceService::new(repos.suppliers, engine, "supplier"),
            products: ResourceService::new(repos.products, engine, "product"),
            warehouses: ResourceService::new(repos.warehouses, engine, "warehouse"),
            bins: ResourceService::new(repos.bins, engine, "bin"),
            cycle_counts: ResourceService::new(repos.cycle_counts, engine, "cycle count"),
            notifications: ResourceService::new(repos.notifications, engine, "notification"),
        }
    }
}
