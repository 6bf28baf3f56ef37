//! Repository layer for data access operations.
//!
//! Every resource is served by a [`TableRepository`] over its static table
//! definition, exposed as a shared [`DataAccessor`].

pub mod sql;
mod table_repo;

pub use table_repo::TableRepository;

use std::sync::Arc;

use crate::config::PaginationConfig;
use crate::db::AsyncDbPool;
use crate::query::DataAccessor;
use crate::schema;

/// Aggregates all repositories for convenient access.
///
/// Fields are trait objects so tests can swap in in-memory accessors.
#[derive(Clone)]
pub struct Repositories {
    pub customers: Arc<dyn DataAccessor>,
    pub suppliers: Arc<dyn DataAccessor>,
    pub products: Arc<dyn DataAccessor>,
    pub warehouses: Arc<dyn DataAccessor>,
    pub bins: Arc<dyn DataAccessor>,
    pub cycle_counts: Arc<dyn DataAccessor>,
    pub notifications: Arc<dyn DataAccessor>,
}

impl Repositories {
    /// Creates a new Repositories instance with all repositories initialized.
    ///
    /// # Arguments
    /// * `pool` - The async database connection pool
    /// * `pagination` - Search settings shared by every table
    pub fn new(pool: AsyncDbPool, pagination: &PaginationConfig) -> Self {
        let table = |schema: &'static schema::TableSchema| -> Arc<dyn DataAccessor> {
            Arc::new(TableRepository::new(
                pool.clone(),
                schema,
                pagination.case_sensitive_search,
            ))
        };

        Self {
            customers: table(&schema::CUSTOMERS),
            suppliers: table(&schema::SUPPLIERS),
            products: table(&schema::PRODUCTS),
            warehouses: table(&schema::WAREHOUSES),
            bins: table(&schema::BINS),
            cycle_counts: table(&schema::CYCLE_COUNTS),
            notifications: table(&schema::NOTIFICATIONS),
        }
    }
}
