//! Application state for Axum web framework.
//!
//! Contains shared services and resources that are accessible
//! across all request handlers.

use std::sync::Arc;

use crate::auth::PermissionRegistry;
use crate::config::PaginationConfig;
use crate::db::AsyncDbPool;
use crate::query::{PageLimits, PaginationEngine};
use crate::repositories::Repositories;
use crate::services::Services;

/// Application state containing all shared services and resources.
///
/// This struct is designed to be used with Axum's State extractor.
/// Cloning is cheap since services, the pool and the registry are all shared.
#[derive(Clone)]
pub struct AppState {
    /// One list/get service per resource
    pub services: Services,
    /// Direct access to the database connection pool (health checks)
    pub db_pool: AsyncDbPool,
    /// Read-only permission catalog
    pub permissions: Arc<PermissionRegistry>,
}

impl AppState {
    /// Creates a new AppState backed by PostgreSQL.
    ///
    /// # Arguments
    /// * `pool` - The async database connection pool
    /// * `pagination` - Page size limits and search settings
    /// * `permissions` - The registry routes were validated against
    pub fn new(
        pool: AsyncDbPool,
        pagination: &PaginationConfig,
        permissions: Arc<PermissionRegistry>,
    ) -> Self {
        let repos = Repositories::new(pool.clone(), pagination);
        Self::with_repositories(repos, pool, PageLimits::from(pagination), permissions)
    }

    /// Creates an AppState over arbitrary data accessors.
    pub fn with_repositories(
        repos: Repositories,
        pool: AsyncDbPool,
        limits: PageLimits,
        permissions: Arc<PermissionRegistry>,
    ) -> Self {
        Self {
            services: Services::new(repos, PaginationEngine::new(limits)),
            db_pool: pool,
            permissions,
        }
    }
}
