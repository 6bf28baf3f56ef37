//! HTTP request handlers for API endpoints.
//!
//! One module per resource. Each exposes a `*_routes` function that
//! registers its routes on a [`crate::auth::ScopedRouter`] together with the
//! scopes they require.

pub mod bins;
pub mod customers;
pub mod cycle_counts;
pub mod health;
pub mod notifications;
pub mod permissions;
pub mod products;
pub mod suppliers;
pub mod warehouses;
