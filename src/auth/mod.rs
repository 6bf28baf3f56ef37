//! Route authorization.
//!
//! - [`permissions`]: static scope catalog and the registry built from it
//! - [`credential`] / [`verifier`]: bearer token to verified caller
//! - [`weaver`]: per-route scope protection fixed at router construction

pub mod credential;
pub mod permissions;
pub mod verifier;
pub mod weaver;

use std::sync::Arc;

pub use credential::Credential;
pub use permissions::{PermissionEntry, PermissionRegistry};
pub use verifier::{CredentialVerifier, JwtVerifier};
pub use weaver::{RequiredScopes, RouteProtection, ScopeRegistrationError, ScopedRouter};

/// What the weaver needs to build guarded routes.
#[derive(Clone)]
pub struct AuthContext {
    pub registry: Arc<PermissionRegistry>,
    pub verifier: Arc<dyn CredentialVerifier>,
}

impl AuthContext {
    pub fn new(registry: Arc<PermissionRegistry>, verifier: Arc<dyn CredentialVerifier>) -> Self {
        Self { registry, verifier }
    }
}
