//! Serve command handler
//!
//! Runs the HTTP server, or with `--dry-run` checks everything the server
//! would check before binding and exits.

use std::sync::Arc;

use crate::api::routes::api_routes;
use crate::auth::{AuthContext, JwtVerifier, PermissionRegistry};
use crate::config::settings::Settings;
use crate::error::{AppError, AppResult};
use crate::server::Server;

/// Handler for the serve command
pub struct ServeCommandHandler {
    config: Settings,
}

impl ServeCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Execute the serve command
    ///
    /// # Errors
    /// - Configuration validation errors
    /// - Route scope registration errors
    /// - Server startup errors (if not dry-run)
    pub async fn execute(&self, dry_run: bool) -> AppResult<()> {
        if dry_run {
            return self.validate_only();
        }

        Server::new(self.config.clone())
            .run()
            .await
            .map_err(|source| AppError::Internal { source })
    }

    /// Validate configuration and route scopes without starting the server
    pub fn validate_only(&self) -> AppResult<()> {
        self.config.validate()?;
        println!("✓ Configuration is valid");

        self.config.jwt.validate()?;
        println!("✓ JWT settings are valid");

        let registry = Arc::new(PermissionRegistry::load());
        let scope_count = registry.len();
        let auth = AuthContext::new(registry, Arc::new(JwtVerifier::from(&self.config.jwt)));
        api_routes(&auth)?;
        println!("✓ Every route scope is in the catalog ({} scopes)", scope_count);

        println!("✓ Server would bind to: {}", self.config.server.address());
        println!("Dry run completed successfully");
        Ok(())
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }
}
