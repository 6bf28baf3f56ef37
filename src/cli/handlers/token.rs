//! Token command handler
//!
//! Mints HS256 access tokens for operators and integration clients.

use crate::auth::PermissionRegistry;
use crate::config::settings::Settings;
use crate::error::{AppError, AppResult};
use crate::utils::jwt::issue_access_token;

/// Handler for the token command
pub struct TokenCommandHandler {
    config: Settings,
    registry: PermissionRegistry,
}

impl TokenCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self {
            config,
            registry: PermissionRegistry::load(),
        }
    }

    /// Sign a token for `subject` and print it to stdout.
    ///
    /// # Errors
    /// - JWT configuration errors
    /// - `Validation` when a scope is not in the permission catalog
    pub fn execute(&self, subject: &str, scope: &str, expires_in: Option<i64>) -> AppResult<()> {
        let token = self.issue(subject, scope, expires_in)?;
        println!("{}", token);
        Ok(())
    }

    /// Sign a token without printing it.
    pub fn issue(&self, subject: &str, scope: &str, expires_in: Option<i64>) -> AppResult<String> {
        let jwt = &self.config.jwt;
        jwt.validate()?;

        let scopes = self.normalize_scopes(scope)?;
        let hours = expires_in.unwrap_or(jwt.access_token_expiration);

        tracing::info!(subject = %subject, scope = %scopes, hours, "Issuing access token");
        issue_access_token(subject, &scopes, jwt.issuer.as_deref(), &jwt.secret, hours)
    }

    /// Checks every scope against the catalog and joins them deduplicated.
    fn normalize_scopes(&self, scope: &str) -> AppResult<String> {
        let mut scopes: Vec<&str> = Vec::new();
        for requested in scope.split_whitespace() {
            if !self.registry.contains(requested) {
                return Err(AppError::Validation {
                    field: "scope".to_string(),
                    reason: format!("Unknown scope '{}'", requested),
                });
            }
            if !scopes.contains(&requested) {
                scopes.push(requested);
            }
        }

        if scopes.is_empty() {
            return Err(AppError::Validation {
                field: "scope".to_string(),
                reason: "At least one scope is required".to_string(),
            });
        }
        Ok(scopes.join(" "))
    }
}
