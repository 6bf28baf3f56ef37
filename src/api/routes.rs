//! Router configuration for the API.
//!
//! This module provides centralized route registration and middleware
//! configuration for the application.

use axum::{Router, middleware};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::doc::ApiDoc;
use crate::api::handlers;
use crate::api::middleware::{
    cancellation_middleware, global_error_handler, logging_middleware, request_id_middleware,
};
use crate::auth::{AuthContext, ScopeRegistrationError, ScopedRouter};
use crate::state::AppState;

pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";
pub const SWAGGER_UI_PATH: &str = "/swagger-ui";

/// Every `/api` route, each registered with the scopes it requires.
///
/// Fails on the first route that names a scope missing from the registry.
pub fn api_routes(auth: &AuthContext) -> Result<OpenApiRouter<AppState>, ScopeRegistrationError> {
    let router = ScopedRouter::new(auth);
    let router = handlers::health::health_routes(router);
    let router = handlers::permissions::permission_routes(router);
    let router = handlers::customers::customer_routes(router)?;
    let router = handlers::suppliers::supplier_routes(router)?;
    let router = handlers::products::product_routes(router)?;
    let router = handlers::warehouses::warehouse_routes(router)?;
    let router = handlers::bins::bin_routes(router)?;
    let router = handlers::cycle_counts::cycle_count_routes(router)?;
    let router = handlers::notifications::notification_routes(router)?;
    Ok(router.into_router())
}

/// Creates the main application router with all routes and middleware.
///
/// # Middleware Order
/// Middleware is applied in reverse order of declaration (last added runs first):
/// 1. Request ID - generates/propagates request IDs
/// 2. Logging - one span per request, tagged with the request ID
/// 3. Error handler - uniform JSON error bodies carrying the request ID
/// 4. Cancellation - per-request token, cancelled when the request is dropped
///
/// # Routes
/// - `/api/...` - resource, health and permission endpoints
/// - `/swagger-ui` - Swagger UI over `/api-docs/openapi.json`
pub fn create_router(state: AppState, auth: &AuthContext) -> Result<Router, ScopeRegistrationError> {
    let (router, openapi) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest("/api", api_routes(auth)?)
        .split_for_parts();

    Ok(router
        .merge(SwaggerUi::new(SWAGGER_UI_PATH).url(OPENAPI_JSON_PATH, openapi))
        .layer(middleware::from_fn(cancellation_middleware))
        .layer(middleware::from_fn(global_error_handler))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::auth::{JwtVerifier, PermissionRegistry};

    fn auth_with(registry: PermissionRegistry) -> AuthContext {
        AuthContext::new(
            Arc::new(registry),
            Arc::new(JwtVerifier::new("0123456789abcdef0123456789abcdef", None)),
        )
    }

    #[test]
    fn test_every_declared_scope_is_in_the_catalog() {
        assert!(api_routes(&auth_with(PermissionRegistry::load())).is_ok());
    }

    #[test]
    fn test_missing_scope_fails_router_construction() {
        let partial = PermissionRegistry::from_entries(
            PermissionRegistry::load()
                .iter()
                .filter(|(scope, _)| *scope != "bins::get")
                .map(|(scope, description)| (scope.to_string(), description.to_string()))
                .collect::<Vec<_>>(),
        );

        let err = api_routes(&auth_with(partial)).err().expect("registration must fail");
        assert_eq!(
            err,
            ScopeRegistrationError::UnknownScope {
                route: "/bins/{id}".to_string(),
                scope: "bins::get".to_string(),
            }
        );
    }

    #[test]
    fn test_openapi_documents_protected_and_public_routes() {
        let (_, openapi) = OpenApiRouter::<AppState>::with_openapi(ApiDoc::openapi())
            .nest("/api", api_routes(&auth_with(PermissionRegistry::load())).unwrap())
            .split_for_parts();

        let customers = openapi.paths.paths.get("/api/customers").expect("customers path");
        let list = customers.get.as_ref().expect("GET operation");
        assert!(list.security.is_some());
        let parameters = list.parameters.as_ref().expect("query parameters");
        assert!(parameters.iter().any(|p| p.name == "filter.name.like"));

        let health = openapi.paths.paths.get("/api/health").expect("health path");
        assert!(health.get.as_ref().unwrap().security.is_none());
    }
}
