//! Scope authorization weaver.
//!
//! Every route goes through [`ScopedRouter`] exactly once, at router
//! construction. A route registered with a non-empty scope list becomes
//! [`RouteProtection::Protected`]: each scope is checked against the
//! permission registry right there (an unknown scope is a startup error), the
//! route's method router is wrapped in [`require_scopes`], and the bearer
//! security requirement is written into its OpenAPI operations. Routes with
//! no scopes are left untouched and never look at credentials.

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::{self, Next},
    response::Response,
};
use thiserror::Error;
use tracing::{debug, warn};
use utoipa::openapi::Paths;
use utoipa::openapi::security::SecurityRequirement;
use utoipa_axum::router::{OpenApiRouter, UtoipaMethodRouter};

use crate::auth::AuthContext;
use crate::auth::credential::Credential;
use crate::auth::permissions::PermissionRegistry;
use crate::auth::verifier::CredentialVerifier;
use crate::error::AppError;

/// Name of the bearer security scheme in the OpenAPI document
pub const BEARER_SCHEME: &str = "bearerAuth";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScopeRegistrationError {
    #[error("route '{route}' requires unknown scope '{scope}'")]
    UnknownScope { route: String, scope: String },
}

/// Scopes a caller must hold, all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequiredScopes(BTreeSet<String>);

impl RequiredScopes {
    pub fn new<I, S>(scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(scopes.into_iter().map(Into::into).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Required scopes absent from `credential`, in sorted order.
    pub fn missing_from(&self, credential: &Credential) -> Vec<&str> {
        let granted = credential.scopes();
        self.iter().filter(|scope| !granted.contains(scope)).collect()
    }

    /// First scope the registry does not know.
    fn first_unknown(&self, registry: &PermissionRegistry) -> Option<&str> {
        self.iter().find(|scope| !registry.contains(scope))
    }
}

/// Decided once per route when it is registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteProtection {
    Unprotected,
    Protected(RequiredScopes),
}

impl RouteProtection {
    pub fn from_scopes(scopes: &[&str]) -> Self {
        if scopes.is_empty() {
            RouteProtection::Unprotected
        } else {
            RouteProtection::Protected(RequiredScopes::new(scopes.iter().copied()))
        }
    }
}

/// Per-route state of the guard middleware.
#[derive(Clone)]
struct ScopeGuard {
    route: Arc<str>,
    required: Arc<RequiredScopes>,
    verifier: Arc<dyn CredentialVerifier>,
}

/// Builds an [`OpenApiRouter`] where every route's protection is fixed at
/// registration.
pub struct ScopedRouter<S> {
    router: OpenApiRouter<S>,
    auth: AuthContext,
}

impl<S> ScopedRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new(auth: &AuthContext) -> Self {
        Self {
            router: OpenApiRouter::new(),
            auth: auth.clone(),
        }
    }

    /// Register a route anyone may call.
    pub fn public(mut self, route: UtoipaMethodRouter<S>) -> Self {
        debug!(route = %route_name(&route.1), "Public route registered");
        self.router = self.router.routes(route);
        self
    }

    /// Register a route that requires every scope in `scopes`.
    ///
    /// An empty list registers the route as public.
    pub fn protected(
        mut self,
        route: UtoipaMethodRouter<S>,
        scopes: &[&str],
    ) -> Result<Self, ScopeRegistrationError> {
        let required = match RouteProtection::from_scopes(scopes) {
            RouteProtection::Unprotected => return Ok(self.public(route)),
            RouteProtection::Protected(required) => required,
        };

        let (schemas, mut paths, method_router) = route;
        let name = route_name(&paths);

        if let Some(scope) = required.first_unknown(&self.auth.registry) {
            return Err(ScopeRegistrationError::UnknownScope {
                route: name,
                scope: scope.to_string(),
            });
        }

        document_security(&mut paths, &required);
        debug!(
            route = %name,
            scopes = ?required.iter().collect::<Vec<_>>(),
            "Protected route registered"
        );

        let guard = ScopeGuard {
            route: Arc::from(name),
            required: Arc::new(required),
            verifier: self.auth.verifier.clone(),
        };
        let method_router = method_router.layer(middleware::from_fn_with_state(guard, require_scopes));

        self.router = self.router.routes((schemas, paths, method_router));
        Ok(self)
    }

    pub fn into_router(self) -> OpenApiRouter<S> {
        self.router
    }
}

fn route_name(paths: &Paths) -> String {
    paths
        .paths
        .keys()
        .next()
        .cloned()
        .unwrap_or_else(|| "<unnamed>".to_string())
}

fn document_security(paths: &mut Paths, required: &RequiredScopes) {
    for item in paths.paths.values_mut() {
        for operation in [
            item.get.as_mut(),
            item.post.as_mut(),
            item.put.as_mut(),
            item.patch.as_mut(),
            item.delete.as_mut(),
        ]
        .into_iter()
        .flatten()
        {
            operation.security = Some(vec![SecurityRequirement::new(
                BEARER_SCHEME,
                required.iter().map(str::to_string),
            )]);
        }
    }
}

/// `Authorization: Bearer <token>`, scheme matched case-insensitively
fn bearer_token(request: &Request) -> Option<String> {
    let value = request.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
}

/// Guard attached to protected routes; the handler runs only if it passes.
async fn require_scopes(
    State(guard): State<ScopeGuard>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&request).ok_or_else(|| {
        AppError::unauthorized("Missing or malformed authorization header. Expected: Bearer <token>")
    })?;

    let credential = guard.verifier.verify(&token).await?;

    let missing = guard.required.missing_from(&credential);
    if !missing.is_empty() {
        warn!(
            route = %guard.route,
            subject = %credential.subject_id,
            missing = ?missing,
            "Request lacks required scopes"
        );
        return Err(AppError::Forbidden {
            message: format!("Missing required scope(s): {}", missing.join(", ")),
        });
    }

    request.extensions_mut().insert(credential);
    Ok(next.run(request).await)
}
