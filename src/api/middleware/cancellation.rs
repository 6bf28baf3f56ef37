//! Per-request cancellation.
//!
//! Each request gets a [`CancellationToken`] that is cancelled when the
//! request future is dropped, whether the client hung up or the timeout
//! layer gave up. Handlers forward it down to the data accessor.

use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use tokio_util::sync::CancellationToken;

/// Cancellation token of the current request.
///
/// Falls back to a fresh, never-cancelled token when the middleware is not
/// installed, so handlers stay usable in isolation.
#[derive(Clone, Debug, Default)]
pub struct RequestCancellation(pub CancellationToken);

impl RequestCancellation {
    pub fn token(&self) -> &CancellationToken {
        &self.0
    }
}

impl<S> FromRequestParts<S> for RequestCancellation
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestCancellation>()
            .cloned()
            .unwrap_or_default())
    }
}

/// Middleware that installs a [`RequestCancellation`] and cancels it on drop.
pub async fn cancellation_middleware(mut request: Request, next: Next) -> Response {
    let token = CancellationToken::new();
    request
        .extensions_mut()
        .insert(RequestCancellation(token.child_token()));

    // Dropped with this future; a completed request cancels a token nobody waits on.
    let _guard = token.drop_guard();
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, middleware, routing::get};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_extractor_without_middleware() {
        let request = Request::builder().uri("/").body(()).unwrap();
        let (mut parts, _) = request.into_parts();

        let RequestCancellation(token) = RequestCancellation::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert!(!token.is_cancelled());
    }

    #[tokio::test]
    async fn test_token_cancelled_when_request_dropped() {
        let seen: Arc<Mutex<Option<CancellationToken>>> = Arc::default();
        let captured = seen.clone();

        let app = Router::new()
            .route(
                "/slow",
                get(move |RequestCancellation(token): RequestCancellation| {
                    let captured = captured.clone();
                    async move {
                        *captured.lock().unwrap() = Some(token);
                        tokio::time::sleep(Duration::from_secs(60)).await;
                        "done"
                    }
                }),
            )
            .layer(middleware::from_fn(cancellation_middleware));

        let request = Request::builder().uri("/slow").body(Body::empty()).unwrap();
        let outcome = tokio::time::timeout(Duration::from_millis(50), app.oneshot(request)).await;
        assert!(outcome.is_err());

        let token = seen.lock().unwrap().clone().unwrap();
        assert!(token.is_cancelled());
    }
}
