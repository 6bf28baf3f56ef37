//! Error handler for converting AppError to HTTP responses.
//!
//! This module implements the IntoResponse trait for AppError,
//! providing consistent error response formatting across the API.
//! Includes proper status code mapping, error message sanitization,
//! and request ID injection for correlation.

use axum::{
    Json,
    body::Body,
    extract::Request,
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use tracing::{error, warn};

use super::RequestId;
use crate::api::dto::ErrorResponse;
use crate::error::AppError;

/// Upper bound on error bodies buffered by [`global_error_handler`].
const MAX_ERROR_BODY_BYTES: usize = 64 * 1024;

impl IntoResponse for AppError {
    /// Converts an AppError into an HTTP response.
    ///
    /// # Status Code Mapping
    /// - Validation → 400 BAD_REQUEST
    /// - BadRequest → 400 BAD_REQUEST
    /// - Unauthorized → 401 UNAUTHORIZED
    /// - Forbidden → 403 FORBIDDEN
    /// - NotFound → 404 NOT_FOUND
    /// - Cancelled → 408 REQUEST_TIMEOUT
    /// - Database → 500 INTERNAL_SERVER_ERROR
    /// - Configuration → 500 INTERNAL_SERVER_ERROR
    /// - Internal → 500 INTERNAL_SERVER_ERROR
    /// - ConnectionPool → 503 SERVICE_UNAVAILABLE
    fn into_response(self) -> Response {
        let status = error_to_status_code(&self);
        if status.is_server_error() {
            error!(error = ?self, "Request failed");
        }

        let mut response = (status, Json(error_body(&self))).into_response();
        if matches!(self, AppError::Unauthorized { .. }) {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                header::HeaderValue::from_static("Bearer"),
            );
        }
        response
    }
}

/// Maps an AppError variant to its corresponding HTTP status code.
pub fn error_to_status_code(error: &AppError) -> StatusCode {
    match error {
        AppError::Validation { .. } | AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
        AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
        AppError::NotFound { .. } => StatusCode::NOT_FOUND,
        AppError::Cancelled { .. } => StatusCode::REQUEST_TIMEOUT,
        AppError::Database { .. } | AppError::Configuration { .. } | AppError::Internal { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        AppError::ConnectionPool { .. } => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Maps an AppError variant to its error code string.
pub fn error_to_code(error: &AppError) -> &'static str {
    match error {
        AppError::NotFound { .. } => "NOT_FOUND",
        AppError::Validation { .. } => "VALIDATION_ERROR",
        AppError::BadRequest { .. } => "BAD_REQUEST",
        AppError::Unauthorized { .. } => "UNAUTHORIZED",
        AppError::Forbidden { .. } => "FORBIDDEN",
        AppError::Database { .. } => "DATABASE_ERROR",
        AppError::Configuration { .. } => "CONFIGURATION_ERROR",
        AppError::ConnectionPool { .. } => "SERVICE_UNAVAILABLE",
        AppError::Cancelled { .. } => "REQUEST_CANCELLED",
        AppError::Internal { .. } => "INTERNAL_ERROR",
    }
}

/// Client-facing body. Sources of server-side failures are never included.
fn error_body(error: &AppError) -> ErrorResponse {
    let code = error_to_code(error);
    match error {
        AppError::NotFound { entity, field, value } => {
            ErrorResponse::not_found_error(entity, field, value)
        }
        AppError::Validation { field, reason } => ErrorResponse::validation_error(field, reason),
        AppError::BadRequest { message }
        | AppError::Unauthorized { message }
        | AppError::Forbidden { message } => ErrorResponse::new(code, message),
        AppError::Database { operation, .. } => ErrorResponse::new(
            code,
            &format!("Database operation failed: {}", operation),
        )
        .with_details(json!({ "operation": operation })),
        AppError::Configuration { key, .. } => {
            ErrorResponse::new(code, &format!("Configuration error: {}", key))
        }
        AppError::ConnectionPool { .. } => {
            ErrorResponse::new(code, "Database connection unavailable")
        }
        AppError::Cancelled { operation } => ErrorResponse::new(
            code,
            &format!("Request was cancelled during {}", operation),
        ),
        AppError::Internal { .. } => ErrorResponse::new(code, "An internal error occurred"),
    }
}

/// Fallback error code for responses produced outside [`AppError`]
/// (router 404/405, timeouts, extractor rejections).
fn status_to_code(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "BAD_REQUEST",
        StatusCode::UNAUTHORIZED => "UNAUTHORIZED",
        StatusCode::FORBIDDEN => "FORBIDDEN",
        StatusCode::NOT_FOUND => "NOT_FOUND",
        StatusCode::METHOD_NOT_ALLOWED => "METHOD_NOT_ALLOWED",
        StatusCode::REQUEST_TIMEOUT => "REQUEST_TIMEOUT",
        StatusCode::UNSUPPORTED_MEDIA_TYPE => "UNSUPPORTED_MEDIA_TYPE",
        StatusCode::SERVICE_UNAVAILABLE => "SERVICE_UNAVAILABLE",
        s if s.is_server_error() => "INTERNAL_ERROR",
        _ => "UNKNOWN_ERROR",
    }
}

/// Global error handling middleware.
///
/// Every 4xx/5xx response leaves as an [`ErrorResponse`] carrying the request
/// ID: JSON error bodies get `request_id` added, anything else (plain-text
/// rejections, empty router fallbacks) is wrapped.
pub async fn global_error_handler(request: Request, next: Next) -> Response {
    let request_id = request.extensions().get::<RequestId>().map(|id| id.0.clone());
    let response = next.run(request).await;

    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_ERROR_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "Failed to buffer error response body");
            axum::body::Bytes::new()
        }
    };

    let mut body = match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) if map.contains_key("code") => Value::Object(map),
        _ => {
            let original = String::from_utf8_lossy(&bytes).trim().to_string();
            let message = if original.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            } else {
                original
            };
            json!({ "code": status_to_code(status), "message": message })
        }
    };

    if let (Some(id), Value::Object(map)) = (request_id, &mut body) {
        map.entry("request_id").or_insert(Value::String(id));
    }

    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/json"),
    );
    Response::from_parts(parts, Body::from(body.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, middleware, routing::get};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                AppError::Validation {
                    field: "page".to_string(),
                    reason: "page must be at least 1".to_string(),
                },
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
            ),
            (AppError::bad_request("Unknown field"), StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            (AppError::unauthorized("Missing bearer token"), StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            (
                AppError::Forbidden {
                    message: "Missing required scope(s): a::list".to_string(),
                },
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
            ),
            (
                AppError::NotFound {
                    entity: "product".to_string(),
                    field: "id".to_string(),
                    value: "9".to_string(),
                },
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
            ),
            (
                AppError::Cancelled {
                    operation: "find products".to_string(),
                },
                StatusCode::REQUEST_TIMEOUT,
                "REQUEST_CANCELLED",
            ),
            (
                AppError::ConnectionPool {
                    source: anyhow::anyhow!("Pool exhausted"),
                },
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
            ),
            (
                AppError::Internal {
                    source: anyhow::anyhow!("Unexpected error"),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
            ),
        ];

        for (error, status, code) in cases {
            assert_eq!(error_to_status_code(&error), status, "{:?}", error);
            assert_eq!(error_to_code(&error), code);
        }
    }

    #[tokio::test]
    async fn test_database_error_sanitization() {
        let error = AppError::Database {
            operation: "find products".to_string(),
            source: anyhow::anyhow!("password authentication failed for user depot"),
        };

        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["code"], "DATABASE_ERROR");
        assert!(!body.to_string().contains("password"));
    }

    #[tokio::test]
    async fn test_unauthorized_sets_challenge_header() {
        let response = AppError::unauthorized("Token has expired").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
    }

    fn app() -> Router {
        Router::new()
            .route(
                "/fails",
                get(|| async { AppError::bad_request("Unknown query parameter 'foo'") }),
            )
            .route("/plain", get(|| async { (StatusCode::BAD_REQUEST, "nope") }))
            .route("/ok", get(|| async { "fine" }))
            .layer(middleware::from_fn(global_error_handler))
            .layer(middleware::from_fn(crate::api::middleware::request_id_middleware))
    }

    fn get_request(uri: &str) -> Request {
        Request::builder()
            .uri(uri)
            .header("x-request-id", "req-42")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_app_error_gets_request_id() {
        let response = app().oneshot(get_request("/fails")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["code"], "BAD_REQUEST");
        assert_eq!(body["message"], "Unknown query parameter 'foo'");
        assert_eq!(body["request_id"], "req-42");
    }

    #[tokio::test]
    async fn test_plain_text_error_is_wrapped() {
        let response = app().oneshot(get_request("/plain")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["code"], "BAD_REQUEST");
        assert_eq!(body["message"], "nope");
    }

    #[tokio::test]
    async fn test_unknown_route_is_wrapped() {
        let response = app().oneshot(get_request("/missing")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["code"], "NOT_FOUND");
        assert_eq!(body["message"], "Not Found");
        assert_eq!(body["request_id"], "req-42");
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let response = app().oneshot(get_request("/ok")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"fine");
    }
}
