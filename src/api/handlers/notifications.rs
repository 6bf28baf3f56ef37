//! Notification endpoints.
//!
//! Callers only ever see their own notifications: the recipient constraint
//! is merged over whatever filter the query string asks for.

use std::sync::LazyLock;

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde_json::Value;
use utoipa_axum::routes;

use crate::api::doc::NOTIFICATION_TAG;
use crate::api::dto::{DataResponse, ErrorResponse, NotificationRecord, PagedResponse};
use crate::api::middleware::RequestCancellation;
use crate::auth::{Credential, ScopeRegistrationError, ScopedRouter};
use crate::error::AppResult;
use crate::query::{FilterExpr, ListOptions, ListQuery, QueryParams};
use crate::state::AppState;

static NOTIFICATION_LIST: LazyLock<ListOptions> = LazyLock::new(|| {
    ListOptions::new()
        .orderable(["id", "createdAt", "read"])
        .filterable(["read", "createdAt"])
        .searchable(["title", "body"])
});

fn own_notifications(credential: &Credential) -> FilterExpr {
    FilterExpr::new().eq("recipientId", credential.subject_id.clone())
}

/// Routes:
/// - GET /notifications      - List own notifications (`notifications::list`)
/// - GET /notifications/{id} - Get own notification by ID (`notifications::get`)
pub fn notification_routes(
    router: ScopedRouter<AppState>,
) -> Result<ScopedRouter<AppState>, ScopeRegistrationError> {
    router
        .protected(
            NOTIFICATION_LIST.document(routes!(list_notifications)),
            &["notifications::list"],
        )?
        .protected(routes!(get_notification), &["notifications::get"])
}

/// List own notifications
#[utoipa::path(
    get,
    path = "/notifications",
    tag = NOTIFICATION_TAG,
    responses(
        (status = 200, description = "One page of the caller's notifications", body = PagedResponse<NotificationRecord>),
        (status = 400, description = "Unknown or malformed query parameter", body = ErrorResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse),
        (status = 403, description = "Token lacks the required scope", body = ErrorResponse)
    )
)]
async fn list_notifications(
    State(state): State<AppState>,
    Extension(credential): Extension<Credential>,
    RequestCancellation(cancel): RequestCancellation,
    params: QueryParams,
) -> AppResult<Json<PagedResponse<Value>>> {
    let query =
        ListQuery::new(&NOTIFICATION_LIST, &params).with_constraint(own_notifications(&credential));
    let page = state.services.notifications.list(query, &cancel).await?;
    Ok(Json(page.into()))
}

/// Get own notification by ID
///
/// Another user's notification answers 404, same as a missing one.
#[utoipa::path(
    get,
    path = "/notifications/{id}",
    tag = NOTIFICATION_TAG,
    params(("id" = i64, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification found", body = DataResponse<NotificationRecord>),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse),
        (status = 403, description = "Token lacks the required scope", body = ErrorResponse),
        (status = 404, description = "Notification not found", body = ErrorResponse)
    )
)]
async fn get_notification(
    State(state): State<AppState>,
    Extension(credential): Extension<Credential>,
    RequestCancellation(cancel): RequestCancellation,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<Value>>> {
    let record = state
        .services
        .notifications
        .get(&id, Some(own_notifications(&credential)), &[], &cancel)
        .await?;
    Ok(Json(DataResponse::new(record)))
}
