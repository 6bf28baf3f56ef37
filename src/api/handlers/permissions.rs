//! Permission catalog endpoint.

use axum::{Json, extract::State};
use utoipa_axum::routes;

use crate::api::doc::PERMISSION_TAG;
use crate::api::dto::DataResponse;
use crate::auth::{PermissionEntry, ScopedRouter};
use crate::state::AppState;

/// - `GET /permissions` - every scope a token may carry, public
pub fn permission_routes(router: ScopedRouter<AppState>) -> ScopedRouter<AppState> {
    router.public(routes!(list_permissions))
}

/// List the permission catalog
///
/// Scopes are sorted; each carries a human-readable description.
#[utoipa::path(
    get,
    path = "/permissions",
    tag = PERMISSION_TAG,
    responses(
        (status = 200, description = "All known scopes", body = DataResponse<Vec<PermissionEntry>>)
    )
)]
async fn list_permissions(State(state): State<AppState>) -> Json<DataResponse<Vec<PermissionEntry>>> {
    Json(DataResponse::new(state.permissions.entries()))
}
