//! Storage bin endpoints.

use std::sync::LazyLock;

use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::Value;
use utoipa_axum::routes;

use crate::api::doc::BIN_TAG;
use crate::api::dto::{BinRecord, DataResponse, ErrorResponse, PagedResponse};
use crate::api::middleware::RequestCancellation;
use crate::auth::{ScopeRegistrationError, ScopedRouter};
use crate::error::AppResult;
use crate::query::{ListOptions, ListQuery, QueryParams};
use crate::state::AppState;

static BIN_LIST: LazyLock<ListOptions> = LazyLock::new(|| {
    ListOptions::new()
        .orderable(["id", "code", "zone", "capacity", "warehouse.code"])
        .filterable(["id", "zone", "capacity", "warehouseId", "warehouse.code"])
        .searchable(["code", "warehouse.name"])
});

const BIN_RELATIONS: &[&str] = &["warehouse"];

/// Routes:
/// - GET /bins      - List bins (`bins::list`)
/// - GET /bins/{id} - Get bin by ID (`bins::get`)
pub fn bin_routes(
    router: ScopedRouter<AppState>,
) -> Result<ScopedRouter<AppState>, ScopeRegistrationError> {
    router
        .protected(BIN_LIST.document(routes!(list_bins)), &["bins::list"])?
        .protected(routes!(get_bin), &["bins::get"])
}

/// List storage bins
///
/// Each bin embeds its warehouse.
#[utoipa::path(
    get,
    path = "/bins",
    tag = BIN_TAG,
    responses(
        (status = 200, description = "One page of bins", body = PagedResponse<BinRecord>),
        (status = 400, description = "Unknown or malformed query parameter", body = ErrorResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse),
        (status = 403, description = "Token lacks the required scope", body = ErrorResponse)
    )
)]
async fn list_bins(
    State(state): State<AppState>,
    RequestCancellation(cancel): RequestCancellation,
    params: QueryParams,
) -> AppResult<Json<PagedResponse<Value>>> {
    let query = ListQuery::new(&BIN_LIST, &params).with_relations(BIN_RELATIONS);
    let page = state.services.bins.list(query, &cancel).await?;
    Ok(Json(page.into()))
}

/// Get bin by ID
#[utoipa::path(
    get,
    path = "/bins/{id}",
    tag = BIN_TAG,
    params(("id" = i64, Path, description = "Bin ID")),
    responses(
        (status = 200, description = "Bin found", body = DataResponse<BinRecord>),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse),
        (status = 403, description = "Token lacks the required scope", body = ErrorResponse),
        (status = 404, description = "Bin not found", body = ErrorResponse)
    )
)]
async fn get_bin(
    State(state): State<AppState>,
    RequestCancellation(cancel): RequestCancellation,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<Value>>> {
    let record = state
        .services
        .bins
        .get(&id, None, BIN_RELATIONS, &cancel)
        .await?;
    Ok(Json(DataResponse::new(record)))
}
