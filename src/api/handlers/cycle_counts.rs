//! Cycle count endpoints.

use std::sync::LazyLock;

use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::Value;
use utoipa_axum::routes;

use crate::api::doc::CYCLE_COUNT_TAG;
use crate::api::dto::{CycleCountRecord, DataResponse, ErrorResponse, PagedResponse};
use crate::api::middleware::RequestCancellation;
use crate::auth::{ScopeRegistrationError, ScopedRouter};
use crate::error::AppResult;
use crate::query::{ListOptions, ListQuery, QueryParams};
use crate::state::AppState;

static CYCLE_COUNT_LIST: LazyLock<ListOptions> = LazyLock::new(|| {
    ListOptions::new()
        .orderable(["id", "countedAt", "status", "bin.code", "product.sku", "counter.lastName"])
        .filterable([
            "id",
            "reference",
            "status",
            "binId",
            "productId",
            "countedById",
            "countedAt",
            "countedQuantity",
            "bin.warehouseId",
        ])
        .searchable(["product.name", "product.sku", "bin.code", "counter.lastName"])
});

const CYCLE_COUNT_RELATIONS: &[&str] = &["bin", "product", "counter"];

/// Routes:
/// - GET /cycle-counts      - List cycle counts (`cycle-counts::list`)
/// - GET /cycle-counts/{id} - Get cycle count by ID (`cycle-counts::get`)
pub fn cycle_count_routes(
    router: ScopedRouter<AppState>,
) -> Result<ScopedRouter<AppState>, ScopeRegistrationError> {
    router
        .protected(
            CYCLE_COUNT_LIST.document(routes!(list_cycle_counts)),
            &["cycle-counts::list"],
        )?
        .protected(routes!(get_cycle_count), &["cycle-counts::get"])
}

/// List cycle counts
///
/// Each count embeds its bin, product and the counting user.
#[utoipa::path(
    get,
    path = "/cycle-counts",
    tag = CYCLE_COUNT_TAG,
    responses(
        (status = 200, description = "One page of cycle counts", body = PagedResponse<CycleCountRecord>),
        (status = 400, description = "Unknown or malformed query parameter", body = ErrorResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse),
        (status = 403, description = "Token lacks the required scope", body = ErrorResponse)
    )
)]
async fn list_cycle_counts(
    State(state): State<AppState>,
    RequestCancellation(cancel): RequestCancellation,
    params: QueryParams,
) -> AppResult<Json<PagedResponse<Value>>> {
    let query = ListQuery::new(&CYCLE_COUNT_LIST, &params).with_relations(CYCLE_COUNT_RELATIONS);
    let page = state.services.cycle_counts.list(query, &cancel).await?;
    Ok(Json(page.into()))
}

/// Get cycle count by ID
#[utoipa::path(
    get,
    path = "/cycle-counts/{id}",
    tag = CYCLE_COUNT_TAG,
    params(("id" = i64, Path, description = "Cycle count ID")),
    responses(
        (status = 200, description = "Cycle count found", body = DataResponse<CycleCountRecord>),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse),
        (status = 403, description = "Token lacks the required scope", body = ErrorResponse),
        (status = 404, description = "Cycle count not found", body = ErrorResponse)
    )
)]
async fn get_cycle_count(
    State(state): State<AppState>,
    RequestCancellation(cancel): RequestCancellation,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<Value>>> {
    let record = state
        .services
        .cycle_counts
        .get(&id, None, CYCLE_COUNT_RELATIONS, &cancel)
        .await?;
    Ok(Json(DataResponse::new(record)))
}
