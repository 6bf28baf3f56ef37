//! Warehouse endpoints.

use std::sync::LazyLock;

use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::Value;
use utoipa_axum::routes;

use crate::api::doc::WAREHOUSE_TAG;
use crate::api::dto::{DataResponse, ErrorResponse, PagedResponse, WarehouseRecord};
use crate::api::middleware::RequestCancellation;
use crate::auth::{ScopeRegistrationError, ScopedRouter};
use crate::error::AppResult;
use crate::query::{ListOptions, ListQuery, QueryParams};
use crate::state::AppState;

static WAREHOUSE_LIST: LazyLock<ListOptions> = LazyLock::new(|| {
    ListOptions::new()
        .orderable(["id", "code", "name", "city", "capacity"])
        .filterable(["id", "code", "city", "capacity", "createdById"])
        .searchable(["code", "name", "city"])
});

const WAREHOUSE_RELATIONS: &[&str] = &["creator"];

/// Routes:
/// - GET /warehouses      - List warehouses (`warehouses::list`)
/// - GET /warehouses/{id} - Get warehouse by ID (`warehouses::get`)
pub fn warehouse_routes(
    router: ScopedRouter<AppState>,
) -> Result<ScopedRouter<AppState>, ScopeRegistrationError> {
    router
        .protected(WAREHOUSE_LIST.document(routes!(list_warehouses)), &["warehouses::list"])?
        .protected(routes!(get_warehouse), &["warehouses::get"])
}

/// List warehouses
#[utoipa::path(
    get,
    path = "/warehouses",
    tag = WAREHOUSE_TAG,
    responses(
        (status = 200, description = "One page of warehouses", body = PagedResponse<WarehouseRecord>),
        (status = 400, description = "Unknown or malformed query parameter", body = ErrorResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse),
        (status = 403, description = "Token lacks the required scope", body = ErrorResponse)
    )
)]
async fn list_warehouses(
    State(state): State<AppState>,
    RequestCancellation(cancel): RequestCancellation,
    params: QueryParams,
) -> AppResult<Json<PagedResponse<Value>>> {
    let query = ListQuery::new(&WAREHOUSE_LIST, &params).with_relations(WAREHOUSE_RELATIONS);
    let page = state.services.warehouses.list(query, &cancel).await?;
    Ok(Json(page.into()))
}

/// Get warehouse by ID
#[utoipa::path(
    get,
    path = "/warehouses/{id}",
    tag = WAREHOUSE_TAG,
    params(("id" = i64, Path, description = "Warehouse ID")),
    responses(
        (status = 200, description = "Warehouse found", body = DataResponse<WarehouseRecord>),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse),
        (status = 403, description = "Token lacks the required scope", body = ErrorResponse),
        (status = 404, description = "Warehouse not found", body = ErrorResponse)
    )
)]
async fn get_warehouse(
    State(state): State<AppState>,
    RequestCancellation(cancel): RequestCancellation,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<Value>>> {
    let record = state
        .services
        .warehouses
        .get(&id, None, WAREHOUSE_RELATIONS, &cancel)
        .await?;
    Ok(Json(DataResponse::new(record)))
}
