//! Supplier endpoints.

use std::sync::LazyLock;

use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::Value;
use utoipa_axum::routes;

use crate::api::doc::SUPPLIER_TAG;
use crate::api::dto::{DataResponse, ErrorResponse, PagedResponse, SupplierRecord};
use crate::api::middleware::RequestCancellation;
use crate::auth::{ScopeRegistrationError, ScopedRouter};
use crate::error::AppResult;
use crate::query::{ListOptions, ListQuery, QueryParams};
use crate::state::AppState;

static SUPPLIER_LIST: LazyLock<ListOptions> = LazyLock::new(|| {
    ListOptions::new()
        .orderable(["id", "name", "country", "createdAt"])
        .filterable(["id", "country", "createdById", "createdAt"])
        .searchable(["name", "contactEmail", "phone"])
});

const SUPPLIER_RELATIONS: &[&str] = &["creator"];

/// Routes:
/// - GET /suppliers      - List suppliers (`suppliers::list`)
/// - GET /suppliers/{id} - Get supplier by ID (`suppliers::get`)
pub fn supplier_routes(
    router: ScopedRouter<AppState>,
) -> Result<ScopedRouter<AppState>, ScopeRegistrationError> {
    router
        .protected(SUPPLIER_LIST.document(routes!(list_suppliers)), &["suppliers::list"])?
        .protected(routes!(get_supplier), &["suppliers::get"])
}

/// List suppliers
#[utoipa::path(
    get,
    path = "/suppliers",
    tag = SUPPLIER_TAG,
    responses(
        (status = 200, description = "One page of suppliers", body = PagedResponse<SupplierRecord>),
        (status = 400, description = "Unknown or malformed query parameter", body = ErrorResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse),
        (status = 403, description = "Token lacks the required scope", body = ErrorResponse)
    )
)]
async fn list_suppliers(
    State(state): State<AppState>,
    RequestCancellation(cancel): RequestCancellation,
    params: QueryParams,
) -> AppResult<Json<PagedResponse<Value>>> {
    let query = ListQuery::new(&SUPPLIER_LIST, &params).with_relations(SUPPLIER_RELATIONS);
    let page = state.services.suppliers.list(query, &cancel).await?;
    Ok(Json(page.into()))
}

/// Get supplier by ID
#[utoipa::path(
    get,
    path = "/suppliers/{id}",
    tag = SUPPLIER_TAG,
    params(("id" = i64, Path, description = "Supplier ID")),
    responses(
        (status = 200, description = "Supplier found", body = DataResponse<SupplierRecord>),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse),
        (status = 403, description = "Token lacks the required scope", body = ErrorResponse),
        (status = 404, description = "Supplier not found", body = ErrorResponse)
    )
)]
async fn get_supplier(
    State(state): State<AppState>,
    RequestCancellation(cancel): RequestCancellation,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<Value>>> {
    let record = state
        .services
        .suppliers
        .get(&id, None, SUPPLIER_RELATIONS, &cancel)
        .await?;
    Ok(Json(DataResponse::new(record)))
}
