//! Product catalog endpoints.

use std::sync::LazyLock;

use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::Value;
use utoipa_axum::routes;

use crate::api::doc::PRODUCT_TAG;
use crate::api::dto::{DataResponse, ErrorResponse, PagedResponse, ProductRecord};
use crate::api::middleware::RequestCancellation;
use crate::auth::{ScopeRegistrationError, ScopedRouter};
use crate::error::AppResult;
use crate::query::{ListOptions, ListQuery, QueryParams};
use crate::state::AppState;

/// Products filter by price band, activity and supplier, and search by
/// SKU, name or the supplier's name.
static PRODUCT_LIST: LazyLock<ListOptions> = LazyLock::new(|| {
    ListOptions::new()
        .orderable(["id", "sku", "name", "unitPrice", "createdAt", "supplier.name"])
        .filterable(["id", "active", "unitPrice", "supplierId", "createdAt", "supplier.country"])
        .searchable(["sku", "name", "description", "supplier.name"])
});

const PRODUCT_RELATIONS: &[&str] = &["supplier", "creator"];

/// Routes:
/// - GET /products      - List products (`products::list`)
/// - GET /products/{id} - Get product by ID (`products::get`)
pub fn product_routes(
    router: ScopedRouter<AppState>,
) -> Result<ScopedRouter<AppState>, ScopeRegistrationError> {
    router
        .protected(PRODUCT_LIST.document(routes!(list_products)), &["products::list"])?
        .protected(routes!(get_product), &["products::get"])
}

/// List products
#[utoipa::path(
    get,
    path = "/products",
    tag = PRODUCT_TAG,
    responses(
        (status = 200, description = "One page of products", body = PagedResponse<ProductRecord>),
        (status = 400, description = "Unknown or malformed query parameter", body = ErrorResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse),
        (status = 403, description = "Token lacks the required scope", body = ErrorResponse)
    )
)]
async fn list_products(
    State(state): State<AppState>,
    RequestCancellation(cancel): RequestCancellation,
    params: QueryParams,
) -> AppResult<Json<PagedResponse<Value>>> {
    let query = ListQuery::new(&PRODUCT_LIST, &params).with_relations(PRODUCT_RELATIONS);
    let page = state.services.products.list(query, &cancel).await?;
    Ok(Json(page.into()))
}

/// Get product by ID
#[utoipa::path(
    get,
    path = "/products/{id}",
    tag = PRODUCT_TAG,
    params(("id" = i64, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product found", body = DataResponse<ProductRecord>),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse),
        (status = 403, description = "Token lacks the required scope", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse)
    )
)]
async fn get_product(
    State(state): State<AppState>,
    RequestCancellation(cancel): RequestCancellation,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<Value>>> {
    let record = state
        .services
        .products
        .get(&id, None, PRODUCT_RELATIONS, &cancel)
        .await?;
    Ok(Json(DataResponse::new(record)))
}
