//! Customer endpoints.

use std::sync::LazyLock;

use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::Value;
use utoipa_axum::routes;

use crate::api::doc::CUSTOMER_TAG;
use crate::api::dto::{CustomerRecord, DataResponse, ErrorResponse, PagedResponse};
use crate::api::middleware::RequestCancellation;
use crate::auth::{ScopeRegistrationError, ScopedRouter};
use crate::error::AppResult;
use crate::query::{ListOptions, ListQuery, QueryParams};
use crate::state::AppState;

static CUSTOMER_LIST: LazyLock<ListOptions> = LazyLock::new(|| {
    ListOptions::new()
        .orderable(["id", "name", "email", "customerType", "createdAt", "creator.lastName"])
        .filterable(["id", "customerType", "createdById", "createdAt", "updatedAt"])
        .searchable(["name", "email", "companyName", "taxNumber", "creator.lastName"])
});

const CUSTOMER_RELATIONS: &[&str] = &["creator"];

/// Routes:
/// - GET /customers      - List customers (`customers::list`)
/// - GET /customers/{id} - Get customer by ID (`customers::get`)
pub fn customer_routes(
    router: ScopedRouter<AppState>,
) -> Result<ScopedRouter<AppState>, ScopeRegistrationError> {
    router
        .protected(CUSTOMER_LIST.document(routes!(list_customers)), &["customers::list"])?
        .protected(routes!(get_customer), &["customers::get"])
}

/// List customers
///
/// Paginated, with the creating user embedded as `creator`.
#[utoipa::path(
    get,
    path = "/customers",
    tag = CUSTOMER_TAG,
    responses(
        (status = 200, description = "One page of customers", body = PagedResponse<CustomerRecord>),
        (status = 400, description = "Unknown or malformed query parameter", body = ErrorResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse),
        (status = 403, description = "Token lacks the required scope", body = ErrorResponse)
    )
)]
async fn list_customers(
    State(state): State<AppState>,
    RequestCancellation(cancel): RequestCancellation,
    params: QueryParams,
) -> AppResult<Json<PagedResponse<Value>>> {
    let query = ListQuery::new(&CUSTOMER_LIST, &params).with_relations(CUSTOMER_RELATIONS);
    let page = state.services.customers.list(query, &cancel).await?;
    Ok(Json(page.into()))
}

/// Get customer by ID
#[utoipa::path(
    get,
    path = "/customers/{id}",
    tag = CUSTOMER_TAG,
    params(("id" = i64, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Customer found", body = DataResponse<CustomerRecord>),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse),
        (status = 403, description = "Token lacks the required scope", body = ErrorResponse),
        (status = 404, description = "Customer not found", body = ErrorResponse)
    )
)]
async fn get_customer(
    State(state): State<AppState>,
    RequestCancellation(cancel): RequestCancellation,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<Value>>> {
    let record = state
        .services
        .customers
        .get(&id, None, CUSTOMER_RELATIONS, &cancel)
        .await?;
    Ok(Json(DataResponse::new(record)))
}
