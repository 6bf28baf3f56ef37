//! End-to-end tests of the HTTP surface over in-memory accessors.
//!
//! The router is the production one; only the accessors are swapped. The
//! pool is lazy and never connects, so nothing here needs PostgreSQL.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use depot_rs::AppState;
use depot_rs::api::routes::create_router;
use depot_rs::auth::{AuthContext, JwtVerifier, PermissionRegistry};
use depot_rs::config::DatabaseConfig;
use depot_rs::db::lazy_pool;
use depot_rs::query::{DataAccessor, MemoryAccessor, PageLimits};
use depot_rs::repositories::Repositories;
use depot_rs::utils::jwt::issue_access_token;

const SECRET: &str = "integration-test-secret-0123456789abcdef";
const ISSUER: &str = "depot";

fn accessor(resource: &str, records: Vec<Value>) -> Arc<dyn DataAccessor> {
    Arc::new(MemoryAccessor::new(resource, "id", records))
}

fn customers() -> Vec<Value> {
    let creator = json!({"id": 1, "firstName": "Ada", "lastName": "Lovelace"});
    [
        (1, "Test Kitchen GmbH"),
        (2, "Northwind"),
        (3, "Contest Supplies"),
        (4, "Acme"),
        (5, "testbed labs"),
    ]
    .into_iter()
    .map(|(id, name)| {
        json!({
            "id": id,
            "name": name,
            "customerType": "company",
            "createdById": 1,
            "creator": creator,
        })
    })
    .collect()
}

fn notifications() -> Vec<Value> {
    vec![
        json!({"id": 1, "recipientId": 7, "title": "Cycle count due", "read": false}),
        json!({"id": 2, "recipientId": 8, "title": "Bin A-03 full", "read": false}),
        json!({"id": 3, "recipientId": 7, "title": "Stock adjusted", "read": true}),
    ]
}

fn app() -> Router {
    let repos = Repositories {
        customers: accessor("customers", customers()),
        suppliers: accessor("suppliers", vec![]),
        products: accessor("products", vec![]),
        warehouses: accessor("warehouses", vec![]),
        bins: accessor("bins", vec![]),
        cycle_counts: accessor("cycle-counts", vec![]),
        notifications: accessor("notifications", notifications()),
    };

    let database = DatabaseConfig {
        url: "postgres://depot@127.0.0.1:1/depot".to_string(),
        ..Default::default()
    };
    let registry = Arc::new(PermissionRegistry::load());
    let state = AppState::with_repositories(
        repos,
        lazy_pool(&database),
        PageLimits::default(),
        registry.clone(),
    );
    let auth = AuthContext::new(
        registry,
        Arc::new(JwtVerifier::new(SECRET, Some(ISSUER.to_string()))),
    );

    create_router(state, &auth).expect("every route scope is in the catalog")
}

fn token(subject: &str, scope: &str) -> String {
    issue_access_token(subject, scope, Some(ISSUER), SECRET, 1).unwrap()
}

async fn get(uri: &str, bearer: Option<&str>) -> (StatusCode, Value) {
    let mut request = Request::builder().uri(uri);
    if let Some(token) = bearer {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let response = app()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn like_filter_is_paginated_with_total() {
    let bearer = token("1", "customers::list");
    let (status, body) = get(
        "/api/customers?filter.name.like=test&pageSize=2&page=1",
        Some(&bearer),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["meta"], json!({"page": 1, "pageSize": 2, "total": 3}));
}

#[tokio::test]
async fn bracket_syntax_and_ordering() {
    let bearer = token("1", "customers::list");
    let (status, body) = get(
        "/api/customers?filter%5Bname%5D%5Blike%5D=test&orderBy=name&order=DESC",
        Some(&bearer),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|record| record["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["testbed labs", "Test Kitchen GmbH", "Contest Supplies"]);
}

#[tokio::test]
async fn page_size_is_clamped() {
    let bearer = token("1", "customers::list");
    let (status, body) = get("/api/customers?pageSize=5000", Some(&bearer)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["pageSize"], 100);
    assert_eq!(body["meta"]["total"], 5);
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let (status, body) = get("/api/customers", None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
    assert!(body["request_id"].is_string());
}

#[tokio::test]
async fn wrong_scope_is_forbidden() {
    let bearer = token("1", "customers::get");
    let (status, body) = get("/api/customers", Some(&bearer)).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
}

#[tokio::test]
async fn token_from_another_issuer_is_unauthorized() {
    let foreign = issue_access_token("1", "customers::list", Some("elsewhere"), SECRET, 1).unwrap();
    let (status, _) = get("/api/customers", Some(&foreign)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_parameter_is_a_bad_request() {
    let bearer = token("1", "customers::list");
    let (status, body) = get("/api/customers?filter.password=x", Some(&bearer)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn get_by_id_embeds_the_creator() {
    let bearer = token("1", "customers::get");
    let (status, body) = get("/api/customers/2", Some(&bearer)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Northwind");
    assert_eq!(body["data"]["creator"]["lastName"], "Lovelace");
    assert_eq!(body["meta"], json!({}));

    let (status, body) = get("/api/customers/99", Some(&bearer)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn notifications_are_scoped_to_the_caller() {
    let bearer = token("7", "notifications::list notifications::get");

    let (status, body) = get("/api/notifications", Some(&bearer)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 2);
    assert!(
        body["data"]
            .as_array()
            .unwrap()
            .iter()
            .all(|n| n["recipientId"] == 7)
    );

    let (status, _) = get("/api/notifications/1", Some(&bearer)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = get("/api/notifications/2", Some(&bearer)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn public_routes_need_no_token() {
    let (status, _) = get("/api/health/live", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get("/api/permissions", None).await;
    assert_eq!(status, StatusCode::OK);
    let scopes: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["scope"].as_str().unwrap())
        .collect();
    assert!(scopes.contains(&"cycle-counts::list"));
    assert!(scopes.contains(&"notifications::get"));
}

#[tokio::test]
async fn openapi_document_is_served() {
    let (status, body) = get("/api-docs/openapi.json", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/bins"]["get"]["security"].is_array());
    assert!(body["components"]["securitySchemes"].is_object());
}
