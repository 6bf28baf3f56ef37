//! Record shapes served by the resource endpoints.
//!
//! Handlers pass records through as JSON produced by the data accessor; these
//! types only describe that JSON in the OpenAPI document. Relations are
//! present when the endpoint embeds them and `null` when the foreign key is.

use serde::Serialize;
use utoipa::ToSchema;

/// Embedded user (record creator or counter)
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    #[schema(example = 3)]
    pub id: i64,
    #[schema(example = "Ada")]
    pub first_name: String,
    #[schema(example = "Lovelace")]
    pub last_name: String,
    #[schema(example = "ada@depot.example")]
    pub email: String,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRecord {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "Northwind Traders")]
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// `individual` or `company`
    #[schema(example = "company")]
    pub customer_type: String,
    pub company_name: Option<String>,
    pub tax_number: Option<String>,
    pub created_by_id: Option<i64>,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: String,
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: String,
    pub creator: Option<UserSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplierRecord {
    #[schema(example = 4)]
    pub id: i64,
    #[schema(example = "Acme Fasteners")]
    pub name: String,
    pub contact_email: Option<String>,
    pub phone: Option<String>,
    #[schema(example = "DE")]
    pub country: Option<String>,
    pub created_by_id: Option<i64>,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: String,
    pub creator: Option<UserSummary>,
}

/// Supplier as embedded in a product
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplierSummary {
    pub id: i64,
    pub name: String,
    pub country: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    #[schema(example = 12)]
    pub id: i64,
    #[schema(example = "BOLT-M8-40")]
    pub sku: String,
    #[schema(example = "Hex bolt M8x40")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = 0.35)]
    pub unit_price: f64,
    pub active: bool,
    pub supplier_id: Option<i64>,
    pub created_by_id: Option<i64>,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: String,
    pub supplier: Option<SupplierSummary>,
    pub creator: Option<UserSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseRecord {
    #[schema(example = 2)]
    pub id: i64,
    #[schema(example = "HAM-01")]
    pub code: String,
    #[schema(example = "Hamburg North")]
    pub name: String,
    pub city: Option<String>,
    #[schema(example = 1200)]
    pub capacity: i64,
    pub created_by_id: Option<i64>,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: String,
    pub creator: Option<UserSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BinRecord {
    #[schema(example = 40)]
    pub id: i64,
    #[schema(example = "A-03-2")]
    pub code: String,
    #[schema(example = "A")]
    pub zone: Option<String>,
    pub capacity: i64,
    pub warehouse_id: i64,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: String,
    pub warehouse: Option<WarehouseRecord>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CycleCountRecord {
    pub id: i64,
    #[schema(value_type = String, format = Uuid)]
    pub reference: String,
    pub bin_id: i64,
    pub product_id: i64,
    pub counted_by_id: Option<i64>,
    pub expected_quantity: i64,
    pub counted_quantity: Option<i64>,
    /// `open`, `counted` or `reconciled`
    #[schema(example = "counted")]
    pub status: String,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub counted_at: Option<String>,
    pub bin: Option<BinRecord>,
    pub product: Option<ProductRecord>,
    pub counter: Option<UserSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub id: i64,
    pub recipient_id: i64,
    #[schema(example = "Cycle count due")]
    pub title: String,
    pub body: Option<String>,
    pub read: bool,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: String,
}
