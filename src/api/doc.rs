use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::auth::weaver::BEARER_SCHEME;

pub const HEALTH_TAG: &str = "Health";
pub const PERMISSION_TAG: &str = "Permissions";
pub const CUSTOMER_TAG: &str = "Customers";
pub const SUPPLIER_TAG: &str = "Suppliers";
pub const PRODUCT_TAG: &str = "Products";
pub const WAREHOUSE_TAG: &str = "Warehouses";
pub const BIN_TAG: &str = "Bins";
pub const CYCLE_COUNT_TAG: &str = "Cycle counts";
pub const NOTIFICATION_TAG: &str = "Notifications";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Depot",
        description = "Read API for warehouse master data, stock counts and notifications",
    ),
    modifiers(&SecurityAddon),
    components(
        schemas(
            crate::api::dto::ErrorResponse,
            crate::api::dto::PageMeta,
            crate::api::dto::EmptyMeta,
        )
    ),
    tags(
        (name = HEALTH_TAG, description = "Health check endpoints"),
        (name = PERMISSION_TAG, description = "Permission scope catalog"),
        (name = CUSTOMER_TAG, description = "Customer records"),
        (name = SUPPLIER_TAG, description = "Supplier records"),
        (name = PRODUCT_TAG, description = "Product catalog"),
        (name = WAREHOUSE_TAG, description = "Warehouse sites"),
        (name = BIN_TAG, description = "Storage bins within warehouses"),
        (name = CYCLE_COUNT_TAG, description = "Stock counts per bin and product"),
        (name = NOTIFICATION_TAG, description = "Notifications of the calling user"),
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            BEARER_SCHEME,
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some("JWT bearer token carrying a space-delimited `scope` claim"))
                    .build(),
            ),
        )
    }
}
