//! Data Transfer Objects for API requests and responses.
//!
//! - `pagination` - the `{data, meta}` envelopes
//! - `records` - documented shapes of the served records
//! - `health` - health check responses
//! - `error` - common error response

mod error;
mod health;
mod pagination;
mod records;

pub use error::ErrorResponse;
pub use health::{ComponentHealth, HealthResponse, HealthStatus};
pub use pagination::{DataResponse, EmptyMeta, PageMeta, PagedResponse};
pub use records::{
    BinRecord, CustomerRecord, CycleCountRecord, NotificationRecord, ProductRecord,
    SupplierRecord, SupplierSummary, UserSummary, WarehouseRecord,
};
