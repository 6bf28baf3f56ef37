//! Response envelopes.
//!
//! List endpoints answer `{"data": [...], "meta": {"page", "pageSize", "total"}}`
//! and single-record endpoints `{"data": {...}, "meta": {}}`.

use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::query::Page;

/// Generic paged response wrapper.
#[derive(Debug, Serialize, ToSchema)]
pub struct PagedResponse<T> {
    /// The records of this page, at most `meta.pageSize`
    pub data: Vec<T>,

    /// Pagination metadata
    pub meta: PageMeta,
}

/// Pagination metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    /// Current page number (1-based)
    #[schema(example = 1)]
    pub page: u32,

    /// Effective page size after clamping
    #[schema(example = 10)]
    pub page_size: u32,

    /// Number of records matching the filter across all pages
    #[schema(example = 42)]
    pub total: u64,
}

impl<T> PagedResponse<T> {
    pub fn new(data: Vec<T>, page: u32, page_size: u32, total: u64) -> Self {
        Self {
            data,
            meta: PageMeta {
                page,
                page_size,
                total,
            },
        }
    }
}

impl From<Page<Value>> for PagedResponse<Value> {
    fn from(page: Page<Value>) -> Self {
        Self::new(page.records, page.page, page.page_size, page.total)
    }
}

/// Empty `meta` object of single-record responses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct EmptyMeta {}

/// Single-record response wrapper.
#[derive(Debug, Serialize, ToSchema)]
pub struct DataResponse<T> {
    pub data: T,
    pub meta: EmptyMeta,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            meta: EmptyMeta {},
        }
    }
}
