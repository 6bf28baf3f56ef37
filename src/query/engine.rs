//! Pagination query engine.

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::PaginationConfig;
use crate::error::AppResult;
use crate::query::accessor::{DataAccessor, FieldTree, FindOptions};
use crate::query::descriptor::ListOptions;
use crate::query::filter::{FilterExpr, compile_filter};
use crate::query::merge::merge_predicates;
use crate::query::order::{OrderTree, SortDirection, compile_order};
use crate::query::params::QueryParams;

/// Page size bounds applied to every list request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

impl From<&PaginationConfig> for PageLimits {
    fn from(config: &PaginationConfig) -> Self {
        Self {
            default_page_size: config.default_page_size,
            max_page_size: config.max_page_size,
        }
    }
}

/// One page of records plus the full match count.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub records: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
}

/// Everything the engine needs for one list call.
#[derive(Debug, Clone)]
pub struct ListQuery<'a> {
    pub options: &'a ListOptions,
    pub params: &'a QueryParams,
    /// Server-side filter merged over the caller's; it wins on conflicts.
    pub constraint: Option<FilterExpr>,
    pub relations: &'a [&'a str],
    pub select: Option<FieldTree>,
}

impl<'a> ListQuery<'a> {
    pub fn new(options: &'a ListOptions, params: &'a QueryParams) -> Self {
        Self {
            options,
            params,
            constraint: None,
            relations: &[],
            select: None,
        }
    }

    pub fn with_constraint(mut self, constraint: FilterExpr) -> Self {
        self.constraint = Some(constraint);
        self
    }

    pub fn with_relations(mut self, relations: &'a [&'a str]) -> Self {
        self.relations = relations;
        self
    }

    pub fn with_select(mut self, select: FieldTree) -> Self {
        self.select = Some(select);
        self
    }
}

/// Runs list requests against a [`DataAccessor`].
///
/// Stateless apart from its limits; one instance is shared by all services.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaginationEngine {
    limits: PageLimits,
}

impl PaginationEngine {
    pub fn new(limits: PageLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> PageLimits {
        self.limits
    }

    /// Parse, compile and execute one list request.
    ///
    /// Accessor errors are returned as they are; nothing is retried.
    pub async fn paginate<A>(
        &self,
        accessor: &A,
        query: ListQuery<'_>,
        cancel: &CancellationToken,
    ) -> AppResult<Page<Value>>
    where
        A: DataAccessor + ?Sized,
    {
        let request = query.options.parse(
            query.params,
            self.limits.default_page_size,
            self.limits.max_page_size,
        )?;

        let constraint = query.constraint.as_ref().map(compile_filter).transpose()?;
        let filter = merge_predicates([Some(compile_filter(&request.filter)?), constraint]);

        let order = match (request.order_by.as_deref(), request.order) {
            (Some(path), Some(direction)) => compile_order(path, direction.as_str())?,
            _ => OrderTree::by(accessor.primary_key(), SortDirection::Asc),
        };

        let options = FindOptions {
            filter,
            order,
            skip: request.page.offset(),
            take: u64::from(request.page.page_size),
            relations: FieldTree::from_paths(query.relations.iter().copied()),
            select: query.select,
        };

        let result = accessor.find_and_count(&options, cancel).await?;

        debug!(
            resource = %accessor.resource(),
            page = request.page.page,
            page_size = request.page.page_size,
            returned = result.records.len(),
            total = result.total,
            "List query executed"
        );

        Ok(Page {
            records: result.records,
            page: request.page.page,
            page_size: request.page.page_size,
            total: result.total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::query::filter::{Condition, PredicateNode};
    use crate::query::memory::MemoryAccessor;
    use async_trait::async_trait;
    use proptest::prelude::*;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records what it was asked and answers with a fixed result.
    struct Recording {
        seen: Mutex<Option<FindOptions>>,
        fail: bool,
    }

    impl Recording {
        fn new() -> Self {
            Self {
                seen: Mutex::new(None),
                fail: false,
            }
        }

        fn seen(&self) -> FindOptions {
            self.seen.lock().unwrap().clone().unwrap()
        }
    }

    #[async_trait]
    impl DataAccessor for Recording {
        fn resource(&self) -> &str {
            "products"
        }

        fn primary_key(&self) -> &str {
            "id"
        }

        async fn find_and_count(
            &self,
            options: &FindOptions,
            _cancel: &CancellationToken,
        ) -> AppResult<crate::query::FindResult> {
            *self.seen.lock().unwrap() = Some(options.clone());
            if self.fail {
                return Err(AppError::Database {
                    operation: "find products".into(),
                    source: anyhow::anyhow!("connection reset"),
                });
            }
            Ok(crate::query::FindResult {
                records: vec![],
                total: 0,
            })
        }
    }

    fn options() -> ListOptions {
        ListOptions::new()
            .orderable(["id", "name", "creator.firstName"])
            .filterable(["name", "ownerId"])
            .searchable(["name"])
    }

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        QueryParams::from_pairs(pairs.iter().copied())
    }

    #[tokio::test]
    async fn test_defaults_to_primary_key_ascending() {
        let accessor = Recording::new();
        let options = options();
        let params = params(&[]);

        let page = PaginationEngine::default()
            .paginate(&accessor, ListQuery::new(&options, &params), &CancellationToken::new())
            .await
            .unwrap();

        let seen = accessor.seen();
        assert_eq!(seen.order, OrderTree::ascending_by("id"));
        assert_eq!(seen.skip, 0);
        assert_eq!(seen.take, 10);
        assert_eq!((page.page, page.page_size), (1, 10));
    }

    #[tokio::test]
    async fn test_order_needs_both_parameters() {
        let accessor = Recording::new();
        let options = options();

        let only_field = params(&[("orderBy", "name")]);
        PaginationEngine::default()
            .paginate(&accessor, ListQuery::new(&options, &only_field), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(accessor.seen().order, OrderTree::ascending_by("id"));

        let both = params(&[("orderBy", "creator.firstName"), ("order", "DESC")]);
        PaginationEngine::default()
            .paginate(&accessor, ListQuery::new(&options, &both), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(
            serde_json::to_value(accessor.seen().order).unwrap(),
            json!({"creator": {"firstName": "desc"}})
        );
    }

    #[tokio::test]
    async fn test_constraint_overrides_caller_filter() {
        let accessor = Recording::new();
        let options = options();
        let params = params(&[("filter.ownerId", "7"), ("page", "3"), ("pageSize", "20")]);

        PaginationEngine::default()
            .paginate(
                &accessor,
                ListQuery::new(&options, &params).with_constraint(FilterExpr::new().eq("ownerId", "42")),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        let seen = accessor.seen();
        assert_eq!(
            seen.filter.get("ownerId"),
            Some(&PredicateNode::Leaf(Condition::Equals(json!("42"))))
        );
        assert_eq!(seen.skip, 40);
        assert_eq!(seen.take, 20);
    }

    #[tokio::test]
    async fn test_relations_are_forwarded() {
        let accessor = Recording::new();
        let options = options();
        let params = params(&[]);

        PaginationEngine::default()
            .paginate(
                &accessor,
                ListQuery::new(&options, &params).with_relations(&["creator", "supplier"]),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(accessor.seen().relations, FieldTree::from_paths(["creator", "supplier"]));
    }

    #[tokio::test]
    async fn test_rejects_before_touching_the_accessor() {
        let accessor = Recording::new();
        let options = options();
        let params = params(&[("filter.secret", "x")]);

        let err = PaginationEngine::default()
            .paginate(&accessor, ListQuery::new(&options, &params), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "filter.secret"));
        assert!(accessor.seen.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_accessor_failure_propagates() {
        let accessor = Recording {
            seen: Mutex::new(None),
            fail: true,
        };
        let options = options();
        let params = params(&[]);

        let err = PaginationEngine::default()
            .paginate(&accessor, ListQuery::new(&options, &params), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Database { .. }));
    }

    #[tokio::test]
    async fn test_substring_search_end_to_end() {
        let records = vec![
            json!({"id": 1, "name": "test alpha"}),
            json!({"id": 2, "name": "beta"}),
            json!({"id": 3, "name": "gamma test"}),
            json!({"id": 4, "name": "delta"}),
            json!({"id": 5, "name": "contest"}),
        ];
        let accessor = MemoryAccessor::new("items", "id", records);
        let options = ListOptions::new()
            .orderable(["id", "name"])
            .filterable(["name"])
            .searchable(["name"]);
        let params = params(&[("filter.name.like", "test"), ("pageSize", "2"), ("page", "1")]);

        let page = PaginationEngine::default()
            .paginate(&accessor, ListQuery::new(&options, &params), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(page.total, 3);
        assert_eq!((page.page, page.page_size), (1, 2));
        assert_eq!(page.records.len(), 2);
        for record in &page.records {
            assert!(record["name"].as_str().unwrap().contains("test"));
        }
    }

    #[tokio::test]
    async fn test_cancelled_request_stops() {
        let accessor = MemoryAccessor::new("items", "id", vec![json!({"id": 1})]);
        let options = options();
        let params = params(&[]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = PaginationEngine::default()
            .paginate(&accessor, ListQuery::new(&options, &params), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Cancelled { .. }));
    }

    proptest! {
        #[test]
        fn property_page_length_and_total(
            size in 0usize..60,
            matching_every in 1usize..4,
            page in 1u32..12,
            page_size in 1u32..15,
        ) {
            let records: Vec<Value> = (0..size)
                .map(|i| {
                    let kind = if i % matching_every == 0 { "keep" } else { "skip" };
                    json!({"id": i, "kind": kind})
                })
                .collect();
            let matching = records.iter().filter(|r| r["kind"] == "keep").count();
            let accessor = MemoryAccessor::new("items", "id", records);
            let options = ListOptions::new().filterable(["kind"]);
            let params = QueryParams::from_pairs([
                ("filter.kind", "keep".to_string()),
                ("page", page.to_string()),
                ("pageSize", page_size.to_string()),
            ]);

            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let result = runtime
                .block_on(PaginationEngine::default().paginate(
                    &accessor,
                    ListQuery::new(&options, &params),
                    &CancellationToken::new(),
                ))
                .unwrap();

            let skipped = (page as usize - 1) * page_size as usize;
            let expected = (page_size as usize).min(matching.saturating_sub(skipped));
            prop_assert_eq!(result.total, matching as u64);
            prop_assert_eq!(result.records.len(), expected);
        }
    }
}
