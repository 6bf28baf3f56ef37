//! List and lookup for one resource.

use std::sync::Arc;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, AppResult};
use crate::query::{
    DataAccessor, FieldTree, FilterExpr, FindOptions, ListQuery, OrderTree, Page, PaginationEngine,
    compile_filter, merge_predicates,
};

/// Resource service over a shared accessor.
///
/// Cloning is cheap; the accessor is behind an `Arc`.
#[derive(Clone)]
pub struct ResourceService {
    accessor: Arc<dyn DataAccessor>,
    engine: PaginationEngine,
    /// Singular entity name for `NotFound` errors
    entity: &'static str,
}

impl ResourceService {
    pub fn new(accessor: Arc<dyn DataAccessor>, engine: PaginationEngine, entity: &'static str) -> Self {
        Self {
            accessor,
            engine,
            entity,
        }
    }

    /// One page of records matching the request.
    pub async fn list(&self, query: ListQuery<'_>, cancel: &CancellationToken) -> AppResult<Page<Value>> {
        self.engine.paginate(self.accessor.as_ref(), query, cancel).await
    }

    /// A single record by primary key.
    ///
    /// `constraint` is merged over the key lookup, so a record outside it is
    /// reported as not found rather than forbidden.
    ///
    /// # Returns
    /// The record, or `NotFound` naming the entity and id
    pub async fn get(
        &self,
        id: &str,
        constraint: Option<FilterExpr>,
        relations: &[&str],
        cancel: &CancellationToken,
    ) -> AppResult<Value> {
        let key = self.accessor.primary_key().to_string();
        let by_key = compile_filter(&FilterExpr::new().eq(key.clone(), id))?;
        let constraint = constraint.as_ref().map(compile_filter).transpose()?;

        let options = FindOptions {
            filter: merge_predicates([Some(by_key), constraint]),
            order: OrderTree::ascending_by(key.clone()),
            skip: 0,
            take: 1,
            relations: FieldTree::from_paths(relations.iter().copied()),
            select: None,
        };

        self.accessor
            .find_and_count(&options, cancel)
            .await?
            .records
            .into_iter()
            .next()
            .ok_or(AppError::NotFound {
                entity: self.entity.to_string(),
                field: key,
                value: id.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{ListOptions, MemoryAccessor, QueryParams};
    use serde_json::json;

    fn service() -> ResourceService {
        let accessor = MemoryAccessor::new(
            "notifications",
            "id",
            vec![
                json!({"id": 1, "recipientId": 7, "title": "Stock low"}),
                json!({"id": 2, "recipientId": 8, "title": "Count due"}),
                json!({"id": 3, "recipientId": 7, "title": "Count due"}),
            ],
        );
        ResourceService::new(Arc::new(accessor), PaginationEngine::default(), "notification")
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let record = service()
            .get("2", None, &[], &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(record["title"], "Count due");
    }

    #[tokio::test]
    async fn test_get_outside_constraint_is_not_found() {
        let err = service()
            .get(
                "2",
                Some(FilterExpr::new().eq("recipientId", "7")),
                &[],
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        match err {
            AppError::NotFound { entity, field, value } => {
                assert_eq!(entity, "notification");
                assert_eq!(field, "id");
                assert_eq!(value, "2");
            }
            other => panic!("Expected NotFound error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_list_applies_constraint() {
        let options = ListOptions::new().filterable(["title"]);
        let params = QueryParams::from_pairs([("filter.title", "Count due")]);

        let page = service()
            .list(
                ListQuery::new(&options, &params).with_constraint(FilterExpr::new().eq("recipientId", 7)),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(page.total, 1);
        assert_eq!(page.records[0]["id"], 3);
    }
}
