//! In-memory data accessor over JSON records.
//!
//! Nested objects stand in for loaded relations, so `{bin: {code: "A-01"}}`
//! matches a nested predicate on `bin.code`. Query-string values arrive as
//! strings, so comparisons are loose: `"5"` equals `5`, and ranges compare
//! numerically when both sides read as numbers.

use std::cmp::Ordering;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, AppResult};
use crate::query::accessor::{DataAccessor, FieldTree, FindOptions, FindResult};
use crate::query::filter::{Condition, Predicate, PredicateNode};
use crate::query::order::{OrderTree, SortDirection};

#[derive(Debug, Clone)]
pub struct MemoryAccessor {
    resource: String,
    primary_key: String,
    records: Vec<Value>,
    case_sensitive: bool,
}

impl MemoryAccessor {
    pub fn new(resource: impl Into<String>, primary_key: impl Into<String>, records: Vec<Value>) -> Self {
        Self {
            resource: resource.into(),
            primary_key: primary_key.into(),
            records,
            case_sensitive: false,
        }
    }

    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn matches(&self, record: &Value, predicate: &Predicate) -> bool {
        predicate.iter().all(|(key, node)| {
            let field = record.get(key).unwrap_or(&Value::Null);
            match node {
                PredicateNode::Leaf(condition) => self.satisfies(field, condition),
                PredicateNode::Nested(inner) => field.is_object() && self.matches(field, inner),
            }
        })
    }

    fn satisfies(&self, field: &Value, condition: &Condition) -> bool {
        match condition {
            Condition::Equals(Value::Null) => field.is_null(),
            Condition::Equals(expected) => compare_loose(field, expected) == Some(Ordering::Equal),
            Condition::Contains(needle) => match scalar_text(field) {
                Some(text) if self.case_sensitive => text.contains(needle.as_str()),
                Some(text) => text.to_lowercase().contains(&needle.to_lowercase()),
                None => false,
            },
            Condition::Range { min, max } => {
                if field.is_null() {
                    return false;
                }
                let above = min.as_ref().is_none_or(|min| {
                    matches!(compare_loose(field, min), Some(Ordering::Greater | Ordering::Equal))
                });
                let below = max.as_ref().is_none_or(|max| {
                    matches!(compare_loose(field, max), Some(Ordering::Less | Ordering::Equal))
                });
                above && below
            }
        }
    }

    /// Sort by the ordering tree, then by primary key.
    fn sort(&self, records: &mut [Value], order: &OrderTree) {
        let keys = order.flatten();
        records.sort_by(|a, b| {
            keys.iter()
                .map(|(path, direction)| {
                    compare_for_sort(resolve(a, path), resolve(b, path), *direction)
                })
                .find(|ordering| ordering.is_ne())
                .unwrap_or_else(|| {
                    let key = [self.primary_key.as_str()];
                    compare_for_sort(resolve(a, &key), resolve(b, &key), SortDirection::Asc)
                })
        });
    }
}

#[async_trait]
impl DataAccessor for MemoryAccessor {
    fn resource(&self) -> &str {
        &self.resource
    }

    fn primary_key(&self) -> &str {
        &self.primary_key
    }

    async fn find_and_count(
        &self,
        options: &FindOptions,
        cancel: &CancellationToken,
    ) -> AppResult<FindResult> {
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled {
                operation: format!("find {}", self.resource),
            });
        }

        let mut matching: Vec<Value> = self
            .records
            .iter()
            .filter(|record| self.matches(record, &options.filter))
            .cloned()
            .collect();
        let total = matching.len() as u64;

        self.sort(&mut matching, &options.order);

        let skip = usize::try_from(options.skip).unwrap_or(usize::MAX);
        let take = usize::try_from(options.take).unwrap_or(usize::MAX);
        let records = matching
            .into_iter()
            .skip(skip)
            .take(take)
            .map(|record| match &options.select {
                Some(select) => project(&record, select),
                None => record,
            })
            .collect();

        Ok(FindResult { records, total })
    }
}

fn resolve<'a>(record: &'a Value, path: &[&str]) -> &'a Value {
    path.iter()
        .try_fold(record, |current, segment| current.get(*segment))
        .unwrap_or(&Value::Null)
}

/// String form of a scalar; `None` for null, arrays and objects.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Numeric when both sides read as numbers, textual otherwise.
fn compare_loose(left: &Value, right: &Value) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (as_number(left), as_number(right)) {
        return a.partial_cmp(&b);
    }
    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => Some(scalar_text(left)?.cmp(&scalar_text(right)?)),
    }
}

/// Nulls sort last ascending and first descending.
fn compare_for_sort(left: &Value, right: &Value, direction: SortDirection) -> Ordering {
    let ordering = match (left.is_null(), right.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => compare_loose(left, right).unwrap_or(Ordering::Equal),
    };
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

fn project(record: &Value, select: &FieldTree) -> Value {
    let Value::Object(fields) = record else {
        return record.clone();
    };
    let projected: Map<String, Value> = select
        .iter()
        .filter_map(|(name, child)| {
            let value = fields.get(name)?;
            let value = match child {
                Some(child) if value.is_object() => project(value, child),
                _ => value.clone(),
            };
            Some((name.to_string(), value))
        })
        .collect();
    Value::Object(projected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::filter::{FilterExpr, OperatorSet, compile_filter};
    use crate::query::order::compile_order;
    use serde_json::json;

    fn fixture() -> MemoryAccessor {
        MemoryAccessor::new(
            "cycle_counts",
            "id",
            vec![
                json!({"id": 1, "quantity": 4, "note": "Recount Needed", "bin": {"code": "A-01"}}),
                json!({"id": 2, "quantity": 5, "note": null, "bin": {"code": "A-02"}}),
                json!({"id": 3, "quantity": 10, "note": "ok", "bin": {"code": "B-01"}}),
                json!({"id": 4, "quantity": 11, "note": "recount", "bin": null}),
                json!({"id": 5, "quantity": 7, "note": "ok", "bin": {"code": "A-03"}}),
            ],
        )
    }

    async fn ids(accessor: &MemoryAccessor, filter: FilterExpr, order: OrderTree) -> Vec<i64> {
        let options = FindOptions {
            filter: compile_filter(&filter).unwrap(),
            order,
            skip: 0,
            take: 100,
            relations: FieldTree::new(),
            select: None,
        };
        accessor
            .find_and_count(&options, &CancellationToken::new())
            .await
            .unwrap()
            .records
            .iter()
            .map(|r| r["id"].as_i64().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_range_bounds_are_inclusive() {
        let got = ids(
            &fixture(),
            FilterExpr::new().op("quantity", OperatorSet::between("5", "10")),
            OrderTree::ascending_by("id"),
        )
        .await;
        assert_eq!(got, vec![2, 3, 5]);
    }

    #[tokio::test]
    async fn test_equality_is_loose_and_null_aware() {
        let accessor = fixture();
        assert_eq!(
            ids(&accessor, FilterExpr::new().eq("quantity", "7"), OrderTree::ascending_by("id")).await,
            vec![5]
        );
        assert_eq!(
            ids(&accessor, FilterExpr::new().eq("note", json!(null)), OrderTree::ascending_by("id")).await,
            vec![2]
        );
    }

    #[tokio::test]
    async fn test_contains_respects_case_setting() {
        let filter = FilterExpr::new().op("note", OperatorSet::like("recount"));
        assert_eq!(
            ids(&fixture(), filter.clone(), OrderTree::ascending_by("id")).await,
            vec![1, 4]
        );
        assert_eq!(
            ids(&fixture().with_case_sensitive(true), filter, OrderTree::ascending_by("id")).await,
            vec![4]
        );
    }

    #[tokio::test]
    async fn test_nested_filter_needs_related_record() {
        let got = ids(
            &fixture(),
            FilterExpr::new().nested("bin", FilterExpr::new().op("code", OperatorSet::like("A-"))),
            OrderTree::ascending_by("id"),
        )
        .await;
        assert_eq!(got, vec![1, 2, 5]);
    }

    #[tokio::test]
    async fn test_sort_nulls_last_with_key_tie_break() {
        let got = ids(&fixture(), FilterExpr::new(), compile_order("note", "asc").unwrap()).await;
        assert_eq!(got, vec![1, 3, 5, 4, 2]);

        let got = ids(&fixture(), FilterExpr::new(), compile_order("bin.code", "desc").unwrap()).await;
        assert_eq!(got, vec![4, 3, 5, 2, 1]);
    }

    #[tokio::test]
    async fn test_skip_take_and_projection() {
        let options = FindOptions {
            filter: Predicate::new(),
            order: OrderTree::ascending_by("id"),
            skip: 3,
            take: 10,
            relations: FieldTree::new(),
            select: Some(FieldTree::from_paths(["id", "bin.code"])),
        };
        let result = fixture()
            .find_and_count(&options, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.total, 5);
        assert_eq!(
            result.records,
            vec![json!({"id": 4, "bin": null}), json!({"id": 5, "bin": {"code": "A-03"}})]
        );
    }
}
