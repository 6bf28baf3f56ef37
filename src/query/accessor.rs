//! Storage seam for list queries.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::AppResult;
use crate::query::filter::Predicate;
use crate::query::order::OrderTree;

/// Nested set of field or relation names.
///
/// A `None` leaf means the whole field (or the whole related record); a
/// subtree narrows it. Built from dotted paths, so `["bin", "bin.warehouse"]`
/// loads `bin` and the warehouse of that bin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldTree {
    nodes: BTreeMap<String, Option<FieldTree>>,
}

impl FieldTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tree = Self::new();
        for path in paths {
            let segments: Vec<&str> = path
                .as_ref()
                .split('.')
                .filter(|segment| !segment.is_empty())
                .collect();
            tree.insert(&segments);
        }
        tree
    }

    fn insert(&mut self, segments: &[&str]) {
        let Some((head, rest)) = segments.split_first() else {
            return;
        };
        let slot = self.nodes.entry(head.to_string()).or_insert(None);
        if rest.is_empty() {
            return;
        }
        slot.get_or_insert_with(FieldTree::new).insert(rest);
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Sub-selection under `name`; `None` when absent or taken whole.
    pub fn child(&self, name: &str) -> Option<&FieldTree> {
        self.nodes.get(name).and_then(Option::as_ref)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&FieldTree>)> {
        self.nodes.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }
}

/// One request to the accessor.
#[derive(Debug, Clone, PartialEq)]
pub struct FindOptions {
    pub filter: Predicate,
    pub order: OrderTree,
    pub skip: u64,
    pub take: u64,
    /// Relations to embed in each record
    pub relations: FieldTree,
    /// Projection; `None` returns every column
    pub select: Option<FieldTree>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FindResult {
    /// At most `take` records, after skipping `skip`
    pub records: Vec<Value>,
    /// Count of all records matching the filter, ignoring `skip` and `take`
    pub total: u64,
}

/// Fetches one page of records plus the total match count.
///
/// Implementations must return records in the given order and must stop with
/// `AppError::Cancelled` once the token is cancelled.
#[async_trait]
pub trait DataAccessor: Send + Sync {
    /// Resource name used in logs and errors
    fn resource(&self) -> &str;

    /// Field used as the final ordering tie-breaker and for lookups by id
    fn primary_key(&self) -> &str;

    async fn find_and_count(
        &self,
        options: &FindOptions,
        cancel: &CancellationToken,
    ) -> AppResult<FindResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_tree_from_paths() {
        let tree = FieldTree::from_paths(["bin", "bin.warehouse", "product"]);

        assert!(tree.contains("bin"));
        assert!(tree.contains("product"));
        assert!(tree.child("product").is_none());
        let bin = tree.child("bin").unwrap();
        assert!(bin.contains("warehouse"));
        assert!(bin.child("warehouse").is_none());
    }

    #[test]
    fn test_field_tree_ignores_empty_segments() {
        let tree = FieldTree::from_paths(["", "creator..email"]);
        assert_eq!(tree, FieldTree::from_paths(["creator.email"]));
    }
}
