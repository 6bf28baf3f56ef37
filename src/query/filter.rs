//! Filter expressions and their compilation into predicate trees.
//!
//! A [`FilterExpr`] is what callers write: a tree keyed by field name whose
//! leaves are either a literal (equality) or an [`OperatorSet`]. Compiling it
//! yields a [`Predicate`] of the same shape whose leaves are closed
//! [`Condition`] variants, so storage code never inspects raw operator maps.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::query::error::QueryError;

/// A single comparison the data accessor knows how to evaluate.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Equals(Value),
    /// Substring match. The needle is opaque here; wildcard escaping is up to
    /// the accessor.
    Contains(String),
    /// Inclusive range; at least one bound is present.
    Range {
        min: Option<Value>,
        max: Option<Value>,
    },
}

/// Operator object as written by callers.
///
/// Valid shapes are `{like}`, `{gte}`, `{lte}` and `{gte, lte}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperatorSet {
    pub like: Option<String>,
    pub gte: Option<Value>,
    pub lte: Option<Value>,
}

impl OperatorSet {
    pub fn like(needle: impl Into<String>) -> Self {
        Self {
            like: Some(needle.into()),
            ..Default::default()
        }
    }

    pub fn gte(value: impl Into<Value>) -> Self {
        Self {
            gte: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn lte(value: impl Into<Value>) -> Self {
        Self {
            lte: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn between(min: impl Into<Value>, max: impl Into<Value>) -> Self {
        Self {
            like: None,
            gte: Some(min.into()),
            lte: Some(max.into()),
        }
    }

    fn into_condition(self, path: &str) -> Result<Condition, QueryError> {
        match (self.like, self.gte, self.lte) {
            (Some(needle), None, None) => Ok(Condition::Contains(needle)),
            (Some(_), _, _) => Err(QueryError::ConflictingOperators {
                path: path.to_string(),
            }),
            (None, None, None) => Err(QueryError::EmptyOperator {
                path: path.to_string(),
            }),
            (None, min, max) => Ok(Condition::Range { min, max }),
        }
    }
}

/// Right-hand side of one filter entry.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterTerm {
    Literal(Value),
    Operator(OperatorSet),
    Nested(FilterExpr),
}

impl From<OperatorSet> for FilterTerm {
    fn from(set: OperatorSet) -> Self {
        FilterTerm::Operator(set)
    }
}

impl From<FilterExpr> for FilterTerm {
    fn from(expr: FilterExpr) -> Self {
        FilterTerm::Nested(expr)
    }
}

/// Uncompiled filter tree.
///
/// Entries set to `None` are kept so callers can build sparse filters, and are
/// dropped at compile time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterExpr {
    entries: BTreeMap<String, Option<FilterTerm>>,
}

impl FilterExpr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `term`, or mark it absent with `None`.
    pub fn set(mut self, key: impl Into<String>, term: impl Into<Option<FilterTerm>>) -> Self {
        self.entries.insert(key.into(), term.into());
        self
    }

    /// Mark `key` absent; it is skipped at compile time.
    pub fn absent(mut self, key: impl Into<String>) -> Self {
        self.entries.insert(key.into(), None);
        self
    }

    pub fn eq(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, FilterTerm::Literal(value.into()))
    }

    pub fn op(self, key: impl Into<String>, operators: OperatorSet) -> Self {
        self.set(key, FilterTerm::Operator(operators))
    }

    pub fn nested(self, key: impl Into<String>, expr: FilterExpr) -> Self {
        self.set(key, FilterTerm::Nested(expr))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, Option<&FilterTerm>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    /// Insert `term` at a dotted path, creating nested levels as needed.
    ///
    /// Fails when the path collides with an existing entry of another shape,
    /// e.g. `creator=1` together with `creator.firstName=Ann`.
    pub fn insert_path(&mut self, path: &str, term: FilterTerm) -> Result<(), QueryError> {
        let segments: Vec<&str> = path.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(QueryError::EmptyPath {
                path: path.to_string(),
            });
        }
        self.insert_segments(&segments, term, path)
    }

    fn insert_segments(
        &mut self,
        segments: &[&str],
        term: FilterTerm,
        full_path: &str,
    ) -> Result<(), QueryError> {
        let mixed = || QueryError::MixedForms {
            path: full_path.to_string(),
        };

        let Some((head, rest)) = segments.split_first() else {
            return Err(QueryError::EmptyPath {
                path: full_path.to_string(),
            });
        };

        if rest.is_empty() {
            if self.entries.contains_key(*head) {
                return Err(mixed());
            }
            self.entries.insert(head.to_string(), Some(term));
            return Ok(());
        }

        let slot = self
            .entries
            .entry(head.to_string())
            .or_insert_with(|| Some(FilterTerm::Nested(FilterExpr::new())));
        match slot {
            Some(FilterTerm::Nested(inner)) => inner.insert_segments(rest, term, full_path),
            _ => Err(mixed()),
        }
    }
}

/// Compiled node: a condition on a field, or a nested tree for a relation.
#[derive(Debug, Clone, PartialEq)]
pub enum PredicateNode {
    Leaf(Condition),
    Nested(Predicate),
}

/// Compiled filter tree, isomorphic to the [`FilterExpr`] it came from.
///
/// All conditions are combined with logical AND.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    nodes: BTreeMap<String, PredicateNode>,
}

impl Predicate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn get(&self, key: &str) -> Option<&PredicateNode> {
        self.nodes.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PredicateNode)> {
        self.nodes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn with(mut self, key: impl Into<String>, node: PredicateNode) -> Self {
        self.nodes.insert(key.into(), node);
        self
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut BTreeMap<String, PredicateNode> {
        &mut self.nodes
    }

    pub(crate) fn into_nodes(self) -> BTreeMap<String, PredicateNode> {
        self.nodes
    }
}

/// Compile a filter expression into a predicate tree.
///
/// Absent entries are dropped, and nested levels left empty after that are
/// dropped with them so they never force a join.
pub fn compile_filter(expr: &FilterExpr) -> Result<Predicate, QueryError> {
    compile_level(expr, "")
}

fn compile_level(expr: &FilterExpr, prefix: &str) -> Result<Predicate, QueryError> {
    let mut predicate = Predicate::new();

    for (key, term) in expr.entries() {
        let Some(term) = term else { continue };
        let path = if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{prefix}.{key}")
        };

        let node = match term {
            FilterTerm::Literal(value) => PredicateNode::Leaf(Condition::Equals(value.clone())),
            FilterTerm::Operator(set) => PredicateNode::Leaf(set.clone().into_condition(&path)?),
            FilterTerm::Nested(inner) => {
                let nested = compile_level(inner, &path)?;
                if nested.is_empty() {
                    continue;
                }
                PredicateNode::Nested(nested)
            }
        };
        predicate.nodes.insert(key.to_string(), node);
    }

    Ok(predicate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn leaf(predicate: &Predicate, key: &str) -> Condition {
        match predicate.get(key) {
            Some(PredicateNode::Leaf(condition)) => condition.clone(),
            other => panic!("expected leaf at {key}, got {:?}", other),
        }
    }

    #[test]
    fn test_literal_compiles_to_equality() {
        let predicate = compile_filter(&FilterExpr::new().eq("status", "open")).unwrap();
        assert_eq!(leaf(&predicate, "status"), Condition::Equals(json!("open")));
    }

    #[test]
    fn test_like_compiles_to_contains() {
        let predicate =
            compile_filter(&FilterExpr::new().op("name", OperatorSet::like("te%st"))).unwrap();
        assert_eq!(leaf(&predicate, "name"), Condition::Contains("te%st".into()));
    }

    #[test]
    fn test_bounds_compile_to_single_range() {
        let expr = FilterExpr::new()
            .op("quantity", OperatorSet::between(5, 10))
            .op("price", OperatorSet::gte(3))
            .op("weight", OperatorSet::lte(7));
        let predicate = compile_filter(&expr).unwrap();

        assert_eq!(predicate.len(), 3);
        assert_eq!(
            leaf(&predicate, "quantity"),
            Condition::Range {
                min: Some(json!(5)),
                max: Some(json!(10))
            }
        );
        assert_eq!(
            leaf(&predicate, "price"),
            Condition::Range {
                min: Some(json!(3)),
                max: None
            }
        );
        assert_eq!(
            leaf(&predicate, "weight"),
            Condition::Range {
                min: None,
                max: Some(json!(7))
            }
        );
    }

    #[test]
    fn test_absent_entries_are_dropped() {
        let expr = FilterExpr::new()
            .eq("name", "bin-1")
            .absent("code")
            .nested("warehouse", FilterExpr::new().absent("code"));
        let predicate = compile_filter(&expr).unwrap();

        assert_eq!(predicate.len(), 1);
        assert!(predicate.get("code").is_none());
        assert!(predicate.get("warehouse").is_none());
    }

    #[test]
    fn test_nesting_shape_is_preserved() {
        let expr = FilterExpr::new().nested(
            "bin",
            FilterExpr::new()
                .eq("code", "A-01")
                .nested("warehouse", FilterExpr::new().eq("code", "MAIN")),
        );
        let predicate = compile_filter(&expr).unwrap();

        let Some(PredicateNode::Nested(bin)) = predicate.get("bin") else {
            panic!("bin should stay nested");
        };
        assert_eq!(leaf(bin, "code"), Condition::Equals(json!("A-01")));
        let Some(PredicateNode::Nested(warehouse)) = bin.get("warehouse") else {
            panic!("warehouse should stay nested");
        };
        assert_eq!(leaf(warehouse, "code"), Condition::Equals(json!("MAIN")));
    }

    #[test]
    fn test_invalid_operator_combinations() {
        let combined = OperatorSet {
            like: Some("a".into()),
            gte: Some(json!(1)),
            lte: None,
        };
        let err = compile_filter(&FilterExpr::new().op("name", combined)).unwrap_err();
        assert_eq!(
            err,
            QueryError::ConflictingOperators {
                path: "name".into()
            }
        );

        let err = compile_filter(
            &FilterExpr::new().nested("creator", FilterExpr::new().op("age", OperatorSet::default())),
        )
        .unwrap_err();
        assert_eq!(
            err,
            QueryError::EmptyOperator {
                path: "creator.age".into()
            }
        );
    }

    #[test]
    fn test_insert_path_builds_nested_levels() {
        let mut expr = FilterExpr::new();
        expr.insert_path("creator.firstName", FilterTerm::Literal(json!("Ann")))
            .unwrap();
        expr.insert_path("creator.email", OperatorSet::like("@depot").into())
            .unwrap();

        let expected = FilterExpr::new().nested(
            "creator",
            FilterExpr::new()
                .eq("firstName", "Ann")
                .op("email", OperatorSet::like("@depot")),
        );
        assert_eq!(expr, expected);
    }

    #[test]
    fn test_insert_path_rejects_collisions_and_empty_segments() {
        let mut expr = FilterExpr::new();
        expr.insert_path("creator", FilterTerm::Literal(json!(1))).unwrap();
        let err = expr
            .insert_path("creator.firstName", FilterTerm::Literal(json!("Ann")))
            .unwrap_err();
        assert!(matches!(err, QueryError::MixedForms { .. }));

        let err = FilterExpr::new()
            .insert_path("creator..name", FilterTerm::Literal(json!("x")))
            .unwrap_err();
        assert!(matches!(err, QueryError::EmptyPath { .. }));
    }
}
