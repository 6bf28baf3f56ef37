//! Sort order compilation.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::query::error::QueryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(SortDirection::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(SortDirection::Desc)
        } else {
            Err(QueryError::InvalidDirection(s.to_string()))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OrderNode {
    Direction(SortDirection),
    Nested(OrderTree),
}

/// Nested ordering, e.g. `{creator: {firstName: "desc"}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OrderTree {
    nodes: BTreeMap<String, OrderNode>,
}

impl OrderTree {
    /// Ordering by a single top-level field.
    pub fn by(field: impl Into<String>, direction: SortDirection) -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(field.into(), OrderNode::Direction(direction));
        Self { nodes }
    }

    pub fn ascending_by(field: impl Into<String>) -> Self {
        Self::by(field, SortDirection::Asc)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&OrderNode> {
        self.nodes.get(key)
    }

    /// Every sort key as its path segments plus direction.
    pub fn flatten(&self) -> Vec<(Vec<&str>, SortDirection)> {
        let mut out = Vec::new();
        self.collect(&mut Vec::new(), &mut out);
        out
    }

    fn collect<'a>(
        &'a self,
        prefix: &mut Vec<&'a str>,
        out: &mut Vec<(Vec<&'a str>, SortDirection)>,
    ) {
        for (key, node) in &self.nodes {
            prefix.push(key);
            match node {
                OrderNode::Direction(direction) => out.push((prefix.clone(), *direction)),
                OrderNode::Nested(tree) => tree.collect(prefix, out),
            }
            prefix.pop();
        }
    }
}

/// Compile a dotted path and direction token into a nested ordering.
///
/// `("creator.firstName", "DESC")` becomes `{creator: {firstName: "desc"}}`.
pub fn compile_order(path: &str, direction: &str) -> Result<OrderTree, QueryError> {
    let direction: SortDirection = direction.parse()?;

    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(QueryError::EmptyPath {
            path: path.to_string(),
        });
    }

    let Some((field, parents)) = segments.split_last() else {
        return Err(QueryError::EmptyPath {
            path: path.to_string(),
        });
    };

    let tree = parents
        .iter()
        .rev()
        .fold(OrderTree::by(*field, direction), |inner, parent| OrderTree {
            nodes: BTreeMap::from([(parent.to_string(), OrderNode::Nested(inner))]),
        });
    Ok(tree)
}
