//! Permission catalog and the read-only registry built from it.

use std::collections::BTreeMap;

use serde::Serialize;
use utoipa::ToSchema;

/// Resource families that carry permissions, as `(scope prefix, label)`.
const RESOURCES: &[(&str, &str)] = &[
    ("customers", "customers"),
    ("suppliers", "suppliers"),
    ("products", "products"),
    ("warehouses", "warehouses"),
    ("bins", "storage bins"),
    ("cycle-counts", "cycle counts"),
    ("notifications", "own notifications"),
];

/// Actions granted per family, as `(action, description template)`.
const ACTIONS: &[(&str, &str)] = &[
    ("list", "List {}"),
    ("get", "Read a single record of {}"),
    ("create", "Create {}"),
    ("update", "Update {}"),
    ("delete", "Delete {}"),
];

/// Separator between resource family and action in a scope string
pub const SCOPE_SEPARATOR: &str = "::";

pub fn scope(resource: &str, action: &str) -> String {
    format!("{resource}{SCOPE_SEPARATOR}{action}")
}

/// Every known scope with a human-readable description.
///
/// Built once at startup and shared behind an `Arc`; there is no way to
/// change it afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionRegistry {
    scopes: BTreeMap<String, String>,
}

/// One catalog entry, as served by `GET /api/permissions`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PermissionEntry {
    #[schema(example = "products::list")]
    pub scope: String,
    #[schema(example = "List products")]
    pub description: String,
}

impl PermissionRegistry {
    /// Build the registry from the static catalog.
    pub fn load() -> Self {
        let scopes = RESOURCES
            .iter()
            .flat_map(|(resource, label)| {
                ACTIONS.iter().map(move |(action, template)| {
                    (scope(resource, action), template.replace("{}", label))
                })
            })
            .collect();
        Self { scopes }
    }

    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            scopes: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn contains(&self, scope: &str) -> bool {
        self.scopes.contains_key(scope)
    }

    pub fn describe(&self, scope: &str) -> Option<&str> {
        self.scopes.get(scope).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.scopes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn entries(&self) -> Vec<PermissionEntry> {
        self.iter()
            .map(|(scope, description)| PermissionEntry {
                scope: scope.to_string(),
                description: description.to_string(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_covers_every_family_and_action() {
        let registry = PermissionRegistry::load();
        assert_eq!(registry.len(), RESOURCES.len() * ACTIONS.len());
        assert!(registry.contains("products::list"));
        assert!(registry.contains("cycle-counts::get"));
        assert!(registry.contains("notifications::delete"));
        assert!(!registry.contains("products::archive"));
        assert!(!registry.contains("products"));
    }

    #[test]
    fn test_descriptions_are_readable() {
        let registry = PermissionRegistry::load();
        assert_eq!(registry.describe("bins::list"), Some("List storage bins"));
        assert_eq!(
            registry.describe("customers::get"),
            Some("Read a single record of customers")
        );
    }

    #[test]
    fn test_from_entries() {
        let registry = PermissionRegistry::from_entries([("a::list", "A"), ("c::list", "C")]);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.entries()[0].scope, "a::list");
    }
}
