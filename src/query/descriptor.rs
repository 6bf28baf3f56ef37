//! Per-resource list options and the query surface they accept.
//!
//! A [`ListOptions`] value names the orderable, filterable and searchable
//! field paths of one list endpoint. From it we derive the full set of query
//! parameters the endpoint accepts; [`ListOptions::parse`] accepts exactly
//! that set and rejects everything else, and [`ListOptions::document`] puts
//! the same set into the OpenAPI operation.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::Serialize;
use serde_json::Value;
use utoipa::openapi::path::{Parameter, ParameterBuilder, ParameterIn};
use utoipa::openapi::schema::{ObjectBuilder, Schema, Type};
use utoipa::openapi::{Paths, RefOr, Required};
use utoipa_axum::router::UtoipaMethodRouter;
use validator::{Validate, ValidationErrors};

use crate::query::error::QueryError;
use crate::query::filter::{FilterExpr, FilterTerm, OperatorSet};
use crate::query::order::SortDirection;
use crate::query::params::QueryParams;

pub const PAGE_PARAM: &str = "page";
pub const PAGE_SIZE_PARAM: &str = "pageSize";
pub const ORDER_PARAM: &str = "order";
pub const ORDER_BY_PARAM: &str = "orderBy";
const FILTER_PREFIX: &str = "filter";

/// What one accepted query parameter means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterKind {
    Page,
    PageSize,
    Order,
    OrderBy,
    /// `filter.<path>`: equality
    Equals(String),
    /// `filter.<path>.like`: substring match
    Like(String),
    /// `filter.<path>.gte`: inclusive lower bound
    LowerBound(String),
    /// `filter.<path>.lte`: inclusive upper bound
    UpperBound(String),
}

/// One entry of the derived query surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParameter {
    pub name: String,
    pub kind: ParameterKind,
}

impl QueryParameter {
    fn new(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Requested page, both values at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    #[validate(range(min = 1, message = "page must be at least 1"))]
    pub page: u32,
    #[validate(range(min = 1, message = "pageSize must be at least 1"))]
    pub page_size: u32,
}

impl PageRequest {
    /// Number of records before this page
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }
}

/// A list request that passed the endpoint's accepted surface.
#[derive(Debug, Clone, PartialEq)]
pub struct ListRequest {
    pub page: PageRequest,
    pub filter: FilterExpr,
    pub order_by: Option<String>,
    pub order: Option<SortDirection>,
}

/// Orderable, filterable and searchable field paths of one list endpoint.
///
/// Build it once (usually in a `LazyLock`) and share it; it is never mutated
/// after construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    orderable: BTreeSet<String>,
    filterable: BTreeSet<String>,
    searchable: BTreeSet<String>,
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn orderable<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.orderable.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn filterable<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filterable.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn searchable<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.searchable.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn orderable_paths(&self) -> impl Iterator<Item = &str> {
        self.orderable.iter().map(String::as_str)
    }

    /// The accepted query surface, in a stable order.
    ///
    /// Filterable paths accept equality, bounds and `like`; searchable paths
    /// accept `like` only.
    pub fn parameters(&self) -> Vec<QueryParameter> {
        let mut parameters = vec![
            QueryParameter::new(PAGE_PARAM, ParameterKind::Page),
            QueryParameter::new(PAGE_SIZE_PARAM, ParameterKind::PageSize),
            QueryParameter::new(ORDER_PARAM, ParameterKind::Order),
            QueryParameter::new(ORDER_BY_PARAM, ParameterKind::OrderBy),
        ];

        for path in &self.filterable {
            parameters.push(QueryParameter::new(
                format!("{FILTER_PREFIX}.{path}"),
                ParameterKind::Equals(path.clone()),
            ));
            parameters.push(QueryParameter::new(
                format!("{FILTER_PREFIX}.{path}.gte"),
                ParameterKind::LowerBound(path.clone()),
            ));
            parameters.push(QueryParameter::new(
                format!("{FILTER_PREFIX}.{path}.lte"),
                ParameterKind::UpperBound(path.clone()),
            ));
        }

        for path in self.filterable.union(&self.searchable) {
            parameters.push(QueryParameter::new(
                format!("{FILTER_PREFIX}.{path}.like"),
                ParameterKind::Like(path.clone()),
            ));
        }

        parameters
    }

    /// Validate raw parameters against the accepted surface.
    ///
    /// Unknown and repeated parameters are rejected by name. A missing
    /// `pageSize` falls back to `default_page_size`; one above
    /// `max_page_size` is clamped to it.
    pub fn parse(
        &self,
        params: &QueryParams,
        default_page_size: u32,
        max_page_size: u32,
    ) -> Result<ListRequest, QueryError> {
        let surface: HashMap<String, ParameterKind> = self
            .parameters()
            .into_iter()
            .map(|p| (p.name, p.kind))
            .collect();

        let mut seen = HashSet::new();
        let mut page = None;
        let mut page_size = None;
        let mut order = None;
        let mut order_by = None;
        let mut equalities: Vec<(String, String)> = Vec::new();
        let mut operators: HashMap<String, OperatorSet> = HashMap::new();

        for (name, value) in params.iter() {
            if !seen.insert(name) {
                return Err(QueryError::DuplicateParameter(name.to_string()));
            }

            let kind = surface
                .get(name)
                .ok_or_else(|| QueryError::UnknownParameter(name.to_string()))?;

            match kind {
                ParameterKind::Page => page = Some(parse_count(name, value)?),
                ParameterKind::PageSize => page_size = Some(parse_count(name, value)?),
                ParameterKind::Order => order = Some(value.parse::<SortDirection>()?),
                ParameterKind::OrderBy => {
                    if !self.orderable.contains(value) {
                        return Err(QueryError::NotOrderable(value.to_string()));
                    }
                    order_by = Some(value.to_string());
                }
                ParameterKind::Equals(path) => equalities.push((path.clone(), value.to_string())),
                ParameterKind::Like(path) => {
                    operators.entry(path.clone()).or_default().like = Some(value.to_string());
                }
                ParameterKind::LowerBound(path) => {
                    operators.entry(path.clone()).or_default().gte =
                        Some(Value::String(value.to_string()));
                }
                ParameterKind::UpperBound(path) => {
                    operators.entry(path.clone()).or_default().lte =
                        Some(Value::String(value.to_string()));
                }
            }
        }

        let mut filter = FilterExpr::new();
        for (path, value) in equalities {
            if operators.contains_key(&path) {
                return Err(QueryError::MixedForms { path });
            }
            filter.insert_path(&path, FilterTerm::Literal(Value::String(value)))?;
        }
        let mut operators: Vec<(String, OperatorSet)> = operators.into_iter().collect();
        operators.sort_by(|a, b| a.0.cmp(&b.0));
        for (path, set) in operators {
            if set.like.is_some() && (set.gte.is_some() || set.lte.is_some()) {
                return Err(QueryError::ConflictingOperators { path });
            }
            filter.insert_path(&path, FilterTerm::Operator(set))?;
        }

        let page = PageRequest {
            page: page.unwrap_or(1),
            page_size: page_size.unwrap_or(default_page_size),
        };
        page.validate().map_err(page_error)?;

        Ok(ListRequest {
            page: PageRequest {
                page_size: page.page_size.min(max_page_size),
                ..page
            },
            filter,
            order_by,
            order,
        })
    }

    /// OpenAPI parameters for the accepted surface.
    pub fn openapi_parameters(&self) -> Vec<Parameter> {
        self.parameters()
            .into_iter()
            .map(|parameter| {
                let (description, schema) = match &parameter.kind {
                    ParameterKind::Page => (
                        "Page number, starting at 1".to_string(),
                        ObjectBuilder::new().schema_type(Type::Integer).minimum(Some(1)),
                    ),
                    ParameterKind::PageSize => (
                        "Records per page".to_string(),
                        ObjectBuilder::new().schema_type(Type::Integer).minimum(Some(1)),
                    ),
                    ParameterKind::Order => (
                        "Sort direction, applied together with orderBy".to_string(),
                        ObjectBuilder::new()
                            .schema_type(Type::String)
                            .enum_values(Some(["asc", "desc"])),
                    ),
                    ParameterKind::OrderBy => (
                        "Field to sort by".to_string(),
                        ObjectBuilder::new()
                            .schema_type(Type::String)
                            .enum_values(Some(self.orderable.iter().cloned())),
                    ),
                    ParameterKind::Equals(path) => (
                        format!("Only records whose {path} equals the value"),
                        ObjectBuilder::new().schema_type(Type::String),
                    ),
                    ParameterKind::Like(path) => (
                        format!("Only records whose {path} contains the value"),
                        ObjectBuilder::new().schema_type(Type::String),
                    ),
                    ParameterKind::LowerBound(path) => (
                        format!("Only records whose {path} is at least the value"),
                        ObjectBuilder::new().schema_type(Type::String),
                    ),
                    ParameterKind::UpperBound(path) => (
                        format!("Only records whose {path} is at most the value"),
                        ObjectBuilder::new().schema_type(Type::String),
                    ),
                };

                ParameterBuilder::new()
                    .name(parameter.name)
                    .parameter_in(ParameterIn::Query)
                    .required(Required::False)
                    .description(Some(description))
                    .schema(Some(RefOr::T(Schema::Object(schema.build()))))
                    .build()
            })
            .collect()
    }

    /// Attach the accepted surface to the GET operations of a route.
    pub fn document<S>(&self, route: UtoipaMethodRouter<S>) -> UtoipaMethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let (schemas, mut paths, method_router) = route;
        self.document_paths(&mut paths);
        (schemas, paths, method_router)
    }

    fn document_paths(&self, paths: &mut Paths) {
        for item in paths.paths.values_mut() {
            if let Some(operation) = item.get.as_mut() {
                operation
                    .parameters
                    .get_or_insert_with(Vec::new)
                    .extend(self.openapi_parameters());
            }
        }
    }
}

fn parse_count(name: &str, value: &str) -> Result<u32, QueryError> {
    value.trim().parse::<u32>().map_err(|_| QueryError::InvalidValue {
        parameter: name.to_string(),
        reason: "must be a positive integer".to_string(),
    })
}

fn page_error(errors: ValidationErrors) -> QueryError {
    let (parameter, reason) = errors
        .field_errors()
        .into_iter()
        .next()
        .map(|(field, errs)| {
            let parameter = if field == "page_size" {
                PAGE_SIZE_PARAM
            } else {
                PAGE_PARAM
            };
            let reason = errs
                .first()
                .and_then(|e| e.message.as_ref())
                .map(|m| m.to_string())
                .unwrap_or_else(|| "out of range".to_string());
            (parameter.to_string(), reason)
        })
        .unwrap_or_else(|| (PAGE_PARAM.to_string(), errors.to_string()));
    QueryError::InvalidValue { parameter, reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> ListOptions {
        ListOptions::new()
            .orderable(["id", "name", "creator.firstName"])
            .filterable(["name", "quantity", "creator.email"])
            .searchable(["name", "description"])
    }

    fn parse(pairs: &[(&str, &str)]) -> Result<ListRequest, QueryError> {
        options().parse(&QueryParams::from_pairs(pairs.iter().copied()), 10, 100)
    }

    #[test]
    fn test_parameters_follow_the_descriptor() {
        let names: BTreeSet<String> = options().parameters().into_iter().map(|p| p.name).collect();

        for expected in [
            "page",
            "pageSize",
            "order",
            "orderBy",
            "filter.name",
            "filter.name.like",
            "filter.quantity.gte",
            "filter.quantity.lte",
            "filter.creator.email",
            "filter.description.like",
        ] {
            assert!(names.contains(expected), "missing {expected}");
        }
        assert!(!names.contains("filter.description"));
        assert!(!names.contains("filter.description.gte"));
    }

    #[test]
    fn test_defaults_when_nothing_is_given() {
        let request = parse(&[]).unwrap();
        assert_eq!(
            request.page,
            PageRequest {
                page: 1,
                page_size: 10
            }
        );
        assert!(request.filter.is_empty());
        assert!(request.order.is_none());
        assert!(request.order_by.is_none());
    }

    #[test]
    fn test_filters_are_typed_by_parameter_kind() {
        let request = parse(&[
            ("filter.name.like", "test"),
            ("filter.quantity.gte", "5"),
            ("filter.quantity.lte", "10"),
            ("filter.creator.email", "ann@depot.io"),
        ])
        .unwrap();

        let expected = FilterExpr::new()
            .op("name", OperatorSet::like("test"))
            .op("quantity", OperatorSet::between("5", "10"))
            .nested("creator", FilterExpr::new().eq("email", "ann@depot.io"));
        assert_eq!(request.filter, expected);
    }

    #[test]
    fn test_ordering_is_checked() {
        let request = parse(&[("orderBy", "creator.firstName"), ("order", "DESC")]).unwrap();
        assert_eq!(request.order_by.as_deref(), Some("creator.firstName"));
        assert_eq!(request.order, Some(SortDirection::Desc));

        assert_eq!(
            parse(&[("orderBy", "password")]).unwrap_err(),
            QueryError::NotOrderable("password".into())
        );
        assert!(matches!(
            parse(&[("order", "up")]).unwrap_err(),
            QueryError::InvalidDirection(_)
        ));
    }

    #[test]
    fn test_unknown_and_duplicate_parameters_are_rejected() {
        assert_eq!(
            parse(&[("filter.password", "x")]).unwrap_err(),
            QueryError::UnknownParameter("filter.password".into())
        );
        assert_eq!(
            parse(&[("filter.description.gte", "a")]).unwrap_err(),
            QueryError::UnknownParameter("filter.description.gte".into())
        );
        assert_eq!(
            parse(&[("search", "x")]).unwrap_err(),
            QueryError::UnknownParameter("search".into())
        );
        assert_eq!(
            parse(&[("page", "1"), ("page", "2")]).unwrap_err(),
            QueryError::DuplicateParameter("page".into())
        );
    }

    #[test]
    fn test_equality_and_operator_on_same_field_conflict() {
        assert!(matches!(
            parse(&[("filter.name", "a"), ("filter.name.like", "b")]).unwrap_err(),
            QueryError::MixedForms { .. }
        ));
        assert!(matches!(
            parse(&[("filter.name.like", "a"), ("filter.name.gte", "b")]).unwrap_err(),
            QueryError::ConflictingOperators { .. }
        ));
    }

    #[test]
    fn test_page_values_are_validated_and_clamped() {
        for bad in ["0", "-1", "abc", "1.5"] {
            let err = parse(&[("page", bad)]).unwrap_err();
            assert_eq!(err.field(), "page", "page={bad}");
        }
        let err = parse(&[("pageSize", "0")]).unwrap_err();
        assert_eq!(
            err,
            QueryError::InvalidValue {
                parameter: "pageSize".into(),
                reason: "pageSize must be at least 1".into()
            }
        );

        let request = parse(&[("pageSize", "5000"), ("page", "3")]).unwrap();
        assert_eq!(request.page.page_size, 100);
        assert_eq!(request.page.offset(), 200);
    }

    #[test]
    fn test_document_adds_query_parameters_to_get() {
        use utoipa::openapi::path::{HttpMethod, OperationBuilder};

        let mut paths = Paths::new();
        paths.add_path_operation(
            "/api/products",
            vec![HttpMethod::Get],
            OperationBuilder::new().operation_id(Some("list_products")).build(),
        );
        options().document_paths(&mut paths);

        let parameters = paths.paths["/api/products"]
            .get
            .as_ref()
            .and_then(|op| op.parameters.as_ref())
            .unwrap();
        assert_eq!(parameters.len(), options().parameters().len());
        assert!(parameters.iter().any(|p| p.name == "filter.name.like"));
    }
}
