//! SQL generation for [`FindOptions`] against a static [`TableSchema`].
//!
//! Identifiers come from the schema only. Every user-supplied value becomes a
//! positional bind, and values for numeric, timestamp and uuid columns are
//! checked here so a malformed filter is a 400 rather than a database error.

use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::query::{Condition, FieldTree, FindOptions, OrderTree, Predicate, PredicateNode};
use crate::schema::{Column, ColumnKind, TableSchema};

const ROOT_ALIAS: &str = "t";

/// A bind parameter, typed for diesel.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Text(String),
    BigInt(i64),
    Bool(bool),
}

/// Count and page statements sharing one set of filter binds.
///
/// `count_sql` uses `binds`; `page_sql` uses `binds` followed by `limit` and
/// `offset`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFind {
    pub count_sql: String,
    pub page_sql: String,
    pub binds: Vec<BindValue>,
    pub limit: i64,
    pub offset: i64,
}

struct Join {
    alias: String,
    parent: String,
    table: &'static str,
    local_column: &'static str,
    foreign_column: &'static str,
}

pub struct SqlBuilder {
    root: &'static TableSchema,
    case_sensitive: bool,
    joins: Vec<Join>,
    binds: Vec<BindValue>,
}

impl SqlBuilder {
    pub fn new(root: &'static TableSchema, case_sensitive: bool) -> Self {
        Self {
            root,
            case_sensitive,
            joins: Vec::new(),
            binds: Vec::new(),
        }
    }

    pub fn build(mut self, options: &FindOptions) -> AppResult<CompiledFind> {
        let conditions = self.conditions(&options.filter, ROOT_ALIAS, self.root, "")?;
        let record = self.record(
            ROOT_ALIAS,
            self.root,
            Some(&options.relations),
            options.select.as_ref(),
            "",
        )?;
        let order = self.order(&options.order)?;

        let mut from = format!("{} {ROOT_ALIAS}", self.root.table);
        for join in &self.joins {
            from.push_str(&format!(
                " LEFT JOIN {table} {alias} ON {alias}.{foreign} = {parent}.{local}",
                table = join.table,
                alias = join.alias,
                foreign = join.foreign_column,
                parent = join.parent,
                local = join.local_column,
            ));
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let limit_at = self.binds.len() + 1;
        let offset_at = self.binds.len() + 2;

        Ok(CompiledFind {
            count_sql: format!("SELECT COUNT(*) AS total FROM {from}{where_clause}"),
            page_sql: format!(
                "SELECT {record} AS record FROM {from}{where_clause} ORDER BY {order} LIMIT ${limit_at} OFFSET ${offset_at}"
            ),
            binds: self.binds,
            limit: to_i64(options.take),
            offset: to_i64(options.skip),
        })
    }

    /// Join `name` under `parent_alias`, once per alias.
    fn join(
        &mut self,
        parent_alias: &str,
        schema: &'static TableSchema,
        name: &str,
        path: &str,
    ) -> AppResult<(String, &'static TableSchema)> {
        let relation = schema.relation(name).ok_or_else(|| unknown_field(path))?;
        let alias = format!("{parent_alias}__{}", relation.name);

        if !self.joins.iter().any(|join| join.alias == alias) {
            self.joins.push(Join {
                alias: alias.clone(),
                parent: parent_alias.to_string(),
                table: relation.target.table,
                local_column: relation.local_column,
                foreign_column: relation.foreign_column,
            });
        }
        Ok((alias, relation.target))
    }

    fn bind(&mut self, value: BindValue) -> String {
        self.binds.push(value);
        format!("${}", self.binds.len())
    }

    fn conditions(
        &mut self,
        predicate: &Predicate,
        alias: &str,
        schema: &'static TableSchema,
        prefix: &str,
    ) -> AppResult<Vec<String>> {
        let mut out = Vec::new();
        for (key, node) in predicate.iter() {
            let path = join_path(prefix, key);
            match node {
                PredicateNode::Nested(inner) => {
                    let (child, target) = self.join(alias, schema, key, &path)?;
                    out.extend(self.conditions(inner, &child, target, &path)?);
                }
                PredicateNode::Leaf(condition) => {
                    let column = schema.column(key).ok_or_else(|| unknown_field(&path))?;
                    out.push(self.condition(alias, column, &path, condition)?);
                }
            }
        }
        Ok(out)
    }

    fn condition(
        &mut self,
        alias: &str,
        column: &Column,
        path: &str,
        condition: &Condition,
    ) -> AppResult<String> {
        let target = format!("{alias}.{}", column.sql);
        match condition {
            Condition::Equals(Value::Null) => Ok(format!("{target} IS NULL")),
            Condition::Equals(value) => {
                let value = self.value(column, path, value)?;
                Ok(format!("{target} = {value}"))
            }
            Condition::Contains(needle) => {
                let operator = if self.case_sensitive { "LIKE" } else { "ILIKE" };
                let pattern = self.bind(BindValue::Text(format!("%{}%", escape_like(needle))));
                Ok(format!("CAST({target} AS text) {operator} {pattern} ESCAPE '\\'"))
            }
            Condition::Range { min, max } => match (min, max) {
                (Some(min), Some(max)) => {
                    let min = self.value(column, path, min)?;
                    let max = self.value(column, path, max)?;
                    Ok(format!("{target} BETWEEN {min} AND {max}"))
                }
                (Some(min), None) => {
                    let min = self.value(column, path, min)?;
                    Ok(format!("{target} >= {min}"))
                }
                (None, Some(max)) => {
                    let max = self.value(column, path, max)?;
                    Ok(format!("{target} <= {max}"))
                }
                (None, None) => Err(AppError::Validation {
                    field: path.to_string(),
                    reason: "range needs at least one bound".to_string(),
                }),
            },
        }
    }

    /// Bind `value` for `column`, returning the placeholder expression.
    fn value(&mut self, column: &Column, path: &str, value: &Value) -> AppResult<String> {
        let invalid = |expected: &str| AppError::Validation {
            field: path.to_string(),
            reason: format!("expected {expected}"),
        };
        let text = match value {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => return Err(invalid("a scalar value")),
        };

        let placeholder = match column.kind {
            ColumnKind::Text => self.bind(BindValue::Text(text)),
            ColumnKind::Integer => {
                let n = text.parse::<i64>().map_err(|_| invalid("an integer"))?;
                self.bind(BindValue::BigInt(n))
            }
            ColumnKind::Bool => {
                let b = text.parse::<bool>().map_err(|_| invalid("true or false"))?;
                self.bind(BindValue::Bool(b))
            }
            ColumnKind::Numeric => {
                text.parse::<f64>().map_err(|_| invalid("a number"))?;
                format!("CAST({} AS numeric)", self.bind(BindValue::Text(text)))
            }
            ColumnKind::Timestamp => {
                let valid = text.parse::<jiff::Timestamp>().is_ok()
                    || text.parse::<jiff::civil::Date>().is_ok();
                if !valid {
                    return Err(invalid("an RFC 3339 timestamp or a date"));
                }
                format!("CAST({} AS timestamptz)", self.bind(BindValue::Text(text)))
            }
            ColumnKind::Uuid => {
                uuid::Uuid::parse_str(&text).map_err(|_| invalid("a UUID"))?;
                format!("CAST({} AS uuid)", self.bind(BindValue::Text(text)))
            }
        };
        Ok(placeholder)
    }

    /// `jsonb_build_object(...)` for one row, with requested relations embedded.
    fn record(
        &mut self,
        alias: &str,
        schema: &'static TableSchema,
        relations: Option<&FieldTree>,
        select: Option<&FieldTree>,
        prefix: &str,
    ) -> AppResult<String> {
        let selected = |name: &str| select.is_none_or(|s| s.contains(name));

        let mut parts: Vec<String> = schema
            .columns
            .iter()
            .filter(|column| selected(column.path))
            .map(|column| format!("'{}', {alias}.{}", column.path, column.sql))
            .collect();

        for (name, nested) in relations.into_iter().flat_map(FieldTree::iter) {
            if !selected(name) {
                continue;
            }
            let path = join_path(prefix, name);
            let (child, target) = self.join(alias, schema, name, &path)?;
            let inner = self.record(&child, target, nested, select.and_then(|s| s.child(name)), &path)?;
            let key = key_column(target)?;
            parts.push(format!(
                "'{name}', CASE WHEN {child}.{} IS NULL THEN NULL ELSE {inner} END",
                key.sql
            ));
        }

        Ok(format!("jsonb_build_object({})", parts.join(", ")))
    }

    /// Requested ordering followed by the root primary key.
    fn order(&mut self, order: &OrderTree) -> AppResult<String> {
        let key = key_column(self.root)?;
        let mut terms = Vec::new();
        let mut keyed = false;

        for (segments, direction) in order.flatten() {
            let Some((field, relations)) = segments.split_last() else {
                continue;
            };
            let mut alias = ROOT_ALIAS.to_string();
            let mut schema = self.root;
            let mut path = String::new();
            for relation in relations {
                path = join_path(&path, relation);
                let (child, target) = self.join(&alias, schema, relation, &path)?;
                alias = child;
                schema = target;
            }
            let path = join_path(&path, field);
            let column = schema.column(field).ok_or_else(|| unknown_field(&path))?;

            keyed |= relations.is_empty() && column.sql == key.sql;
            terms.push(format!("{alias}.{} {}", column.sql, direction.as_sql()));
        }

        if !keyed {
            terms.push(format!("{ROOT_ALIAS}.{} ASC", key.sql));
        }
        Ok(terms.join(", "))
    }
}

fn key_column(schema: &'static TableSchema) -> AppResult<&'static Column> {
    schema.primary_key_column().ok_or_else(|| AppError::Internal {
        source: anyhow::anyhow!("table {} has no primary key column", schema.table),
    })
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn unknown_field(path: &str) -> AppError {
    AppError::bad_request(format!("Unknown field '{path}'"))
}

fn to_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Make `%`, `_` and `\` match literally under `ESCAPE '\'`.
pub fn escape_like(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
