//! PostgreSQL data accessor over one static table definition.

use async_trait::async_trait;
use diesel::QueryableByName;
use diesel::pg::Pg;
use diesel::query_builder::{BoxedSqlQuery, SqlQuery};
use diesel::sql_types::{BigInt, Bool, Jsonb, Text};
use diesel_async::RunQueryDsl;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult, DatabaseErrorConverter};
use crate::query::{DataAccessor, FindOptions, FindResult};
use crate::repositories::sql::{BindValue, CompiledFind, SqlBuilder};
use crate::schema::TableSchema;

#[derive(QueryableByName)]
struct RecordRow {
    #[diesel(sql_type = Jsonb)]
    record: Value,
}

#[derive(QueryableByName)]
struct CountRow {
    #[diesel(sql_type = BigInt)]
    total: i64,
}

/// Repository for one table, answering list and lookup queries as JSON records.
///
/// Since `AsyncDbPool` (bb8::Pool) internally uses `Arc`, cloning is cheap.
#[derive(Clone)]
pub struct TableRepository {
    pool: AsyncDbPool,
    schema: &'static TableSchema,
    case_sensitive_search: bool,
}

impl TableRepository {
    pub fn new(pool: AsyncDbPool, schema: &'static TableSchema, case_sensitive_search: bool) -> Self {
        Self {
            pool,
            schema,
            case_sensitive_search,
        }
    }

    pub fn schema(&self) -> &'static TableSchema {
        self.schema
    }

    /// Count, then fetch the page, on one pooled connection.
    async fn execute(&self, compiled: CompiledFind) -> AppResult<FindResult> {
        let mut conn = self.pool.get().await?;

        let count = with_binds(&compiled.count_sql, &compiled.binds)
            .get_result::<CountRow>(&mut conn)
            .await
            .map_err(|e| {
                DatabaseErrorConverter::convert_diesel_error(e, &format!("count {}", self.schema.table))
            })?;

        let rows = with_binds(&compiled.page_sql, &compiled.binds)
            .bind::<BigInt, _>(compiled.limit)
            .bind::<BigInt, _>(compiled.offset)
            .load::<RecordRow>(&mut conn)
            .await
            .map_err(|e| {
                DatabaseErrorConverter::convert_diesel_error(e, &format!("find {}", self.schema.table))
            })?;

        Ok(FindResult {
            records: rows.into_iter().map(|row| row.record).collect(),
            total: u64::try_from(count.total).unwrap_or_default(),
        })
    }
}

fn with_binds(sql: &str, binds: &[BindValue]) -> BoxedSqlQuery<'static, Pg, SqlQuery> {
    binds.iter().fold(
        diesel::sql_query(sql.to_string()).into_boxed::<Pg>(),
        |query, bind| match bind {
            BindValue::Text(value) => query.bind::<Text, _>(value.clone()),
            BindValue::BigInt(value) => query.bind::<BigInt, _>(*value),
            BindValue::Bool(value) => query.bind::<Bool, _>(*value),
        },
    )
}

#[async_trait]
impl DataAccessor for TableRepository {
    fn resource(&self) -> &str {
        self.schema.table
    }

    fn primary_key(&self) -> &str {
        self.schema.primary_key
    }

    async fn find_and_count(
        &self,
        options: &FindOptions,
        cancel: &CancellationToken,
    ) -> AppResult<FindResult> {
        let compiled = SqlBuilder::new(self.schema, self.case_sensitive_search).build(options)?;
        debug!(table = %self.schema.table, sql = %compiled.page_sql, binds = compiled.binds.len(), "Executing find");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AppError::Cancelled {
                operation: format!("find {}", self.schema.table),
            }),
            result = self.execute(compiled) => result,
        }
    }
}
