//! Generic CRUD execution against PostgreSQL.

use crate::config::ResolvedResource;
use crate::error::AppError;
use crate::sql::{delete, insert, select_by_id, select_list, update, PgBindValue, QueryBuf};
use serde_json::Value;
use sqlx::PgPool;
use std::collections::HashMap;

pub struct CrudService;

impl CrudService {
    /// All rows in the resource's fixed order. No pagination.
    pub async fn list(pool: &PgPool, resource: &ResolvedResource) -> Result<Vec<Value>, AppError> {
        let q = select_list(resource);
        Self::query_many(pool, &q.sql, &q.params).await
    }

    /// Fetch one row by primary key. Returns JSON object or None.
    pub async fn read(pool: &PgPool, resource: &ResolvedResource, id: i64) -> Result<Option<Value>, AppError> {
        let q = select_by_id(resource);
        Self::query_optional(pool, &q.sql, &[Value::from(id)]).await
    }

    /// Insert one row. Returns created row.
    pub async fn create(
        pool: &PgPool,
        resource: &ResolvedResource,
        body: &HashMap<String, Value>,
    ) -> Result<Value, AppError> {
        let q = insert(resource, body);
        Self::query_optional(pool, &q.sql, &q.params)
            .await?
            .ok_or(AppError::Db(sqlx::Error::RowNotFound))
    }

    /// Update one row by id, returning (row before, row after). Both read inside one transaction.
    pub async fn update(
        pool: &PgPool,
        resource: &ResolvedResource,
        id: i64,
        body: &HashMap<String, Value>,
    ) -> Result<Option<(Value, Value)>, AppError> {
        let mut tx = pool.begin().await?;
        let before_q = select_by_id(resource);
        let before_sql = format!("{} FOR UPDATE", before_q.sql);
        let Some(before) = Self::query_optional_tx(&mut tx, &before_sql, &[Value::from(id)]).await? else {
            return Ok(None);
        };
        let q = update(resource, &Value::from(id), body);
        let after = Self::execute_returning_one_tx(&mut tx, &q).await?;
        tx.commit().await?;
        Ok(after.map(|after| (before, after)))
    }

    /// Delete one row by id. Returns deleted row or None.
    pub async fn delete(pool: &PgPool, resource: &ResolvedResource, id: i64) -> Result<Option<Value>, AppError> {
        let q = delete(resource);
        Self::query_optional(pool, &q.sql, &[Value::from(id)]).await
    }

    async fn query_optional(pool: &PgPool, sql: &str, params: &[Value]) -> Result<Option<Value>, AppError> {
        tracing::debug!(sql = %sql, params = ?params, "query");
        let mut query = sqlx::query(sql);
        for p in params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let row = query.fetch_optional(pool).await?;
        Ok(row.map(|r| row_to_json(&r)))
    }

    async fn query_many(pool: &PgPool, sql: &str, params: &[Value]) -> Result<Vec<Value>, AppError> {
        tracing::debug!(sql = %sql, params = ?params, "query");
        let mut query = sqlx::query(sql);
        for p in params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let rows = query.fetch_all(pool).await?;
        Ok(rows.iter().map(row_to_json).collect())
    }

    async fn query_optional_tx(
        tx: &mut sqlx::PgConnection,
        sql: &str,
        params: &[Value],
    ) -> Result<Option<Value>, AppError> {
        tracing::debug!(sql = %sql, params = ?params, "query (tx)");
        let mut query = sqlx::query(sql);
        for p in params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let row = query.fetch_optional(&mut *tx).await?;
        Ok(row.map(|r| row_to_json(&r)))
    }

    async fn execute_returning_one_tx(tx: &mut sqlx::PgConnection, q: &QueryBuf) -> Result<Option<Value>, AppError> {
        Self::query_optional_tx(tx, &q.sql, &q.params).await
    }
}

/// Row id as returned by the store.
pub fn row_id(row: &Value) -> Option<i64> {
    row.get("id").and_then(Value::as_i64)
}

fn row_to_json(row: &sqlx::postgres::PgRow) -> Value {
    use sqlx::Column;
    use sqlx::Row;
    let mut map = serde_json::Map::new();
    for col in row.columns() {
        let name = col.name();
        let v = cell_to_value(row, name);
        map.insert(name.to_string(), v);
    }
    Value::Object(map)
}

fn cell_to_value(row: &sqlx::postgres::PgRow, name: &str) -> Value {
    use sqlx::Row;
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(name) {
        return Value::Bool(b);
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name) {
        return Value::String(d.to_rfc3339());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDate>, _>(name) {
        return Value::String(d.format("%Y-%m-%d").to_string());
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Value::String(s);
    }
    if let Ok(Some(j)) = row.try_get::<Option<serde_json::Value>, _>(name) {
        return j;
    }
    Value::Null
}
