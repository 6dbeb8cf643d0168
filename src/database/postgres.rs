//! PostgreSQL backend
//!
//! Rows are read and written as `jsonb` so one set of statements serves every
//! table: `to_jsonb(t)` on the way out, `jsonb_populate_record` on the way in.
//! Column names are validated before they are spliced into SQL; values are
//! always bound.

use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::backend::{payload_columns, Backend, Direction, Filter, Query, Table};
use crate::models::{Account, CreateAccountRequest};
use crate::utils::errors::{HostelBridgeError, Result};
use crate::utils::logging::log_database_operation;

#[derive(Clone, Debug)]
pub struct PgBackend {
    pool: PgPool,
}

impl PgBackend {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// WHERE clause plus the values to bind, in placeholder order
struct WhereClause {
    sql: String,
    binds: Vec<WhereBind>,
}

enum WhereBind {
    Column(String),
    Value(Value),
}

fn build_where(query: &Query, first_placeholder: usize) -> WhereClause {
    let mut clauses = Vec::with_capacity(query.filters.len());
    let mut binds = Vec::with_capacity(query.filters.len() * 2);
    let mut n = first_placeholder;

    for filter in &query.filters {
        match filter {
            Filter::Eq(column, value) => {
                clauses.push(format!("(to_jsonb(t) -> ${}::text) = ${}::jsonb", n, n + 1));
                binds.push(WhereBind::Column(column.clone()));
                binds.push(WhereBind::Value(value.clone()));
            }
            Filter::In(column, values) => {
                clauses.push(format!(
                    "(to_jsonb(t) -> ${}::text) IN (SELECT jsonb_array_elements(${}::jsonb))",
                    n,
                    n + 1
                ));
                binds.push(WhereBind::Column(column.clone()));
                binds.push(WhereBind::Value(Value::Array(values.clone())));
            }
        }
        n += 2;
    }

    let sql = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };

    WhereClause { sql, binds }
}

fn select_sql(table: Table, query: &Query, where_clause: &WhereClause) -> String {
    let mut sql = format!("SELECT to_jsonb(t) FROM {} t{}", table.name(), where_clause.sql);
    if let Some((column, direction)) = &query.order_by {
        let direction = match direction {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        };
        sql.push_str(&format!(" ORDER BY t.\"{}\" {}", column, direction));
    }
    if let Some(limit) = query.limit {
        sql.push_str(&format!(" LIMIT {}", limit));
    }
    sql
}

fn insert_sql(table: Table, columns: &[String]) -> String {
    let column_list = columns
        .iter()
        .map(|c| format!("\"{}\"", c))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "INSERT INTO {table} AS t ({cols}) SELECT {cols} FROM jsonb_populate_record(NULL::{table}, $1) RETURNING to_jsonb(t)",
        table = table.name(),
        cols = column_list,
    )
}

fn update_sql(table: Table, columns: &[String]) -> String {
    let mut assignments: Vec<String> = columns
        .iter()
        .filter(|c| c.as_str() != "id")
        .map(|c| format!("\"{c}\" = r.\"{c}\"", c = c))
        .collect();

    if table.tracks_updates() && !columns.iter().any(|c| c == "updated_at") {
        assignments.push("updated_at = now()".to_string());
    }

    format!(
        "UPDATE {table} AS t SET {assignments} FROM jsonb_populate_record(NULL::{table}, $2) AS r WHERE t.id = $1 RETURNING to_jsonb(t)",
        table = table.name(),
        assignments = assignments.join(", "),
    )
}

fn map_unique_violation(error: sqlx::Error, email: &str) -> HostelBridgeError {
    match &error {
        sqlx::Error::Database(db) if db.is_unique_violation() => HostelBridgeError::AlreadyRegistered {
            email: email.to_string(),
        },
        _ => HostelBridgeError::Database(error),
    }
}

#[async_trait]
impl Backend for PgBackend {
    async fn select(&self, table: Table, query: &Query) -> Result<Vec<Value>> {
        query.validate()?;
        if query.is_empty_selection() {
            return Ok(Vec::new());
        }

        let started = Instant::now();
        let where_clause = build_where(query, 1);
        let sql = select_sql(table, query, &where_clause);

        let mut statement = sqlx::query_scalar::<_, Value>(&sql);
        for bind in where_clause.binds {
            statement = match bind {
                WhereBind::Column(column) => statement.bind(column),
                WhereBind::Value(value) => statement.bind(value),
            };
        }

        let result = statement.fetch_all(&self.pool).await;
        log_database_operation("select", table.name(), started.elapsed().as_millis() as u64, result.is_ok());
        Ok(result?)
    }

    async fn insert(&self, table: Table, row: Value) -> Result<Value> {
        let columns = payload_columns(table, &row)?;
        if columns.is_empty() {
            return Err(HostelBridgeError::InvalidInput(format!("Empty insert into {}", table)));
        }

        let started = Instant::now();
        let sql = insert_sql(table, &columns);
        let result = sqlx::query_scalar::<_, Value>(&sql)
            .bind(row)
            .fetch_one(&self.pool)
            .await;

        log_database_operation("insert", table.name(), started.elapsed().as_millis() as u64, result.is_ok());
        Ok(result?)
    }

    async fn update(&self, table: Table, id: Uuid, patch: Value) -> Result<Value> {
        let columns = payload_columns(table, &patch)?;
        let started = Instant::now();

        let result = if columns.iter().all(|c| c == "id") && !table.tracks_updates() {
            sqlx::query_scalar::<_, Value>(&format!("SELECT to_jsonb(t) FROM {} t WHERE t.id = $1", table.name()))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
        } else {
            sqlx::query_scalar::<_, Value>(&update_sql(table, &columns))
                .bind(id)
                .bind(patch)
                .fetch_optional(&self.pool)
                .await
        };

        log_database_operation("update", table.name(), started.elapsed().as_millis() as u64, result.is_ok());
        result?.ok_or_else(|| HostelBridgeError::NotFound {
            entity: table.name(),
            id: id.to_string(),
        })
    }

    async fn delete(&self, table: Table, id: Uuid) -> Result<bool> {
        let started = Instant::now();
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", table.name()))
            .bind(id)
            .execute(&self.pool)
            .await;

        log_database_operation("delete", table.name(), started.elapsed().as_millis() as u64, result.is_ok());
        Ok(result?.rows_affected() > 0)
    }

    async fn count(&self, table: Table, query: &Query) -> Result<i64> {
        query.validate()?;
        if query.is_empty_selection() {
            return Ok(0);
        }

        let where_clause = build_where(query, 1);
        let sql = format!("SELECT COUNT(*) FROM {} t{}", table.name(), where_clause.sql);

        let mut statement = sqlx::query_scalar::<_, i64>(&sql);
        for bind in where_clause.binds {
            statement = match bind {
                WhereBind::Column(column) => statement.bind(column),
                WhereBind::Value(value) => statement.bind(value),
            };
        }

        Ok(statement.fetch_one(&self.pool).await?)
    }

    async fn create_account(&self, request: CreateAccountRequest) -> Result<Account> {
        sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (email, password_hash, created_at)
            VALUES ($1, $2, $3)
            RETURNING id, email, password_hash, created_at
            "#
        )
        .bind(&request.email)
        .bind(&request.password_hash)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, &request.email))
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT id, email, password_hash, created_at FROM accounts WHERE email = $1"
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn find_account(&self, id: Uuid) -> Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT id, email, password_hash, created_at FROM accounts WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn adjust_occupancy(&self, hostel_id: Uuid, delta: i32) -> Result<Option<Value>> {
        let started = Instant::now();
        let result = sqlx::query_scalar::<_, Value>(
            "UPDATE hostels AS t SET occupied_count = t.occupied_count + $2, updated_at = now() \
             WHERE t.id = $1 AND t.occupied_count + $2 BETWEEN 0 AND t.capacity RETURNING to_jsonb(t)",
        )
        .bind(hostel_id)
        .bind(delta)
        .fetch_optional(&self.pool)
        .await;

        log_database_operation("adjust_occupancy", "hostels", started.elapsed().as_millis() as u64, result.is_ok());
        Ok(result?)
    }

    async fn delete_account(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> Result<()> {
        crate::database::connection::health_check(&self.pool).await
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_sql_with_filters_and_order() {
        let query = Query::new()
            .eq("admin_id", Uuid::nil())
            .one_of("status", ["active", "pending"])
            .order_by("created_at", Direction::Desc)
            .limit(5);
        let where_clause = build_where(&query, 1);
        let sql = select_sql(Table::Hostels, &query, &where_clause);

        assert_eq!(
            sql,
            "SELECT to_jsonb(t) FROM hostels t WHERE (to_jsonb(t) -> $1::text) = $2::jsonb AND \
             (to_jsonb(t) -> $3::text) IN (SELECT jsonb_array_elements($4::jsonb)) \
             ORDER BY t.\"created_at\" DESC LIMIT 5"
        );
        assert_eq!(where_clause.binds.len(), 4);
    }

    #[test]
    fn test_insert_sql_lists_only_payload_columns() {
        let sql = insert_sql(Table::Scholarships, &["title".to_string(), "amount".to_string()]);
        assert_eq!(
            sql,
            "INSERT INTO scholarships AS t (\"title\", \"amount\") SELECT \"title\", \"amount\" \
             FROM jsonb_populate_record(NULL::scholarships, $1) RETURNING to_jsonb(t)"
        );
    }

    #[test]
    fn test_update_sql_touches_updated_at() {
        let sql = update_sql(Table::Hostels, &["capacity".to_string()]);
        assert!(sql.contains("\"capacity\" = r.\"capacity\""));
        assert!(sql.contains("updated_at = now()"));

        let sql = update_sql(Table::UserRoles, &["role".to_string()]);
        assert!(!sql.contains("updated_at"));
    }
}
