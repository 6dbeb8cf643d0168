//! In-memory backend for tests and local development.
//!
//! Mirrors the PostgreSQL backend's observable behavior: generated ids and
//! timestamps, JSON-equality filters, unique account emails. Rows keep
//! insertion order unless a query orders them.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::backend::{payload_columns, Backend, Direction, Query, Table};
use crate::models::{Account, CreateAccountRequest};
use crate::utils::errors::{HostelBridgeError, Result};

#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: RwLock<HashMap<Table, Vec<Value>>>,
    accounts: RwLock<HashMap<Uuid, Account>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn account_count(&self) -> usize {
        self.accounts.read().await.len()
    }
}

fn row_id(row: &Value) -> Option<Uuid> {
    row.get("id")
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
}

/// Total order over JSON scalars: null < bool < number < string < other
fn compare_json(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            _ => 4,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .unwrap_or_default()
            .partial_cmp(&y.as_f64().unwrap_or_default())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn apply_query(rows: &[Value], query: &Query) -> Vec<Value> {
    let mut selected: Vec<Value> = rows
        .iter()
        .filter(|row| query.filters.iter().all(|f| f.matches(row)))
        .cloned()
        .collect();

    if let Some((column, direction)) = &query.order_by {
        selected.sort_by(|a, b| {
            let ordering = compare_json(
                a.get(column).unwrap_or(&Value::Null),
                b.get(column).unwrap_or(&Value::Null),
            );
            match direction {
                Direction::Asc => ordering,
                Direction::Desc => ordering.reverse(),
            }
        });
    }

    if let Some(limit) = query.limit {
        selected.truncate(limit);
    }

    selected
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn select(&self, table: Table, query: &Query) -> Result<Vec<Value>> {
        query.validate()?;
        let tables = self.tables.read().await;
        Ok(tables
            .get(&table)
            .map(|rows| apply_query(rows, query))
            .unwrap_or_default())
    }

    async fn insert(&self, table: Table, row: Value) -> Result<Value> {
        payload_columns(table, &row)?;
        let Value::Object(mut object) = row else {
            return Err(HostelBridgeError::InvalidInput(format!("Payload for {} must be an object", table)));
        };

        let now = json!(Utc::now());
        object.entry("id").or_insert_with(|| json!(Uuid::new_v4()));
        object.entry("created_at").or_insert_with(|| now.clone());
        if table.tracks_updates() {
            object.entry("updated_at").or_insert(now);
        }

        let row = Value::Object(object);
        self.tables.write().await.entry(table).or_default().push(row.clone());
        Ok(row)
    }

    async fn update(&self, table: Table, id: Uuid, patch: Value) -> Result<Value> {
        payload_columns(table, &patch)?;
        let mut tables = self.tables.write().await;
        let row = tables
            .get_mut(&table)
            .and_then(|rows| rows.iter_mut().find(|row| row_id(row) == Some(id)))
            .ok_or_else(|| HostelBridgeError::NotFound {
                entity: table.name(),
                id: id.to_string(),
            })?;

        if let (Some(target), Value::Object(changes)) = (row.as_object_mut(), patch) {
            for (key, value) in changes {
                if key != "id" {
                    target.insert(key, value);
                }
            }
            if table.tracks_updates() {
                target.insert("updated_at".to_string(), json!(Utc::now()));
            }
        }

        Ok(row.clone())
    }

    async fn delete(&self, table: Table, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(&table) else {
            return Ok(false);
        };
        let before = rows.len();
        rows.retain(|row| row_id(row) != Some(id));
        Ok(rows.len() < before)
    }

    async fn count(&self, table: Table, query: &Query) -> Result<i64> {
        Ok(self.select(table, query).await?.len() as i64)
    }

    async fn create_account(&self, request: CreateAccountRequest) -> Result<Account> {
        let mut accounts = self.accounts.write().await;
        if accounts.values().any(|a| a.email == request.email) {
            return Err(HostelBridgeError::AlreadyRegistered { email: request.email });
        }

        let account = Account {
            id: Uuid::new_v4(),
            email: request.email,
            password_hash: request.password_hash,
            created_at: Utc::now(),
        };
        accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.values().find(|a| a.email == email).cloned())
    }

    async fn find_account(&self, id: Uuid) -> Result<Option<Account>> {
        Ok(self.accounts.read().await.get(&id).cloned())
    }

    async fn adjust_occupancy(&self, hostel_id: Uuid, delta: i32) -> Result<Option<Value>> {
        let mut tables = self.tables.write().await;
        let Some(row) = tables
            .get_mut(&Table::Hostels)
            .and_then(|rows| rows.iter_mut().find(|row| row_id(row) == Some(hostel_id)))
        else {
            return Ok(None);
        };

        let occupied = row["occupied_count"].as_i64().unwrap_or(0);
        let capacity = row["capacity"].as_i64().unwrap_or(0);
        let next = occupied + i64::from(delta);
        if !(0..=capacity).contains(&next) {
            return Ok(None);
        }

        if let Some(target) = row.as_object_mut() {
            target.insert("occupied_count".to_string(), json!(next));
            target.insert("updated_at".to_string(), json!(Utc::now()));
        }
        Ok(Some(row.clone()))
    }

    async fn delete_account(&self, id: Uuid) -> Result<bool> {
        Ok(self.accounts.write().await.remove(&id).is_some())
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
