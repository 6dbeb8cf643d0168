//! Backend client abstraction
//!
//! Defines the pluggable backend trait every data operation goes through:
//! row-level select/insert/update/delete over named tables, plus the account
//! calls behind sign-up and sign-in. Rows travel as JSON objects; the typed
//! layer lives in [`crate::database::repositories`].

use std::fmt;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::models::{Account, CreateAccountRequest};
use crate::utils::errors::{HostelBridgeError, Result};

/// Tables served by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Hostels,
    Institutions,
    Students,
    Applications,
    Donors,
    Donations,
    Trustees,
    UserRoles,
    Scholarships,
    Tickets,
    ContactSubmissions,
    Events,
    BlogPosts,
    Podcasts,
    Media,
    PressReleases,
}

impl Table {
    pub const ALL: [Table; 16] = [
        Table::Hostels,
        Table::Institutions,
        Table::Students,
        Table::Applications,
        Table::Donors,
        Table::Donations,
        Table::Trustees,
        Table::UserRoles,
        Table::Scholarships,
        Table::Tickets,
        Table::ContactSubmissions,
        Table::Events,
        Table::BlogPosts,
        Table::Podcasts,
        Table::Media,
        Table::PressReleases,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Table::Hostels => "hostels",
            Table::Institutions => "institutions",
            Table::Students => "students",
            Table::Applications => "applications",
            Table::Donors => "donors",
            Table::Donations => "donations",
            Table::Trustees => "trustees",
            Table::UserRoles => "user_roles",
            Table::Scholarships => "scholarships",
            Table::Tickets => "tickets",
            Table::ContactSubmissions => "contact_submissions",
            Table::Events => "events",
            Table::BlogPosts => "blog_posts",
            Table::Podcasts => "podcasts",
            Table::Media => "media_items",
            Table::PressReleases => "press_releases",
        }
    }

    /// Whether rows carry an `updated_at` column maintained on update
    pub fn tracks_updates(&self) -> bool {
        !matches!(
            self,
            Table::Donations | Table::Trustees | Table::UserRoles | Table::ContactSubmissions
        )
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed row stored in a backend table
pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {
    const TABLE: Table;

    fn id(&self) -> Uuid;
}

/// Row filter; column values compare by JSON equality
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    In(String, Vec<Value>),
}

impl Filter {
    pub fn column(&self) -> &str {
        match self {
            Filter::Eq(column, _) | Filter::In(column, _) => column,
        }
    }

    /// Evaluate the filter against a JSON row; missing columns read as null
    pub fn matches(&self, row: &Value) -> bool {
        let value = row.get(self.column()).unwrap_or(&Value::Null);
        match self {
            Filter::Eq(_, expected) => value == expected,
            Filter::In(_, candidates) => candidates.contains(value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// Selection over one table: conjunctive filters, optional ordering and limit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by: Option<(String, Direction)>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows where `column` equals `value`
    pub fn eq(mut self, column: &str, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.filters.push(Filter::Eq(column.to_string(), value));
        self
    }

    /// Rows where `column` is one of `values`
    pub fn one_of<T: Serialize>(mut self, column: &str, values: impl IntoIterator<Item = T>) -> Self {
        let values = values
            .into_iter()
            .map(|v| serde_json::to_value(v).unwrap_or(Value::Null))
            .collect();
        self.filters.push(Filter::In(column.to_string(), values));
        self
    }

    pub fn order_by(mut self, column: &str, direction: Direction) -> Self {
        self.order_by = Some((column.to_string(), direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// True when an `In` filter has no candidates, so nothing can match
    pub fn is_empty_selection(&self) -> bool {
        self.filters
            .iter()
            .any(|f| matches!(f, Filter::In(_, values) if values.is_empty()))
    }

    /// Check every column name before it reaches SQL text
    pub fn validate(&self) -> Result<()> {
        for filter in &self.filters {
            validate_column(filter.column())?;
        }
        if let Some((column, _)) = &self.order_by {
            validate_column(column)?;
        }
        Ok(())
    }
}

/// Column identifiers are lowercase snake_case only
pub fn validate_column(column: &str) -> Result<()> {
    let valid = !column.is_empty()
        && column.len() <= 63
        && column.starts_with(|c: char| c.is_ascii_lowercase() || c == '_')
        && column.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

    if valid {
        Ok(())
    } else {
        Err(HostelBridgeError::InvalidInput(format!("Invalid column name: {}", column)))
    }
}

/// Pluggable backend interface.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Select rows matching a query.
    async fn select(&self, table: Table, query: &Query) -> Result<Vec<Value>>;

    /// Insert one row; the backend assigns `id` and timestamps.
    async fn insert(&self, table: Table, row: Value) -> Result<Value>;

    /// Apply a partial update to the row with `id`.
    async fn update(&self, table: Table, id: Uuid, patch: Value) -> Result<Value>;

    /// Delete the row with `id`; returns whether a row was removed.
    async fn delete(&self, table: Table, id: Uuid) -> Result<bool>;

    /// Count rows matching a query.
    async fn count(&self, table: Table, query: &Query) -> Result<i64>;

    /// Add `delta` to a hostel's `occupied_count` in one conditional write.
    /// Returns `None` when the result would leave `0..=capacity` or the
    /// hostel does not exist.
    async fn adjust_occupancy(&self, hostel_id: Uuid, delta: i32) -> Result<Option<Value>>;

    /// Create an auth account; fails with `AlreadyRegistered` on a duplicate email.
    async fn create_account(&self, request: CreateAccountRequest) -> Result<Account>;

    /// Find an account by normalized email.
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>>;

    /// Find an account by id.
    async fn find_account(&self, id: Uuid) -> Result<Option<Account>>;

    /// Delete an account; returns whether it existed.
    async fn delete_account(&self, id: Uuid) -> Result<bool>;

    /// Check connectivity.
    async fn health_check(&self) -> Result<()>;

    /// Backend name for logs.
    fn name(&self) -> &'static str;
}

/// Extract the keys of a JSON object payload, validating each as a column
pub(crate) fn payload_columns(table: Table, payload: &Value) -> Result<Vec<String>> {
    let object = payload.as_object().ok_or_else(|| {
        HostelBridgeError::InvalidInput(format!("Payload for {} must be an object", table))
    })?;

    let mut columns = Vec::with_capacity(object.len());
    for key in object.keys() {
        validate_column(key)?;
        columns.push(key.clone());
    }
    Ok(columns)
}
