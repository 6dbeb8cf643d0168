//! Typed repositories over the backend
//!
//! One generic repository serves every table: requests are serialized into
//! row payloads and rows are deserialized into their model type.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::database::backend::{Backend, Query, Record};
use crate::utils::errors::{HostelBridgeError, Result};

pub struct Repository<T: Record> {
    backend: Arc<dyn Backend>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            _record: PhantomData,
        }
    }
}

impl<T: Record> std::fmt::Debug for Repository<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("table", &T::TABLE)
            .field("backend", &self.backend.name())
            .finish()
    }
}

fn decode<T: Record>(row: Value) -> Result<T> {
    Ok(serde_json::from_value(row)?)
}

impl<T: Record> Repository<T> {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            _record: PhantomData,
        }
    }

    /// Create a new row
    pub async fn create(&self, request: &impl Serialize) -> Result<T> {
        let payload = serde_json::to_value(request)?;
        decode(self.backend.insert(T::TABLE, payload).await?)
    }

    /// Find row by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<T>> {
        let rows = self.backend.select(T::TABLE, &Query::new().eq("id", id).limit(1)).await?;
        rows.into_iter().next().map(decode).transpose()
    }

    /// Find row by ID or fail with `NotFound`
    pub async fn get(&self, id: Uuid) -> Result<T> {
        self.find_by_id(id).await?.ok_or_else(|| HostelBridgeError::NotFound {
            entity: T::TABLE.name(),
            id: id.to_string(),
        })
    }

    /// First row matching a query
    pub async fn find_one(&self, query: Query) -> Result<Option<T>> {
        let rows = self.backend.select(T::TABLE, &query.limit(1)).await?;
        rows.into_iter().next().map(decode).transpose()
    }

    /// All rows matching a query
    pub async fn list(&self, query: &Query) -> Result<Vec<T>> {
        self.backend
            .select(T::TABLE, query)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    /// Apply a partial update
    pub async fn update(&self, id: Uuid, patch: &impl Serialize) -> Result<T> {
        let payload = serde_json::to_value(patch)?;
        decode(self.backend.update(T::TABLE, id, payload).await?)
    }

    /// Delete row; returns whether it existed
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        self.backend.delete(T::TABLE, id).await
    }

    /// Count rows matching a query
    pub async fn count(&self, query: &Query) -> Result<i64> {
        self.backend.count(T::TABLE, query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryBackend;
    use crate::models::{CreateScholarshipRequest, Scholarship, ScholarshipStatus, UpdateScholarshipRequest};
    use chrono::NaiveDate;

    fn repository() -> Repository<Scholarship> {
        Repository::new(Arc::new(MemoryBackend::new()))
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let repo = repository();
        let created = repo
            .create(&CreateScholarshipRequest {
                title: "Merit Award".to_string(),
                description: None,
                amount: 25_000,
                deadline: NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
                eligibility: Some("Class 10 and above".to_string()),
                status: ScholarshipStatus::Open,
            })
            .await
            .unwrap();

        let found = repo.get(created.id).await.unwrap();
        assert_eq!(found.title, "Merit Award");
        assert_eq!(found.amount, 25_000);
        assert!(repo.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_partial_update_keeps_other_fields() {
        let repo = repository();
        let created = repo
            .create(&CreateScholarshipRequest {
                title: "Need Based".to_string(),
                description: Some("For families under the income threshold".to_string()),
                amount: 10_000,
                deadline: NaiveDate::from_ymd_opt(2026, 6, 30).unwrap(),
                eligibility: None,
                status: ScholarshipStatus::Open,
            })
            .await
            .unwrap();

        let patch = UpdateScholarshipRequest {
            amount: Some(12_000),
            ..Default::default()
        };
        let updated = repo.update(created.id, &patch).await.unwrap();
        assert_eq!(updated.amount, 12_000);
        assert_eq!(updated.title, "Need Based");
        assert!(updated.description.is_some());
    }
}
