//! State storage implementation
//!
//! Persists registration drafts, registration receipts and revoked session ids
//! with a TTL. Redis is used when configured; otherwise entries live in
//! process memory with the same expiry semantics.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use redis::AsyncCommands;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::draft::{RegistrationReceipt, WizardDraft};
use crate::config::RedisConfig;
use crate::utils::errors::Result;

/// Receipts outlive drafts so the success page can be revisited
const RECEIPT_TTL_SECONDS: u64 = 7 * 24 * 3600;

#[derive(Clone)]
enum Store {
    Redis(redis::aio::ConnectionManager),
    Memory(Arc<RwLock<HashMap<String, (String, Instant)>>>),
}

/// TTL-bound key/value state storage
#[derive(Clone)]
pub struct StateStorage {
    store: Store,
    config: RedisConfig,
}

impl std::fmt::Debug for StateStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStorage")
            .field("redis", &self.is_redis())
            .field("prefix", &self.config.prefix)
            .finish()
    }
}

impl StateStorage {
    /// Create a state storage instance; an empty Redis URL selects process memory
    pub async fn new(config: RedisConfig) -> Result<Self> {
        if config.url.is_empty() {
            return Ok(Self::in_memory(config));
        }

        let client = redis::Client::open(config.url.as_str())?;
        let connection_manager = redis::aio::ConnectionManager::new(client).await?;
        info!(prefix = %config.prefix, "Connected state storage to Redis");

        Ok(Self {
            store: Store::Redis(connection_manager),
            config,
        })
    }

    pub fn in_memory(config: RedisConfig) -> Self {
        Self {
            store: Store::Memory(Arc::new(RwLock::new(HashMap::new()))),
            config,
        }
    }

    pub fn is_redis(&self) -> bool {
        matches!(self.store, Store::Redis(_))
    }

    async fn set_ex(&self, key: &str, value: String, ttl_seconds: u64) -> Result<()> {
        let ttl_seconds = ttl_seconds.max(1);
        match &self.store {
            Store::Redis(manager) => {
                let mut conn = manager.clone();
                if let Err(e) = conn.set_ex::<_, _, ()>(key, value, ttl_seconds).await {
                    error!(key = %key, error = %e, "Failed to write state to Redis");
                    return Err(e.into());
                }
            }
            Store::Memory(map) => {
                let expires_at = Instant::now() + Duration::from_secs(ttl_seconds);
                map.write().await.insert(key.to_string(), (value, expires_at));
            }
        }
        debug!(key = %key, ttl_seconds = ttl_seconds, "State saved");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        match &self.store {
            Store::Redis(manager) => {
                let mut conn = manager.clone();
                Ok(conn.get::<_, Option<String>>(key).await?)
            }
            Store::Memory(map) => {
                let entries = map.read().await;
                Ok(entries
                    .get(key)
                    .filter(|(_, expires_at)| *expires_at > Instant::now())
                    .map(|(value, _)| value.clone()))
            }
        }
    }

    async fn del(&self, key: &str) -> Result<bool> {
        match &self.store {
            Store::Redis(manager) => {
                let mut conn = manager.clone();
                let deleted: u32 = conn.del(key).await?;
                Ok(deleted > 0)
            }
            Store::Memory(map) => Ok(map.write().await.remove(key).is_some()),
        }
    }

    /// Save a draft; the entry expires with the draft
    pub async fn save_draft(&self, draft: &WizardDraft) -> Result<()> {
        let ttl = (draft.expires_at - chrono::Utc::now()).num_seconds().max(1) as u64;
        let serialized = serde_json::to_string(draft)?;
        self.set_ex(&self.draft_key(draft.draft_id), serialized, ttl).await
    }

    /// Load a draft; expired drafts read as absent and are removed
    pub async fn load_draft(&self, draft_id: Uuid) -> Result<Option<WizardDraft>> {
        let Some(data) = self.get(&self.draft_key(draft_id)).await? else {
            debug!(draft_id = %draft_id, "No draft found");
            return Ok(None);
        };

        let draft: WizardDraft = serde_json::from_str(&data)?;
        if draft.is_expired() {
            warn!(draft_id = %draft_id, expires_at = %draft.expires_at, "Draft has expired, removing");
            self.delete_draft(draft_id).await?;
            return Ok(None);
        }

        Ok(Some(draft))
    }

    pub async fn delete_draft(&self, draft_id: Uuid) -> Result<bool> {
        self.del(&self.draft_key(draft_id)).await
    }

    pub async fn save_receipt(&self, receipt: &RegistrationReceipt) -> Result<()> {
        let serialized = serde_json::to_string(receipt)?;
        self.set_ex(&self.receipt_key(receipt.draft_id), serialized, RECEIPT_TTL_SECONDS)
            .await
    }

    pub async fn load_receipt(&self, draft_id: Uuid) -> Result<Option<RegistrationReceipt>> {
        match self.get(&self.receipt_key(draft_id)).await? {
            Some(data) => Ok(Some(serde_json::from_str(&data)?)),
            None => Ok(None),
        }
    }

    /// Mark a session id as revoked until its token would have expired anyway
    pub async fn revoke_token(&self, jti: &str, ttl_seconds: u64) -> Result<()> {
        self.set_ex(&self.revocation_key(jti), "1".to_string(), ttl_seconds).await
    }

    pub async fn is_revoked(&self, jti: &str) -> Result<bool> {
        Ok(self.get(&self.revocation_key(jti)).await?.is_some())
    }

    /// Drop expired in-memory entries; Redis expires keys on its own
    pub async fn purge_expired(&self) -> usize {
        match &self.store {
            Store::Redis(_) => 0,
            Store::Memory(map) => {
                let now = Instant::now();
                let mut entries = map.write().await;
                let before = entries.len();
                entries.retain(|_, (_, expires_at)| *expires_at > now);
                before - entries.len()
            }
        }
    }

    /// Spawn the periodic purge of expired in-memory entries
    pub fn start_cleanup(&self, interval: Duration) -> Option<tokio::task::JoinHandle<()>> {
        if self.is_redis() {
            return None;
        }

        let storage = self.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let removed = storage.purge_expired().await;
                if removed > 0 {
                    info!("Cleanup task removed {} expired state entries", removed);
                }
            }
        });

        info!("Started state cleanup task with interval {:?}", interval);
        Some(handle)
    }

    /// Test the storage connection
    pub async fn test_connection(&self) -> Result<()> {
        if let Store::Redis(manager) = &self.store {
            let mut conn = manager.clone();
            let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        }
        Ok(())
    }

    fn draft_key(&self, draft_id: Uuid) -> String {
        format!("{}draft:{}", self.config.prefix, draft_id)
    }

    fn receipt_key(&self, draft_id: Uuid) -> String {
        format!("{}receipt:{}", self.config.prefix, draft_id)
    }

    fn revocation_key(&self, jti: &str) -> String {
        format!("{}revoked:{}", self.config.prefix, jti)
    }
}
