use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur with cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// In-process TTL cache for Pulse responses.
///
/// Market statistics move slowly; a short TTL keeps the dashboard snappy
/// without a shared cache tier. Callers bypass it with a force-refresh
/// flag, which is the only invalidation this layer supports.
pub struct PulseCache {
    entries: moka::future::Cache<String, Vec<u8>>,
}

impl PulseCache {
    pub fn new(capacity: u64, ttl_secs: u64) -> Self {
        let entries = moka::future::CacheBuilder::new(capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { entries }
    }

    pub async fn get<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let bytes = self.entries.get(key).await?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => {
                tracing::trace!("Pulse cache hit: {}", key);
                Some(value)
            }
            Err(e) => {
                tracing::warn!("Dropping undecodable cache entry {}: {}", key, e);
                self.entries.invalidate(key).await;
                None
            }
        }
    }

    pub async fn set<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        let bytes = serde_json::to_vec(value)?;
        self.entries.insert(key.to_string(), bytes).await;
        tracing::trace!("Pulse cache set: {}", key);
        Ok(())
    }

    pub async fn invalidate(&self, key: &str) {
        self.entries.invalidate(key).await;
    }
}
