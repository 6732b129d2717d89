use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::store::ensure_not_cancelled;
use crate::{Cache, CacheKey, EntryOptions, Result};

#[derive(Debug, Clone)]
struct Entry {
    value: Vec<u8>,
    expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Process-local cache shared across in-flight requests.
#[derive(Clone, Default)]
pub struct InMemoryCache {
    entries: Arc<RwLock<HashMap<CacheKey, Entry>>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if a live entry exists for `key`.
    pub async fn contains(&self, key: &CacheKey) -> bool {
        let now = Utc::now();
        self.entries
            .read()
            .await
            .get(key)
            .is_some_and(|e| !e.is_expired(now))
    }

    /// Number of stored entries, expired ones included until they are touched.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &CacheKey, cancel: &CancellationToken) -> Result<Option<Vec<u8>>> {
        ensure_not_cancelled(cancel)?;
        let now = Utc::now();

        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // Expired entry.
        self.entries.write().await.remove(key);
        Ok(None)
    }

    async fn set(
        &self,
        key: &CacheKey,
        value: Vec<u8>,
        options: EntryOptions,
        cancel: &CancellationToken,
    ) -> Result<()> {
        ensure_not_cancelled(cancel)?;
        let entry = Entry {
            value,
            expires_at: options.expires_at(Utc::now()),
        };
        self.entries.write().await.insert(key.clone(), entry);
        Ok(())
    }

    async fn remove(&self, key: &CacheKey, cancel: &CancellationToken) -> Result<()> {
        ensure_not_cancelled(cancel)?;
        self.entries.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CacheError, CacheExt};
    use chrono::Duration;

    fn key() -> CacheKey {
        CacheKey::entity("Property", uuid::Uuid::new_v4())
    }

    #[tokio::test]
    async fn set_then_get_returns_value() {
        let cache = InMemoryCache::new();
        let cancel = CancellationToken::new();
        let key = key();

        cache
            .set(&key, b"hello".to_vec(), EntryOptions::default(), &cancel)
            .await
            .unwrap();

        assert_eq!(cache.get(&key, &cancel).await.unwrap(), Some(b"hello".to_vec()));
        assert!(cache.contains(&key).await);
    }

    #[tokio::test]
    async fn remove_absent_key_is_ok_and_idempotent() {
        let cache = InMemoryCache::new();
        let cancel = CancellationToken::new();
        let key = key();

        cache.remove(&key, &cancel).await.unwrap();
        cache.remove(&key, &cancel).await.unwrap();
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn expired_entry_reads_as_miss() {
        let cache = InMemoryCache::new();
        let cancel = CancellationToken::new();
        let key = key();

        cache
            .set(
                &key,
                b"stale".to_vec(),
                EntryOptions::expire_after(Duration::milliseconds(-1)),
                &cancel,
            )
            .await
            .unwrap();

        assert_eq!(cache.get(&key, &cancel).await.unwrap(), None);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn lifetime_past_the_calendar_keeps_entry() {
        let cache = InMemoryCache::new();
        let cancel = CancellationToken::new();
        let key = key();
        let options = EntryOptions::expire_after(Duration::seconds(10_000_000_000_000));

        assert_eq!(options.expires_at(Utc::now()), None);
        cache
            .set(&key, b"kept".to_vec(), options, &cancel)
            .await
            .unwrap();

        assert_eq!(
            cache.get(&key, &cancel).await.unwrap(),
            Some(b"kept".to_vec())
        );
    }

    #[tokio::test]
    async fn cancelled_calls_change_nothing() {
        let cache = InMemoryCache::new();
        let live = CancellationToken::new();
        let cancelled = CancellationToken::new();
        cancelled.cancel();
        let key = key();

        cache
            .set(&key, b"v".to_vec(), EntryOptions::default(), &live)
            .await
            .unwrap();

        assert!(matches!(
            cache.remove(&key, &cancelled).await,
            Err(CacheError::Cancelled)
        ));
        assert!(matches!(
            cache
                .set(&key, b"other".to_vec(), EntryOptions::default(), &cancelled)
                .await,
            Err(CacheError::Cancelled)
        ));
        assert_eq!(cache.get(&key, &live).await.unwrap(), Some(b"v".to_vec()));
    }

    #[tokio::test]
    async fn json_helpers_roundtrip_typed_values() {
        let cache = InMemoryCache::new();
        let cancel = CancellationToken::new();
        let key = key();

        cache
            .set_json(&key, &vec![1u32, 2, 3], EntryOptions::default(), &cancel)
            .await
            .unwrap();
        let value: Option<Vec<u32>> = cache.get_json(&key, &cancel).await.unwrap();
        assert_eq!(value, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn get_or_load_populates_on_miss_and_serves_hit() {
        let cache = InMemoryCache::new();
        let cancel = CancellationToken::new();
        let key = key();

        let loaded: std::result::Result<String, CacheError> = cache
            .get_or_load(&key, EntryOptions::default(), &cancel, || async {
                Ok("from source".to_string())
            })
            .await;
        assert_eq!(loaded.unwrap(), "from source");

        let cached: std::result::Result<String, CacheError> = cache
            .get_or_load(&key, EntryOptions::default(), &cancel, || async {
                Ok("should not load".to_string())
            })
            .await;
        assert_eq!(cached.unwrap(), "from source");
    }

    #[tokio::test]
    async fn get_or_load_propagates_loader_error_without_populating() {
        let cache = InMemoryCache::new();
        let cancel = CancellationToken::new();
        let key = key();

        let result: std::result::Result<String, &'static str> = cache
            .get_or_load(&key, EntryOptions::default(), &cancel, || async {
                Err("not found")
            })
            .await;
        assert_eq!(result, Err("not found"));
        assert!(!cache.contains(&key).await);
    }
}
