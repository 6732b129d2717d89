use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Serialize, de::DeserializeOwned};
use tokio_util::sync::CancellationToken;

use crate::{CacheError, CacheKey, Result};

/// Per-entry options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryOptions {
    /// Entry lifetime. `None` keeps the entry until it is removed.
    pub ttl: Option<Duration>,
}

impl EntryOptions {
    pub fn expire_after(ttl: Duration) -> Self {
        Self { ttl: Some(ttl) }
    }

    /// Absolute expiry for an entry written at `now`. A lifetime reaching
    /// past the representable range never expires.
    pub fn expires_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.ttl.and_then(|ttl| now.checked_add_signed(ttl))
    }
}

/// Cache collaborator.
///
/// Every call honors the caller's cancellation signal: a cancelled call
/// returns [`CacheError::Cancelled`] without touching any entry.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &CacheKey, cancel: &CancellationToken) -> Result<Option<Vec<u8>>>;

    async fn set(
        &self,
        key: &CacheKey,
        value: Vec<u8>,
        options: EntryOptions,
        cancel: &CancellationToken,
    ) -> Result<()>;

    /// Removes `key`. Removing an absent key succeeds.
    async fn remove(&self, key: &CacheKey, cancel: &CancellationToken) -> Result<()>;
}

#[async_trait]
impl<T: Cache + ?Sized> Cache for Arc<T> {
    async fn get(&self, key: &CacheKey, cancel: &CancellationToken) -> Result<Option<Vec<u8>>> {
        (**self).get(key, cancel).await
    }

    async fn set(
        &self,
        key: &CacheKey,
        value: Vec<u8>,
        options: EntryOptions,
        cancel: &CancellationToken,
    ) -> Result<()> {
        (**self).set(key, value, options, cancel).await
    }

    async fn remove(&self, key: &CacheKey, cancel: &CancellationToken) -> Result<()> {
        (**self).remove(key, cancel).await
    }
}

/// Typed helpers and the cache-aside read.
#[async_trait]
pub trait CacheExt: Cache {
    /// Reads and decodes a JSON entry.
    async fn get_json<T>(&self, key: &CacheKey, cancel: &CancellationToken) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send,
    {
        match self.get(key, cancel).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Encodes `value` as JSON and stores it.
    async fn set_json<T>(
        &self,
        key: &CacheKey,
        value: &T,
        options: EntryOptions,
        cancel: &CancellationToken,
    ) -> Result<()>
    where
        T: Serialize + Sync,
    {
        let bytes = serde_json::to_vec(value)?;
        self.set(key, bytes, options, cancel).await
    }

    /// Cache-aside read: return the cached value, or run `load`, populate
    /// the cache and return the loaded value.
    ///
    /// Cache failures degrade to a miss (read) or are skipped (write); only
    /// errors from `load` reach the caller.
    async fn get_or_load<T, E, F, Fut>(
        &self,
        key: &CacheKey,
        options: EntryOptions,
        cancel: &CancellationToken,
        load: F,
    ) -> std::result::Result<T, E>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        E: Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = std::result::Result<T, E>> + Send,
    {
        match self.get_json::<T>(key, cancel).await {
            Ok(Some(value)) => {
                metrics::counter!("cache_reads_total", "outcome" => "hit").increment(1);
                return Ok(value);
            }
            Ok(None) => {
                metrics::counter!("cache_reads_total", "outcome" => "miss").increment(1);
            }
            Err(error) => {
                tracing::warn!(%key, %error, "cache read failed, loading from source");
            }
        }

        let value = load().await?;

        if let Err(error) = self.set_json(key, &value, options, cancel).await {
            tracing::warn!(%key, %error, "cache populate failed");
        }
        Ok(value)
    }
}

impl<T: Cache + ?Sized> CacheExt for T {}

pub(crate) fn ensure_not_cancelled(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        Err(CacheError::Cancelled)
    } else {
        Ok(())
    }
}
