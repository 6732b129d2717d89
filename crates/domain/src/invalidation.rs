//! Binding between mutating commands and the cache keys they make stale.

use cache::{Cache, CacheKey};
use common::RequestContext;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Implemented by commands whose success makes cached reads stale.
pub trait InvalidatesCache {
    /// Every key derived from the identity of the entity the command mutates.
    fn cache_keys(&self) -> Vec<CacheKey>;
}

/// Removes `keys` after a successful commit.
///
/// Removal failures are logged and swallowed. Removals run to completion even
/// if the request was cancelled after the commit.
pub async fn invalidate_after_commit(cache: &dyn Cache, keys: &[CacheKey], ctx: &RequestContext) {
    let detached = CancellationToken::new();
    for key in keys {
        match cache.remove(key, &detached).await {
            Ok(()) => {
                metrics::counter!("cache_invalidations_total", "outcome" => "removed")
                    .increment(1);
                debug!(%key, request_id = %ctx.request_id(), "Cache entry invalidated");
            }
            Err(error) => {
                metrics::counter!("cache_invalidations_total", "outcome" => "failed")
                    .increment(1);
                warn!(%key, %error, request_id = %ctx.request_id(), "Cache invalidation failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cache::{CacheError, EntryOptions, InMemoryCache};
    use std::sync::Mutex;

    struct Unreachable {
        attempts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Cache for Unreachable {
        async fn get(
            &self,
            _key: &CacheKey,
            _cancel: &CancellationToken,
        ) -> cache::Result<Option<Vec<u8>>> {
            Err(CacheError::Unavailable("down".into()))
        }

        async fn set(
            &self,
            _key: &CacheKey,
            _value: Vec<u8>,
            _options: EntryOptions,
            _cancel: &CancellationToken,
        ) -> cache::Result<()> {
            Err(CacheError::Unavailable("down".into()))
        }

        async fn remove(&self, key: &CacheKey, _cancel: &CancellationToken) -> cache::Result<()> {
            self.attempts.lock().unwrap().push(key.to_string());
            Err(CacheError::Unavailable("down".into()))
        }
    }

    #[tokio::test]
    async fn removes_every_key() {
        let cache = InMemoryCache::new();
        let cancel = CancellationToken::new();
        let a = CacheKey::entity("Property", "a");
        let b = CacheKey::entity("Property", "b");
        cache
            .set(&a, b"1".to_vec(), EntryOptions::default(), &cancel)
            .await
            .unwrap();
        cache
            .set(&b, b"2".to_vec(), EntryOptions::default(), &cancel)
            .await
            .unwrap();

        invalidate_after_commit(&cache, &[a.clone(), b.clone()], &RequestContext::anonymous())
            .await;

        assert!(!cache.contains(&a).await);
        assert!(!cache.contains(&b).await);
    }

    #[tokio::test]
    async fn absent_keys_are_fine() {
        let cache = InMemoryCache::new();
        let key = CacheKey::entity("Property", "missing");

        invalidate_after_commit(&cache, &[key.clone()], &RequestContext::anonymous()).await;
        invalidate_after_commit(&cache, &[key], &RequestContext::anonymous()).await;

        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn failures_are_swallowed_and_remaining_keys_attempted() {
        let cache = Unreachable {
            attempts: Mutex::new(Vec::new()),
        };
        let keys = [CacheKey::entity("Cart", "1"), CacheKey::entity("Cart", "2")];

        invalidate_after_commit(&cache, &keys, &RequestContext::anonymous()).await;

        assert_eq!(cache.attempts.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn runs_even_when_request_was_cancelled() {
        let cache = InMemoryCache::new();
        let key = CacheKey::entity("Property", "a");
        cache
            .set(&key, b"1".to_vec(), EntryOptions::default(), &CancellationToken::new())
            .await
            .unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let ctx = RequestContext::anonymous().with_cancellation(cancel);

        invalidate_after_commit(&cache, &[key.clone()], &ctx).await;

        assert!(!cache.contains(&key).await);
    }
}
