//! Best-effort read-through cache for listing endpoints. Lives outside the
//! lifecycle manager: a miss or a stale invalidation is never an error, and
//! no invariant depends on it.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

pub const LOT_LISTING_KEY: &str = "lots:overview";

#[derive(Clone)]
pub struct ReadCache<V>
where
    V: Send + Sync + 'static,
{
    inner: Cache<&'static str, Arc<V>>,
}

impl<V> ReadCache<V>
where
    V: Send + Sync + 'static,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(64)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub async fn get(&self, key: &'static str) -> Option<Arc<V>> {
        self.inner.get(&key).await
    }

    pub async fn insert(&self, key: &'static str, value: V) -> Arc<V> {
        let value = Arc::new(value);
        self.inner.insert(key, Arc::clone(&value)).await;
        value
    }

    pub async fn invalidate(&self, key: &'static str) {
        self.inner.invalidate(&key).await;
    }
}
