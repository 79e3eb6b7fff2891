use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Shared async map for values that never go stale once fetched.
#[derive(Clone)]
pub struct Cache<K, V>
where
    K: Eq + Hash + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    inner: Arc<Mutex<HashMap<K, V>>>,
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Debug + Send + Sync,
    V: Clone + Send + Sync,
{
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        let entries = self.inner.lock().await;
        let value = entries.get(key).cloned();
        if value.is_some() {
            debug!(?key, "Cache HIT");
        } else {
            debug!(?key, "Cache MISS");
        }
        value
    }

    pub async fn put(&self, key: K, value: V) {
        debug!(?key, "Cache PUT");
        self.inner.lock().await.insert(key, value);
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}

impl<K, V> Default for Cache<K, V>
where
    K: Eq + Hash + Debug + Send + Sync,
    V: Clone + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cache_get_put() {
        let cache = Cache::<(String, u32), Vec<String>>::new();
        let key = ("000001".to_string(), 9);

        assert!(cache.get(&key).await.is_none());

        cache.put(key.clone(), vec!["600519".to_string()]).await;
        assert_eq!(cache.get(&key).await, Some(vec!["600519".to_string()]));
        assert!(cache.get(&("000001".to_string(), 6)).await.is_none());
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_cache_clones_share_entries() {
        let cache = Cache::<String, f64>::new();
        let other = cache.clone();

        other.put("600519".to_string(), 1.5).await;
        assert_eq!(cache.get(&"600519".to_string()).await, Some(1.5));
    }
}
