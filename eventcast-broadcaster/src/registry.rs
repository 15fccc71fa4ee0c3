use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::subscriber::Subscriber;

/// Endpoint-keyed subscriber lists
///
/// Every mutation goes through the inner mutex, held only long enough to
/// mutate or copy one list. Frame writes happen on snapshots outside the
/// lock, so a stalled subscriber never blocks a registration, and a
/// registration can never be lost to a concurrent prune.
pub struct Registry {
    endpoints: Mutex<HashMap<String, Vec<Arc<Subscriber>>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            endpoints: Mutex::new(HashMap::new()),
        }
    }

    /// Append under the subscriber's endpoint, creating the list if absent
    ///
    /// No dedup: registering the same connection twice is the producer's
    /// mistake, not the registry's concern.
    pub async fn register(&self, subscriber: Arc<Subscriber>) {
        let mut endpoints = self.endpoints.lock().await;
        let list = endpoints
            .entry(subscriber.endpoint().to_string())
            .or_default();
        list.push(subscriber);
        tracing::debug!("Endpoint now has {} subscriber(s)", list.len());
    }

    /// Drop dead subscribers for one endpoint, keeping registration order
    pub async fn prune(&self, endpoint: &str) {
        let mut endpoints = self.endpoints.lock().await;
        let mut now_empty = false;
        if let Some(list) = endpoints.get_mut(endpoint) {
            let before = list.len();
            list.retain(|subscriber| subscriber.is_alive());
            if list.len() < before {
                tracing::info!(
                    "Pruned {} dead subscriber(s) from {}. Remaining: {}",
                    before - list.len(),
                    endpoint,
                    list.len()
                );
            }
            now_empty = list.is_empty();
        }
        if now_empty {
            endpoints.remove(endpoint);
        }
    }

    /// Drop dead subscribers across every endpoint
    pub async fn prune_all(&self) {
        let mut endpoints = self.endpoints.lock().await;
        for (endpoint, list) in endpoints.iter_mut() {
            let before = list.len();
            list.retain(|subscriber| subscriber.is_alive());
            if list.len() < before {
                tracing::info!(
                    "Pruned {} dead subscriber(s) from {}. Remaining: {}",
                    before - list.len(),
                    endpoint,
                    list.len()
                );
            }
        }
        endpoints.retain(|_, list| !list.is_empty());
    }

    /// Current subscribers for an endpoint, oldest registration first
    pub async fn snapshot(&self, endpoint: &str) -> Vec<Arc<Subscriber>> {
        let endpoints = self.endpoints.lock().await;
        endpoints.get(endpoint).cloned().unwrap_or_default()
    }

    /// Every subscriber across all endpoints
    pub async fn snapshot_all(&self) -> Vec<Arc<Subscriber>> {
        let endpoints = self.endpoints.lock().await;
        endpoints.values().flatten().cloned().collect()
    }

    /// Total subscriber count
    pub async fn subscriber_count(&self) -> usize {
        let endpoints = self.endpoints.lock().await;
        endpoints.values().map(Vec::len).sum()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
