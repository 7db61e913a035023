//! Delivery record storage.
//!
//! A trait plus an in-memory implementation, per the "make each external
//! dependency a trait/interface" redesign note; a production deployment
//! would back this with the relational database that's out of scope here.

use crate::delivery::WebhookDelivery;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

#[async_trait]
pub trait DeliveryStore: Send + Sync {
    async fn append(&self, delivery: WebhookDelivery);
    async fn for_job(&self, job_id: &str) -> Vec<WebhookDelivery>;
    async fn all(&self) -> Vec<WebhookDelivery>;
    /// Removes every delivery older than `retention`, returning the count removed.
    async fn purge_older_than(&self, retention: Duration) -> usize;
}

#[derive(Default)]
pub struct InMemoryDeliveryStore {
    by_job: Mutex<HashMap<String, Vec<WebhookDelivery>>>,
}

impl InMemoryDeliveryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeliveryStore for InMemoryDeliveryStore {
    async fn append(&self, delivery: WebhookDelivery) {
        self.by_job
            .lock()
            .expect("lock poisoned")
            .entry(delivery.job_id.clone())
            .or_default()
            .push(delivery);
    }

    async fn for_job(&self, job_id: &str) -> Vec<WebhookDelivery> {
        self.by_job
            .lock()
            .expect("lock poisoned")
            .get(job_id)
            .cloned()
            .unwrap_or_default()
    }

    async fn all(&self) -> Vec<WebhookDelivery> {
        self.by_job
            .lock()
            .expect("lock poisoned")
            .values()
            .flat_map(|v| v.iter().cloned())
            .collect()
    }

    async fn purge_older_than(&self, retention: Duration) -> usize {
        let cutoff = SystemTime::now() - retention;
        let mut removed = 0usize;
        let mut by_job = self.by_job.lock().expect("lock poisoned");
        by_job.retain(|_, deliveries| {
            let before = deliveries.len();
            deliveries.retain(|d| d.created_at > cutoff);
            removed += before - deliveries.len();
            !deliveries.is_empty()
        });
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::DeliveryStatus;

    #[tokio::test]
    async fn appended_deliveries_group_by_job() {
        let store = InMemoryDeliveryStore::new();
        store
            .append(WebhookDelivery::new("job-1", "complete", "https://e.com", serde_json::json!({})))
            .await;
        store
            .append(WebhookDelivery::new("job-2", "complete", "https://e.com", serde_json::json!({})))
            .await;
        assert_eq!(store.for_job("job-1").await.len(), 1);
        assert_eq!(store.all().await.len(), 2);
    }

    #[tokio::test]
    async fn purge_removes_old_deliveries() {
        let store = InMemoryDeliveryStore::new();
        let mut old = WebhookDelivery::new("job-1", "complete", "https://e.com", serde_json::json!({}));
        old.created_at = SystemTime::now() - Duration::from_secs(8 * 86_400);
        old.status = DeliveryStatus::Sent;
        store.append(old).await;

        let removed = store.purge_older_than(Duration::from_secs(7 * 86_400)).await;
        assert_eq!(removed, 1);
        assert!(store.all().await.is_empty());
    }
}
