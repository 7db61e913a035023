//! Webhook delivery engine: signed, retried HTTP callbacks for job events
//! (spec §4.E).
//!
//! `send` makes one attempt immediately and, on a retryable failure,
//! schedules the next attempt out-of-band via a spawned, sleeping task,
//! the spec's "the actual retry is scheduled out-of-band (timer/queue)"
//! realized as the simplest thing that satisfies it without a real task
//! queue (out of scope for this CORE). Every attempt, success or failure,
//! is appended to the [`store::DeliveryStore`] so a job always has a
//! complete, ordered delivery history.

pub mod delivery;
pub mod signature;
pub mod stats;
pub mod store;
pub mod transport;
pub mod url_policy;

pub use delivery::{DeliveryStatus, WebhookDelivery};
pub use stats::WebhookStats;
pub use store::{DeliveryStore, InMemoryDeliveryStore};
pub use transport::{Transport, TransportError};

use chrono::{SecondsFormat, Utc};
use mediaforge_retry::{next_delay, MAX_ATTEMPTS};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// How long delivery records are retained before a sweep purges them
/// (spec §4.E "Retention: deliveries older than 7 days are purged").
pub const RETENTION: Duration = Duration::from_secs(7 * 86_400);

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct WebhookEngineConfig {
    pub user_agent: String,
    pub secret: Option<String>,
    pub timeout: Duration,
    pub production: bool,
}

impl Default for WebhookEngineConfig {
    fn default() -> Self {
        Self {
            user_agent: "MediaForge/0.1.0".to_string(),
            secret: None,
            timeout: DEFAULT_TIMEOUT,
            production: false,
        }
    }
}

/// Envelope wrapping every webhook payload (spec §6 "Webhook payload").
fn envelope(event: &str, job_id: &str, fields: serde_json::Value) -> serde_json::Value {
    let mut map = match fields {
        serde_json::Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };
    map.insert("event".to_string(), serde_json::json!(event));
    map.insert(
        "timestamp".to_string(),
        serde_json::json!(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
    );
    map.insert("job_id".to_string(), serde_json::json!(job_id));
    serde_json::Value::Object(map)
}

pub struct WebhookEngine {
    config: WebhookEngineConfig,
    transport: Arc<dyn Transport>,
    store: Arc<dyn DeliveryStore>,
}

impl WebhookEngine {
    pub fn new(config: WebhookEngineConfig, transport: Arc<dyn Transport>, store: Arc<dyn DeliveryStore>) -> Arc<Self> {
        Arc::new(Self { config, transport, store })
    }

    pub fn in_memory(transport: Arc<dyn Transport>) -> Arc<Self> {
        Self::new(WebhookEngineConfig::default(), transport, Arc::new(InMemoryDeliveryStore::new()))
    }

    pub fn store(&self) -> &Arc<dyn DeliveryStore> {
        &self.store
    }

    /// Sends one webhook for `job_id`/`event`, retrying out-of-band on
    /// failure when `retry` is true. Returns whether the *first* attempt
    /// succeeded, matching the original's `send_webhook` return contract.
    pub async fn send(
        self: &Arc<Self>,
        job_id: &str,
        event: &str,
        target_url: &str,
        fields: serde_json::Value,
        retry: bool,
    ) -> bool {
        if url_policy::validate(target_url, self.config.production).is_err() {
            #[cfg(feature = "tracing")]
            tracing::warn!(job_id, event, url = target_url, "invalid webhook URL, skipping delivery");
            return false;
        }

        let payload = envelope(event, job_id, fields);
        let delivery = WebhookDelivery::new(job_id, event, target_url, payload);
        self.attempt(delivery, retry).await
    }

    async fn attempt(self: &Arc<Self>, mut delivery: WebhookDelivery, retry: bool) -> bool {
        let headers = self.build_headers(&delivery);

        match self
            .transport
            .post(&delivery.target_url, headers, &delivery.payload, self.config.timeout)
            .await
        {
            Ok(response) => delivery.record_response(response.status, Some(response.body)),
            Err(err) => delivery.record_transport_error(err.to_string()),
        }

        let success = delivery.status == DeliveryStatus::Sent;

        #[cfg(feature = "tracing")]
        tracing::info!(
            job_id = %delivery.job_id,
            event = %delivery.event,
            attempt = delivery.attempt,
            status = ?delivery.status,
            "webhook delivery attempted"
        );

        if !success && retry && delivery.warrants_retry() && delivery.attempt < MAX_ATTEMPTS {
            let delay = next_delay(delivery.attempt);
            delivery.schedule_retry(delay);
            self.store.append(delivery.clone()).await;
            self.spawn_retry(delivery, delay);
        } else if !success {
            delivery.abandon();
            self.store.append(delivery).await;
        } else {
            self.store.append(delivery).await;
        }

        #[cfg(feature = "metrics")]
        metrics::counter!("webhook_attempts_total", "success" => success.to_string()).increment(1);

        success
    }

    fn spawn_retry(self: &Arc<Self>, delivery: WebhookDelivery, delay: Duration) {
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let next = delivery.next_attempt();
            engine.attempt(next, true).await;
        });
    }

    fn build_headers(&self, delivery: &WebhookDelivery) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert("User-Agent".to_string(), self.config.user_agent.clone());
        headers.insert("X-Webhook-Event".to_string(), delivery.event.clone());
        headers.insert("X-Job-ID".to_string(), delivery.job_id.clone());
        headers.insert("X-Delivery-Attempt".to_string(), delivery.attempt.to_string());
        headers.insert(
            "X-Webhook-Timestamp".to_string(),
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        );
        if let Some(secret) = &self.config.secret {
            headers.insert(
                "X-Webhook-Signature".to_string(),
                signature::header_value(secret, &delivery.payload),
            );
        }
        headers
    }

    pub async fn stats(&self) -> WebhookStats {
        WebhookStats::from_deliveries(&self.store.all().await)
    }

    /// Purges delivery records older than [`RETENTION`]. Intended to be
    /// driven by a periodic sweep task.
    pub async fn sweep_retention(&self) -> usize {
        self.store.purge_older_than(RETENTION).await
    }
}
