//! Delivery statistics (spec §4.E "Retention... Statistics" and §8
//! invariant 4: success rate equals `successful / total × 100` ± 0.01).

use crate::delivery::{DeliveryStatus, WebhookDelivery};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WebhookStats {
    pub total: u64,
    pub successful: u64,
    pub failed: u64,
    pub pending: u64,
    pub retrying: u64,
    pub abandoned: u64,
}

impl WebhookStats {
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.successful as f64 / self.total as f64 * 100.0
        }
    }

    pub fn from_deliveries(deliveries: &[WebhookDelivery]) -> Self {
        let mut stats = WebhookStats::default();
        for delivery in deliveries {
            stats.total += 1;
            match delivery.status {
                DeliveryStatus::Sent => stats.successful += 1,
                DeliveryStatus::Failed => stats.failed += 1,
                DeliveryStatus::Pending => stats.pending += 1,
                DeliveryStatus::Retrying => stats.retrying += 1,
                DeliveryStatus::Abandoned => stats.abandoned += 1,
            }
        }
        stats
    }
}
