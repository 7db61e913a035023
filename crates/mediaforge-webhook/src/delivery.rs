//! The delivery record: one attempted POST for one job event.

use std::time::{Duration, SystemTime};

/// Lifecycle state of a single delivery attempt (spec §3 WebhookDelivery).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Failed,
    Retrying,
    Abandoned,
}

impl DeliveryStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, DeliveryStatus::Sent | DeliveryStatus::Abandoned)
    }
}

/// One recorded attempt at delivering one event for one job.
#[derive(Debug, Clone)]
pub struct WebhookDelivery {
    pub job_id: String,
    pub event: String,
    pub target_url: String,
    pub payload: serde_json::Value,
    pub attempt: u32,
    pub status: DeliveryStatus,
    pub created_at: SystemTime,
    pub last_attempt_at: Option<SystemTime>,
    pub next_retry_at: Option<SystemTime>,
    pub response_status: Option<u16>,
    pub response_body: Option<String>,
    pub error_message: Option<String>,
}

/// Response body is stored truncated to this many characters (spec §4.E).
pub const RESPONSE_BODY_TRUNCATE_LEN: usize = 1000;

impl WebhookDelivery {
    pub fn new(job_id: impl Into<String>, event: impl Into<String>, target_url: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            job_id: job_id.into(),
            event: event.into(),
            target_url: target_url.into(),
            payload,
            attempt: 1,
            status: DeliveryStatus::Pending,
            created_at: SystemTime::now(),
            last_attempt_at: None,
            next_retry_at: None,
            response_status: None,
            response_body: None,
            error_message: None,
        }
    }

    pub fn next_attempt(&self) -> Self {
        Self {
            job_id: self.job_id.clone(),
            event: self.event.clone(),
            target_url: self.target_url.clone(),
            payload: self.payload.clone(),
            attempt: self.attempt + 1,
            status: DeliveryStatus::Pending,
            created_at: SystemTime::now(),
            last_attempt_at: None,
            next_retry_at: None,
            response_status: None,
            response_body: None,
            error_message: None,
        }
    }

    pub fn record_response(&mut self, status: u16, body: Option<String>) {
        self.last_attempt_at = Some(SystemTime::now());
        self.response_status = Some(status);
        self.response_body = body.map(|b| truncate(&b, RESPONSE_BODY_TRUNCATE_LEN));
        self.status = if mediaforge_retry::is_success_status(status) {
            DeliveryStatus::Sent
        } else {
            DeliveryStatus::Failed
        };
    }

    pub fn record_transport_error(&mut self, message: impl Into<String>) {
        self.last_attempt_at = Some(SystemTime::now());
        self.error_message = Some(message.into());
        self.status = DeliveryStatus::Failed;
    }

    /// Whether the response/error seen so far warrants a retry, independent
    /// of the attempt-count cap (checked separately by the engine).
    pub fn warrants_retry(&self) -> bool {
        match self.response_status {
            Some(status) => mediaforge_retry::should_retry_status(status),
            None => self.error_message.is_some(),
        }
    }

    pub fn schedule_retry(&mut self, delay: Duration) {
        self.status = DeliveryStatus::Retrying;
        self.next_retry_at = Some(SystemTime::now() + delay);
    }

    pub fn abandon(&mut self) {
        self.status = DeliveryStatus::Abandoned;
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        s.chars().take(max_len).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_status_marks_sent() {
        let mut d = WebhookDelivery::new("job-1", "complete", "https://example.com/hook", serde_json::json!({}));
        d.record_response(200, Some("ok".into()));
        assert_eq!(d.status, DeliveryStatus::Sent);
    }

    #[test]
    fn server_error_marks_failed_and_warrants_retry() {
        let mut d = WebhookDelivery::new("job-1", "complete", "https://example.com/hook", serde_json::json!({}));
        d.record_response(503, None);
        assert_eq!(d.status, DeliveryStatus::Failed);
        assert!(d.warrants_retry());
    }

    #[test]
    fn client_error_does_not_warrant_retry() {
        let mut d = WebhookDelivery::new("job-1", "complete", "https://example.com/hook", serde_json::json!({}));
        d.record_response(404, None);
        assert!(!d.warrants_retry());
    }

    #[test]
    fn response_body_is_truncated() {
        let mut d = WebhookDelivery::new("job-1", "complete", "https://example.com/hook", serde_json::json!({}));
        let long_body = "x".repeat(2000);
        d.record_response(200, Some(long_body));
        assert_eq!(d.response_body.unwrap().len(), RESPONSE_BODY_TRUNCATE_LEN);
    }
}
