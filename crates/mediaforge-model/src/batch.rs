//! The batch entity (spec §3 "Batch").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub id: String,
    pub credential_id: String,
    pub total: u32,
    pub completed: u32,
    pub failed: u32,
    pub processing: u32,
    /// Bounded concurrency, spec §3 "K ∈ [1, 20]".
    pub max_concurrent: u32,
    pub priority: i32,
    pub started_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub cancelled: bool,
}

impl Batch {
    pub fn new(id: impl Into<String>, credential_id: impl Into<String>, total: u32, max_concurrent: u32, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            credential_id: credential_id.into(),
            total,
            completed: 0,
            failed: 0,
            processing: 0,
            max_concurrent: max_concurrent.clamp(1, 20),
            priority: 0,
            started_at: None,
            created_at: now,
            cancelled: false,
        }
    }

    pub fn status(&self) -> BatchStatus {
        if self.started_at.is_none() {
            BatchStatus::Pending
        } else if self.completed + self.failed == self.total && self.failed > 0 {
            BatchStatus::Failed
        } else if self.completed == self.total {
            BatchStatus::Completed
        } else {
            BatchStatus::Running
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status(), BatchStatus::Completed | BatchStatus::Failed)
    }

    /// How many more children this batch can promote to processing right
    /// now, given its concurrency cap.
    pub fn available_slots(&self) -> u32 {
        self.max_concurrent.saturating_sub(self.processing)
    }

    pub fn mark_started(&mut self, now: DateTime<Utc>) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
    }

    pub fn record_promotion(&mut self) {
        self.processing += 1;
    }

    pub fn record_completion(&mut self) {
        self.processing = self.processing.saturating_sub(1);
        self.completed += 1;
    }

    pub fn record_failure(&mut self) {
        self.processing = self.processing.saturating_sub(1);
        self.failed += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn pending_before_start() {
        let batch = Batch::new("b1", "cred1", 3, 2, t());
        assert_eq!(batch.status(), BatchStatus::Pending);
    }

    #[test]
    fn running_while_any_child_processing() {
        let mut batch = Batch::new("b1", "cred1", 3, 2, t());
        batch.mark_started(t());
        batch.record_promotion();
        assert_eq!(batch.status(), BatchStatus::Running);
    }

    #[test]
    fn completed_when_all_children_complete() {
        let mut batch = Batch::new("b1", "cred1", 2, 2, t());
        batch.mark_started(t());
        batch.record_promotion();
        batch.record_completion();
        batch.record_promotion();
        batch.record_completion();
        assert_eq!(batch.status(), BatchStatus::Completed);
    }

    #[test]
    fn failed_when_any_child_fails_and_rest_terminal() {
        let mut batch = Batch::new("b1", "cred1", 2, 2, t());
        batch.mark_started(t());
        batch.record_promotion();
        batch.record_completion();
        batch.record_promotion();
        batch.record_failure();
        assert_eq!(batch.status(), BatchStatus::Failed);
    }

    #[test]
    fn concurrency_cap_is_clamped_to_spec_range() {
        assert_eq!(Batch::new("b1", "cred1", 1, 0, t()).max_concurrent, 1);
        assert_eq!(Batch::new("b1", "cred1", 1, 100, t()).max_concurrent, 20);
    }

    #[test]
    fn available_slots_reflects_in_flight_children() {
        let mut batch = Batch::new("b1", "cred1", 5, 3, t());
        batch.record_promotion();
        assert_eq!(batch.available_slots(), 2);
    }
}
