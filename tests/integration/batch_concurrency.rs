//! Two workers calling the batch scheduler tick at the same moment must
//! never double-dispatch a child or exceed the concurrency cap (spec §8
//! scenario 5, §5 "the critical section that promotes queued children to
//! processing is serialized by a distributed lock keyed on batch id").

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mediaforge_batch::{InMemoryBatchRepository, Scheduler};
use mediaforge_bulkhead::Registry as BulkheadRegistry;
use mediaforge_lock::{DistributedLockManager, InMemoryLockStore};
use mediaforge_model::{Batch, Job};

fn t(seconds: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000 + seconds, 0).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn two_concurrent_ticks_promote_exactly_k_children_once_each() {
    let repo = Arc::new(InMemoryBatchRepository::new());
    let locks = Arc::new(DistributedLockManager::new(Arc::new(InMemoryLockStore::new())));
    let bulkheads = Arc::new(BulkheadRegistry::new());
    let scheduler = Arc::new(Scheduler::new(repo.clone(), locks, bulkheads));

    let batch = Batch::new("b1", "cred1", 3, 2, t(0));
    let children: Vec<Job> = (0..3).map(|i| Job::new(format!("job-{i}"), "in.mp4", "out.mp4", "cred1", t(0))).collect();
    scheduler.enqueue(batch, children).await.unwrap();

    let a = {
        let scheduler = scheduler.clone();
        tokio::spawn(async move { scheduler.tick("b1", t(1)).await.unwrap() })
    };
    let b = {
        let scheduler = scheduler.clone();
        tokio::spawn(async move { scheduler.tick("b1", t(1)).await.unwrap() })
    };

    let (first, second) = tokio::join!(a, b);
    let mut dispatched_ids: Vec<String> = first.unwrap().into_iter().map(|d| d.job.id).collect();
    dispatched_ids.extend(second.unwrap().into_iter().map(|d| d.job.id));

    assert_eq!(dispatched_ids.len(), 2, "exactly K=2 children promoted across both ticks combined");
    let mut unique = dispatched_ids.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), 2, "no child dispatched twice across the two concurrent ticks");

    let saved = repo.children("b1").await.unwrap();
    let queued_count = saved.iter().filter(|j| j.status == mediaforge_model::JobStatus::Queued).count();
    assert_eq!(queued_count, 1, "the third child stays queued until a slot frees up");
}
