//! Admin probes: storage backend health and the completed-job cleanup sweep,
//! grounded on `api/routers/admin.py`'s `/storage` and `/cleanup` endpoints.
//! Authentication/authorization for these routes is the HTTP surface's job
//! (spec §4.L); this module is the logic they call into.

use chrono::{DateTime, Utc};
use mediaforge_storage::{Location, Storage, StorageStatus};
use serde::Serialize;

use crate::repository::JobRepository;

/// One job's cleanup outcome, for the per-job error list the original
/// returns alongside the aggregate count.
#[derive(Debug, Clone, Serialize)]
pub struct CleanupFailure {
    pub job_id: String,
    pub error: String,
}

/// Result of a cleanup sweep, whether or not it actually deleted anything.
#[derive(Debug, Clone, Serialize)]
pub struct CleanupReport {
    pub dry_run: bool,
    pub cutoff: DateTime<Utc>,
    pub jobs_matched: usize,
    pub jobs_deleted: usize,
    pub errors: Vec<CleanupFailure>,
}

/// Finds terminal jobs completed before `cutoff` and, unless `dry_run`,
/// deletes their output file and job record. A single job's deletion
/// failure is recorded in `errors` rather than aborting the sweep.
pub async fn cleanup_old_jobs(
    repository: &dyn JobRepository,
    storage: &dyn Storage,
    cutoff: DateTime<Utc>,
    dry_run: bool,
) -> Result<CleanupReport, mediaforge_core::Error> {
    let candidates = repository.find_completed_before(cutoff).await?;

    if dry_run {
        return Ok(CleanupReport {
            dry_run: true,
            cutoff,
            jobs_matched: candidates.len(),
            jobs_deleted: 0,
            errors: Vec::new(),
        });
    }

    let mut deleted = 0;
    let mut errors = Vec::new();
    for job in &candidates {
        match storage.delete(&Location::remote(job.output_path.as_str())).await {
            Ok(()) => match repository.delete(&job.id).await {
                Ok(()) => deleted += 1,
                Err(e) => errors.push(CleanupFailure { job_id: job.id.clone(), error: e.to_string() }),
            },
            Err(e) => errors.push(CleanupFailure { job_id: job.id.clone(), error: e.to_string() }),
        }
    }

    Ok(CleanupReport { dry_run: false, cutoff, jobs_matched: candidates.len(), jobs_deleted: deleted, errors })
}

/// Thin wrapper over [`Storage::status`] for the admin `/storage` route.
pub async fn storage_backend_status(storage: &dyn Storage) -> StorageStatus {
    storage.status().await
}
