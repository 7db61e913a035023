//! Storage seams for standalone (non-batch) job records and API credentials.
//! Mirrors `mediaforge_batch::BatchRepository`'s shape: one focused trait per
//! entity, one in-memory implementation good enough for tests and
//! single-node deployments. The database itself stays out of scope (spec
//! §1); this is the dependency a real one would satisfy.

use async_trait::async_trait;
use mediaforge_core::Error;
use mediaforge_model::{ApiCredential, Job};
use std::collections::HashMap;
use std::sync::Mutex;

/// A page of jobs plus the total count matching the filter, for the
/// paginated list query (spec §4.K "Read/list: paginated queries by
/// credential").
pub struct JobPage {
    pub jobs: Vec<Job>,
    pub total: usize,
}

#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn save(&self, job: &Job) -> Result<(), Error>;
    async fn get(&self, job_id: &str) -> Result<Option<Job>, Error>;
    async fn list_by_credential(&self, credential_id: &str, offset: usize, limit: usize) -> Result<JobPage, Error>;
    async fn count_non_terminal(&self, credential_id: &str) -> Result<usize, Error>;
    /// Terminal jobs whose `completed_at` is strictly before `cutoff`
    /// (spec §4.K "cleanup of completed jobs older than N days").
    async fn find_completed_before(&self, cutoff: chrono::DateTime<chrono::Utc>) -> Result<Vec<Job>, Error>;
    async fn delete(&self, job_id: &str) -> Result<(), Error>;
}

#[derive(Default)]
pub struct InMemoryJobRepository {
    jobs: Mutex<HashMap<String, Job>>,
}

impl InMemoryJobRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn save(&self, job: &Job) -> Result<(), Error> {
        self.jobs.lock().unwrap().insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn get(&self, job_id: &str) -> Result<Option<Job>, Error> {
        Ok(self.jobs.lock().unwrap().get(job_id).cloned())
    }

    async fn list_by_credential(&self, credential_id: &str, offset: usize, limit: usize) -> Result<JobPage, Error> {
        let jobs = self.jobs.lock().unwrap();
        let mut matching: Vec<Job> = jobs.values().filter(|j| j.credential_id == credential_id).cloned().collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = matching.len();
        let page = matching.into_iter().skip(offset).take(limit).collect();
        Ok(JobPage { jobs: page, total })
    }

    async fn count_non_terminal(&self, credential_id: &str) -> Result<usize, Error> {
        Ok(self
            .jobs
            .lock()
            .unwrap()
            .values()
            .filter(|j| j.credential_id == credential_id && !j.status.is_terminal())
            .count())
    }

    async fn find_completed_before(&self, cutoff: chrono::DateTime<chrono::Utc>) -> Result<Vec<Job>, Error> {
        Ok(self
            .jobs
            .lock()
            .unwrap()
            .values()
            .filter(|j| j.status.is_terminal() && j.completed_at.map(|at| at < cutoff).unwrap_or(false))
            .cloned()
            .collect())
    }

    async fn delete(&self, job_id: &str) -> Result<(), Error> {
        self.jobs.lock().unwrap().remove(job_id);
        Ok(())
    }
}

/// Credentials are looked up by id (the raw secret is never stored; the
/// HTTP surface hashes the presented token and matches `secret_hash` before
/// ever reaching this trait).
#[async_trait]
pub trait CredentialRepository: Send + Sync {
    async fn get(&self, credential_id: &str) -> Result<Option<ApiCredential>, Error>;
    async fn find_by_secret_hash(&self, secret_hash: &str) -> Result<Option<ApiCredential>, Error>;
    async fn save(&self, credential: &ApiCredential) -> Result<(), Error>;
    async fn list(&self) -> Result<Vec<ApiCredential>, Error>;
    async fn delete(&self, credential_id: &str) -> Result<(), Error>;
}

#[derive(Default)]
pub struct InMemoryCredentialRepository {
    credentials: Mutex<HashMap<String, ApiCredential>>,
}

impl InMemoryCredentialRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialRepository for InMemoryCredentialRepository {
    async fn get(&self, credential_id: &str) -> Result<Option<ApiCredential>, Error> {
        Ok(self.credentials.lock().unwrap().get(credential_id).cloned())
    }

    async fn find_by_secret_hash(&self, secret_hash: &str) -> Result<Option<ApiCredential>, Error> {
        Ok(self.credentials.lock().unwrap().values().find(|c| c.secret_hash == secret_hash).cloned())
    }

    async fn save(&self, credential: &ApiCredential) -> Result<(), Error> {
        self.credentials.lock().unwrap().insert(credential.id.clone(), credential.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ApiCredential>, Error> {
        Ok(self.credentials.lock().unwrap().values().cloned().collect())
    }

    async fn delete(&self, credential_id: &str) -> Result<(), Error> {
        self.credentials.lock().unwrap().remove(credential_id);
        Ok(())
    }
}

/// Jobs still pending dispatch after `find_completed_before`. Not used
/// outside tests; kept here because it mirrors `mediaforge_batch::repository
/// ::{queued, non_terminal}`'s free-function helper shape.
pub fn non_terminal(jobs: &[Job]) -> impl Iterator<Item = &Job> {
    jobs.iter().filter(|j| !j.status.is_terminal())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn t(seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + seconds, 0).unwrap()
    }

    fn credential(id: &str) -> ApiCredential {
        ApiCredential {
            id: id.to_string(),
            secret_hash: format!("hash-{id}"),
            tier: mediaforge_model::Tier::Basic,
            active: true,
            admin: false,
            max_concurrent_jobs: mediaforge_model::DEFAULT_MAX_CONCURRENT_JOBS,
            revoked_at: None,
            expires_at: None,
            created_at: t(0),
        }
    }

    #[tokio::test]
    async fn list_by_credential_paginates_newest_first() {
        let repo = InMemoryJobRepository::new();
        for i in 0..3 {
            let job = Job::new(format!("job-{i}"), "in", "out", "cred1", t(i));
            repo.save(&job).await.unwrap();
        }
        let page = repo.list_by_credential("cred1", 0, 2).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.jobs.len(), 2);
        assert_eq!(page.jobs[0].id, "job-2");
    }

    #[tokio::test]
    async fn count_non_terminal_excludes_completed_jobs() {
        let repo = InMemoryJobRepository::new();
        let mut running = Job::new("job-1", "in", "out", "cred1", t(0));
        running.start("worker-1", t(0)).unwrap();
        repo.save(&running).await.unwrap();

        let mut done = Job::new("job-2", "in", "out", "cred1", t(0));
        done.start("worker-1", t(0)).unwrap();
        done.complete(t(1)).unwrap();
        repo.save(&done).await.unwrap();

        assert_eq!(repo.count_non_terminal("cred1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn find_completed_before_only_returns_terminal_jobs_past_cutoff() {
        let repo = InMemoryJobRepository::new();
        let mut old = Job::new("job-old", "in", "out", "cred1", t(0));
        old.start("worker-1", t(0)).unwrap();
        old.complete(t(1)).unwrap();
        repo.save(&old).await.unwrap();

        let mut recent = Job::new("job-recent", "in", "out", "cred1", t(1_000_000));
        recent.start("worker-1", t(1_000_000)).unwrap();
        recent.complete(t(1_000_001)).unwrap();
        repo.save(&recent).await.unwrap();

        let cutoff = t(500_000);
        let found = repo.find_completed_before(cutoff).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "job-old");
    }

    #[tokio::test]
    async fn credential_lookup_by_secret_hash() {
        let repo = InMemoryCredentialRepository::new();
        repo.save(&credential("cred1")).await.unwrap();
        let found = repo.find_by_secret_hash("hash-cred1").await.unwrap();
        assert_eq!(found.unwrap().id, "cred1");
        assert!(repo.find_by_secret_hash("missing").await.unwrap().is_none());
    }
}
