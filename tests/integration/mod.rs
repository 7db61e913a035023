mod batch_concurrency;
mod job_submission;
mod rate_limit_boundary;
