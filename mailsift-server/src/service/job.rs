//! Job Lifecycle Service
//!
//! Owns the job state machine: `processing -> completed | failed`, nothing
//! else. All writes go through the repository's terminal-guarded queries,
//! so an attempt to mutate a terminal job is a logged no-op rather than a
//! regression.

use mailsift_core::domain::job::{Job, JobStats};
use mailsift_core::dto::job::ProgressUpdate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::repository::job_repository;

/// How many jobs the recent-jobs listing returns
pub const RECENT_JOBS_LIMIT: i64 = 20;

/// Service error type
#[derive(Debug)]
pub enum JobError {
    NotFound(Uuid),
    AccessDenied(Uuid),
    DatabaseError(sqlx::Error),
}

impl From<sqlx::Error> for JobError {
    fn from(err: sqlx::Error) -> Self {
        JobError::DatabaseError(err)
    }
}

/// Job lifecycle manager
///
/// Constructed with an explicitly injected store handle; holds no other
/// state and is cheap to clone into background tasks.
#[derive(Clone)]
pub struct JobLifecycle {
    pool: PgPool,
}

impl JobLifecycle {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new job record in the processing state
    pub async fn create(&self, owner_id: &str, file_name: &str) -> Result<Job, JobError> {
        let job = job_repository::create(&self.pool, owner_id, file_name).await?;

        tracing::info!(job_id = %job.id, owner_id, file_name, "Job created");

        Ok(job)
    }

    /// Push a cumulative progress snapshot for a running job
    ///
    /// Advisory only: a store failure is logged and swallowed so the
    /// pipeline never aborts over a missed intermediate update.
    pub async fn report_progress(&self, job_id: Uuid, update: ProgressUpdate) {
        match job_repository::update_progress(
            &self.pool,
            job_id,
            update.processed_count,
            update.stats,
        )
        .await
        {
            Ok(true) => {
                tracing::debug!(
                    job_id = %job_id,
                    processed = update.processed_count,
                    "Progress update written"
                );
            }
            Ok(false) => {
                tracing::warn!(job_id = %job_id, "Progress update for unknown or terminal job ignored");
            }
            Err(err) => {
                tracing::warn!(job_id = %job_id, error = ?err, "Progress update failed, continuing");
            }
        }
    }

    /// Terminal transition: mark the job completed with its final stats
    ///
    /// The store write is retried once; this is the last chance to record
    /// the outcome.
    pub async fn complete(
        &self,
        job_id: Uuid,
        final_stats: JobStats,
        download_url: &str,
    ) -> Result<(), JobError> {
        let updated = with_one_retry(job_id, "complete", || {
            job_repository::mark_completed(&self.pool, job_id, final_stats, download_url)
        })
        .await?;

        if updated {
            tracing::info!(
                job_id = %job_id,
                valid = final_stats.valid,
                invalid = final_stats.invalid,
                risky = final_stats.risky,
                "Job completed"
            );
        } else {
            tracing::warn!(job_id = %job_id, "Complete ignored: job unknown or already terminal");
        }

        Ok(())
    }

    /// Terminal transition: mark the job failed with an error detail
    ///
    /// Callable from any failure path; retried once like `complete`.
    pub async fn fail(&self, job_id: Uuid, error_detail: &str) -> Result<(), JobError> {
        let updated = with_one_retry(job_id, "fail", || {
            job_repository::mark_failed(&self.pool, job_id, error_detail)
        })
        .await?;

        if updated {
            tracing::info!(job_id = %job_id, error_detail, "Job failed");
        } else {
            tracing::warn!(job_id = %job_id, "Fail ignored: job unknown or already terminal");
        }

        Ok(())
    }

    /// Get a job by ID
    pub async fn get(&self, job_id: Uuid) -> Result<Job, JobError> {
        let job = job_repository::find_by_id(&self.pool, job_id)
            .await?
            .ok_or(JobError::NotFound(job_id))?;

        Ok(job)
    }

    /// Get a job by ID, verifying the caller owns it
    pub async fn get_owned(&self, job_id: Uuid, owner_id: &str) -> Result<Job, JobError> {
        let job = self.get(job_id).await?;

        if job.owner_id != owner_id {
            return Err(JobError::AccessDenied(job_id));
        }

        Ok(job)
    }

    /// List the caller's most recent jobs, newest first
    pub async fn list_recent(&self, owner_id: &str) -> Result<Vec<Job>, JobError> {
        let jobs =
            job_repository::list_recent_by_owner(&self.pool, owner_id, RECENT_JOBS_LIMIT).await?;
        Ok(jobs)
    }
}

/// Runs a terminal-transition store write, retrying once on failure.
///
/// If the retry also fails the job stays `processing` from the caller's
/// view; that limitation is accepted and surfaced in the logs.
async fn with_one_retry<F, Fut>(job_id: Uuid, op: &str, mut write: F) -> Result<bool, JobError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, sqlx::Error>>,
{
    match write().await {
        Ok(updated) => Ok(updated),
        Err(first) => {
            tracing::warn!(job_id = %job_id, op, error = ?first, "Terminal store write failed, retrying once");
            write().await.map_err(|err| {
                tracing::error!(
                    job_id = %job_id,
                    op,
                    error = ?err,
                    "Terminal store write failed after retry; job may appear stuck in processing"
                );
                JobError::DatabaseError(err)
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_terminal_write_retries_once_then_succeeds() {
        let calls = AtomicUsize::new(0);

        let result = with_one_retry(Uuid::new_v4(), "complete", || {
            let attempt = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 0 {
                    Err(sqlx::Error::PoolTimedOut)
                } else {
                    Ok(true)
                }
            }
        })
        .await;

        assert!(matches!(result, Ok(true)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_terminal_write_gives_up_after_one_retry() {
        let calls = AtomicUsize::new(0);

        let result = with_one_retry(Uuid::new_v4(), "fail", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(sqlx::Error::PoolTimedOut) }
        })
        .await;

        assert!(matches!(result, Err(JobError::DatabaseError(_))));
        // Exactly one retry, never more
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_terminal_write_does_not_retry_on_success() {
        let calls = AtomicUsize::new(0);

        let result = with_one_retry(Uuid::new_v4(), "complete", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(false) }
        })
        .await;

        // A zero-row update (terminal no-op) is a success, not a retry case
        assert!(matches!(result, Ok(false)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
