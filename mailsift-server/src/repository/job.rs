//! Job Repository
//!
//! Handles all database operations related to jobs. Every mutation of an
//! existing row is guarded by `status = 'processing'`, which is what makes
//! terminal states immutable: a late update against a completed or failed
//! job matches zero rows and reports that back to the caller.

use mailsift_core::domain::job::{Job, JobStats, JobStatus};
use sqlx::PgPool;
use uuid::Uuid;

/// Create a new job in the database
pub async fn create(pool: &PgPool, owner_id: &str, file_name: &str) -> Result<Job, sqlx::Error> {
    let id = Uuid::new_v4();
    let now = chrono::Utc::now();

    let job = Job {
        id,
        owner_id: owner_id.to_string(),
        status: JobStatus::Processing,
        file_name: file_name.to_string(),
        processed_count: 0,
        total_emails: 0,
        stats: JobStats::default(),
        download_url: None,
        error_detail: None,
        created_at: now,
        completed_at: None,
    };

    sqlx::query(
        r#"
        INSERT INTO jobs (id, owner_id, status, file_name, created_at)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(id)
    .bind(owner_id)
    .bind(JobStatus::Processing.as_str())
    .bind(file_name)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(job)
}

/// Find a job by ID
pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Job>, sqlx::Error> {
    let row = sqlx::query_as::<_, JobRow>(
        r#"
        SELECT id, owner_id, status, file_name, processed_count, total_emails,
               stats_valid, stats_invalid, stats_risky, download_url,
               error_detail, created_at, completed_at
        FROM jobs
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| r.into()))
}

/// List the most recent jobs for an owner, newest first
pub async fn list_recent_by_owner(
    pool: &PgPool,
    owner_id: &str,
    limit: i64,
) -> Result<Vec<Job>, sqlx::Error> {
    let rows = sqlx::query_as::<_, JobRow>(
        r#"
        SELECT id, owner_id, status, file_name, processed_count, total_emails,
               stats_valid, stats_invalid, stats_risky, download_url,
               error_detail, created_at, completed_at
        FROM jobs
        WHERE owner_id = $1
        ORDER BY created_at DESC
        LIMIT $2
        "#,
    )
    .bind(owner_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.into()).collect())
}

/// Write a cumulative progress snapshot for a still-processing job
///
/// Returns false when no row was updated, i.e. the job is unknown or
/// already terminal.
pub async fn update_progress(
    pool: &PgPool,
    job_id: Uuid,
    processed_count: i64,
    stats: JobStats,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE jobs
        SET processed_count = $1, total_emails = $1,
            stats_valid = $2, stats_invalid = $3, stats_risky = $4
        WHERE id = $5 AND status = $6
        "#,
    )
    .bind(processed_count)
    .bind(stats.valid)
    .bind(stats.invalid)
    .bind(stats.risky)
    .bind(job_id)
    .bind(JobStatus::Processing.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Transition a processing job to completed with its final stats
pub async fn mark_completed(
    pool: &PgPool,
    job_id: Uuid,
    stats: JobStats,
    download_url: &str,
) -> Result<bool, sqlx::Error> {
    let now = chrono::Utc::now();
    let processed = stats.total();

    let result = sqlx::query(
        r#"
        UPDATE jobs
        SET status = $1, processed_count = $2, total_emails = $2,
            stats_valid = $3, stats_invalid = $4, stats_risky = $5,
            download_url = $6, completed_at = $7
        WHERE id = $8 AND status = $9
        "#,
    )
    .bind(JobStatus::Completed.as_str())
    .bind(processed)
    .bind(stats.valid)
    .bind(stats.invalid)
    .bind(stats.risky)
    .bind(download_url)
    .bind(now)
    .bind(job_id)
    .bind(JobStatus::Processing.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Transition a processing job to failed with an error detail
pub async fn mark_failed(
    pool: &PgPool,
    job_id: Uuid,
    error_detail: &str,
) -> Result<bool, sqlx::Error> {
    let now = chrono::Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE jobs
        SET status = $1, error_detail = $2, completed_at = $3
        WHERE id = $4 AND status = $5
        "#,
    )
    .bind(JobStatus::Failed.as_str())
    .bind(error_detail)
    .bind(now)
    .bind(job_id)
    .bind(JobStatus::Processing.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

// =============================================================================
// Helper Functions
// =============================================================================

fn string_to_status(s: &str) -> JobStatus {
    match s {
        "completed" => JobStatus::Completed,
        "failed" => JobStatus::Failed,
        _ => JobStatus::Processing,
    }
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct JobRow {
    id: Uuid,
    owner_id: String,
    status: String,
    file_name: String,
    processed_count: i64,
    total_emails: i64,
    stats_valid: i64,
    stats_invalid: i64,
    stats_risky: i64,
    download_url: Option<String>,
    error_detail: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
    completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<JobRow> for Job {
    fn from(row: JobRow) -> Self {
        Job {
            id: row.id,
            owner_id: row.owner_id,
            status: string_to_status(&row.status),
            file_name: row.file_name,
            processed_count: row.processed_count,
            total_emails: row.total_emails,
            stats: JobStats {
                valid: row.stats_valid,
                invalid: row.stats_invalid,
                risky: row.stats_risky,
            },
            download_url: row.download_url,
            error_detail: row.error_detail,
            created_at: row.created_at,
            completed_at: row.completed_at,
        }
    }
}
