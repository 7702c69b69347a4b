//! Job domain types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A bulk email validation run
///
/// Structure shared between the API layer (serves it to callers) and the
/// worker (accumulates progress into it via the lifecycle manager).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    pub owner_id: String,
    pub status: JobStatus,
    pub file_name: String,
    pub processed_count: i64,
    pub total_emails: i64,
    pub stats: JobStats,
    pub download_url: Option<String>,
    pub error_detail: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Job lifecycle status
///
/// `processing -> completed` and `processing -> failed` are the only legal
/// transitions. Terminal jobs are never mutated again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

/// Cumulative per-outcome counts for a job
///
/// The three counts always sum to the job's `processed_count`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStats {
    pub valid: i64,
    pub invalid: i64,
    pub risky: i64,
}

impl JobStats {
    pub fn total(&self) -> i64 {
        self.valid + self.invalid + self.risky
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_terminality() {
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&JobStatus::Processing).unwrap(),
            "\"processing\""
        );
        assert_eq!(
            serde_json::to_string(&JobStatus::Completed).unwrap(),
            "\"completed\""
        );
    }

    #[test]
    fn test_stats_total() {
        let stats = JobStats {
            valid: 3,
            invalid: 2,
            risky: 1,
        };
        assert_eq!(stats.total(), 6);
        assert_eq!(JobStats::default().total(), 0);
    }
}
