//! Job DTOs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::job::JobStats;

/// Response to a job submission: the caller gets the id back immediately
/// and polls for the rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitJobResponse {
    pub job_id: Uuid,
}

/// Incremental progress pushed from the transcoder to the lifecycle
/// manager. Counts are cumulative, never deltas, so a lost update that is
/// later overwritten by a newer one is harmless.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    pub processed_count: i64,
    pub stats: JobStats,
}
