//! Result Retrieval Gateway
//!
//! Maps a requested result filename to a file on disk. The naming check is
//! a security boundary: anything that is not exactly `results-<uuid>.csv`
//! is rejected before the filesystem is touched, and the served path is
//! rebuilt from the parsed job id rather than the raw request string.

use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::service::job::{JobError, JobLifecycle};
use mailsift_core::domain::job::JobStatus;

const RESULT_PREFIX: &str = "results-";
const RESULT_SUFFIX: &str = ".csv";

/// Gateway error type
#[derive(Debug)]
pub enum DownloadError {
    /// Name failed the security contract; no filesystem access happened
    InvalidName,
    /// No completed job / no file behind this name
    NotFound,
    DatabaseError(sqlx::Error),
    Io(std::io::Error),
}

/// Canonical result filename for a job
pub fn result_file_name(job_id: Uuid) -> String {
    format!("{RESULT_PREFIX}{job_id}{RESULT_SUFFIX}")
}

/// Download path persisted on the job record; derived from the id alone
pub fn download_path(job_id: Uuid) -> String {
    format!("/downloads/{}", result_file_name(job_id))
}

/// Vets a requested result filename and extracts the job id
///
/// Rejects path separators and parent-directory segments outright, then
/// requires the fixed prefix/suffix with a parseable UUID between them.
pub fn parse_result_name(requested: &str) -> Result<Uuid, DownloadError> {
    if requested.contains('/') || requested.contains('\\') || requested.contains("..") {
        return Err(DownloadError::InvalidName);
    }

    let stem = requested
        .strip_prefix(RESULT_PREFIX)
        .and_then(|rest| rest.strip_suffix(RESULT_SUFFIX))
        .ok_or(DownloadError::InvalidName)?;

    Uuid::parse_str(stem).map_err(|_| DownloadError::InvalidName)
}

/// A vetted, existing result file ready to be streamed
#[derive(Debug)]
pub struct ResolvedDownload {
    pub path: PathBuf,
    pub file_name: String,
}

/// Resolves a requested filename to a servable result file
///
/// Only files of completed jobs are served; a failed job's partial output
/// stays on disk but is never advertised or reachable here.
pub async fn resolve(
    lifecycle: &JobLifecycle,
    results_dir: &Path,
    requested: &str,
) -> Result<ResolvedDownload, DownloadError> {
    let job_id = parse_result_name(requested)?;

    let job = lifecycle.get(job_id).await.map_err(|err| match err {
        JobError::NotFound(_) => DownloadError::NotFound,
        JobError::DatabaseError(e) => DownloadError::DatabaseError(e),
        JobError::AccessDenied(_) => DownloadError::NotFound,
    })?;

    if job.status != JobStatus::Completed {
        tracing::debug!(job_id = %job_id, status = job.status.as_str(), "Refusing download for non-completed job");
        return Err(DownloadError::NotFound);
    }

    let file_name = result_file_name(job_id);
    let path = results_dir.join(&file_name);

    match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => Ok(ResolvedDownload { path, file_name }),
        Ok(_) => Err(DownloadError::NotFound),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(DownloadError::NotFound),
        Err(err) => Err(DownloadError::Io(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_canonical_names() {
        let id = Uuid::new_v4();
        let name = result_file_name(id);
        assert_eq!(parse_result_name(&name).unwrap(), id);
    }

    #[test]
    fn test_parse_rejects_traversal() {
        for name in [
            "../etc/passwd",
            "results-../../secret.csv",
            "results-..csv",
            "a/results-b.csv",
            "results-\\..\\x.csv",
            "..",
        ] {
            assert!(
                matches!(parse_result_name(name), Err(DownloadError::InvalidName)),
                "expected rejection: {name}"
            );
        }
    }

    #[test]
    fn test_parse_rejects_wrong_shape() {
        for name in [
            "",
            "results-.csv",
            "results-not-a-uuid.csv",
            "output-123.csv",
            "results-123.txt",
            &format!("{}", Uuid::new_v4()),
            &format!("results-{}.csv.bak", Uuid::new_v4()),
        ] {
            assert!(
                matches!(parse_result_name(name), Err(DownloadError::InvalidName)),
                "expected rejection: {name}"
            );
        }
    }

    #[test]
    fn test_download_path_is_derived_from_id_only() {
        let id = Uuid::new_v4();
        assert_eq!(download_path(id), format!("/downloads/results-{id}.csv"));
    }
}
