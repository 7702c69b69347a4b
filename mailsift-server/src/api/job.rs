//! Job API Handlers
//!
//! HTTP endpoints for submitting uploads and polling job state.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::api::AppState;
use crate::api::error::{ApiError, ApiResult};
use crate::auth::AuthUser;
use mailsift_core::domain::job::Job;
use mailsift_core::dto::job::SubmitJobResponse;

/// POST /jobs
/// Accept a CSV upload and launch a validation job for it
///
/// The file is streamed to the staging directory chunk by chunk; the
/// response carries only the job id, everything else is polled.
pub async fn submit_job(
    State(state): State<AppState>,
    AuthUser(owner_id): AuthUser,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<SubmitJobResponse>)> {
    let mut staged: Option<(String, std::path::PathBuf)> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload.csv").to_string();
        let staging_path = state
            .config
            .upload_dir
            .join(format!("upload-{}.csv", Uuid::new_v4()));

        let mut file = tokio::fs::File::create(&staging_path)
            .await
            .map_err(|e| ApiError::InternalError(format!("Failed to stage upload: {e}")))?;

        let mut bytes_written: u64 = 0;
        loop {
            let chunk = match field.chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(e) => {
                    let _ = tokio::fs::remove_file(&staging_path).await;
                    return Err(ApiError::BadRequest(format!("Upload aborted: {e}")));
                }
            };
            bytes_written += chunk.len() as u64;
            if let Err(e) = file.write_all(&chunk).await {
                let _ = tokio::fs::remove_file(&staging_path).await;
                return Err(ApiError::InternalError(format!(
                    "Failed to stage upload: {e}"
                )));
            }
        }

        if let Err(e) = file.flush().await {
            let _ = tokio::fs::remove_file(&staging_path).await;
            return Err(ApiError::InternalError(format!(
                "Failed to stage upload: {e}"
            )));
        }

        if bytes_written == 0 {
            let _ = tokio::fs::remove_file(&staging_path).await;
            return Err(ApiError::BadRequest("Uploaded file is empty".to_string()));
        }

        staged = Some((file_name, staging_path));
        break;
    }

    let (file_name, input_path) = staged
        .ok_or_else(|| ApiError::BadRequest("No file field found in multipart data".to_string()))?;

    tracing::info!(owner_id, file_name, "Accepted upload");

    match state
        .dispatcher
        .submit(&owner_id, &file_name, input_path.clone())
        .await
    {
        Ok(job_id) => Ok((StatusCode::ACCEPTED, Json(SubmitJobResponse { job_id }))),
        Err(err) => {
            // Job was never created; the staged file has no owner now
            let _ = tokio::fs::remove_file(&input_path).await;
            Err(err.into())
        }
    }
}

/// GET /jobs/{id}
/// Get job details by ID; owners only
pub async fn get_job(
    State(state): State<AppState>,
    AuthUser(owner_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Job>> {
    tracing::debug!(job_id = %id, "Getting job");

    let job = state.lifecycle.get_owned(id, &owner_id).await?;

    Ok(Json(job))
}

/// GET /jobs
/// List the caller's most recent jobs, newest first
pub async fn list_jobs(
    State(state): State<AppState>,
    AuthUser(owner_id): AuthUser,
) -> ApiResult<Json<Vec<Job>>> {
    tracing::debug!(owner_id, "Listing recent jobs");

    let jobs = state.lifecycle.list_recent(&owner_id).await?;

    Ok(Json(jobs))
}
