//! Download API Handler
//!
//! Streams completed result files back to the caller. All name vetting
//! happens in the retrieval gateway before any filesystem access.

use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;

use crate::api::AppState;
use crate::api::error::{ApiError, ApiResult};
use crate::service::download_service::{self, DownloadError};

/// GET /downloads/{filename}
/// Stream a completed job's result file
pub async fn download_result(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ApiResult<Response> {
    let resolved =
        download_service::resolve(&state.lifecycle, &state.config.results_dir, &filename)
            .await
            .map_err(|err| match err {
                DownloadError::InvalidName => {
                    ApiError::BadRequest("Invalid result filename".to_string())
                }
                DownloadError::NotFound => {
                    ApiError::NotFound("Result file not found".to_string())
                }
                DownloadError::DatabaseError(e) => ApiError::DatabaseError(e),
                DownloadError::Io(e) => {
                    ApiError::InternalError(format!("Filesystem error: {e}"))
                }
            })?;

    let file = tokio::fs::File::open(&resolved.path)
        .await
        .map_err(|e| ApiError::InternalError(format!("Failed to open result file: {e}")))?;

    tracing::debug!(file = %resolved.file_name, "Streaming result file");

    let body = Body::from_stream(ReaderStream::new(file));
    let headers = [
        (header::CONTENT_TYPE, "text/csv".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", resolved.file_name),
        ),
    ];

    Ok((headers, body).into_response())
}
