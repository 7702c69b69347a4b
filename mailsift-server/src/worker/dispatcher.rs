//! Job Dispatcher
//!
//! Accepts a freshly staged upload, creates the job record, and launches
//! the transcode as a detached task. The spawned task is a failure
//! boundary: whatever goes wrong inside it is funneled into the job's
//! terminal state and never reaches the caller that submitted the job.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::service::download_service;
use crate::service::job::{JobError, JobLifecycle};
use crate::worker::transcoder;
use crate::worker::validator::RecordValidator;

#[derive(Clone)]
pub struct Dispatcher {
    lifecycle: JobLifecycle,
    validator: Arc<dyn RecordValidator>,
    results_dir: PathBuf,
    progress_batch_size: usize,
}

impl Dispatcher {
    pub fn new(
        lifecycle: JobLifecycle,
        validator: Arc<dyn RecordValidator>,
        config: &Config,
    ) -> Self {
        Self {
            lifecycle,
            validator,
            results_dir: config.results_dir.clone(),
            progress_batch_size: config.progress_batch_size,
        }
    }

    /// Creates the job record and returns its id immediately
    ///
    /// The transcode runs in a spawned task that the caller never awaits;
    /// exactly one task runs per submitted job.
    pub async fn submit(
        &self,
        owner_id: &str,
        file_name: &str,
        input_path: PathBuf,
    ) -> Result<Uuid, JobError> {
        let job = self.lifecycle.create(owner_id, file_name).await?;
        let job_id = job.id;

        let dispatcher = self.clone();
        tokio::spawn(async move {
            dispatcher.run_job(job_id, input_path).await;
        });

        Ok(job_id)
    }

    /// Runs one job to a terminal state
    ///
    /// The upload file is consumed exactly once and removed on every exit
    /// path, before the terminal transition is attempted, so a store
    /// hiccup cannot leak staged files.
    async fn run_job(&self, job_id: Uuid, input_path: PathBuf) {
        let output_path = self
            .results_dir
            .join(download_service::result_file_name(job_id));

        let result = transcoder::transcode(
            &input_path,
            &output_path,
            job_id,
            self.validator.as_ref(),
            &self.lifecycle,
            self.progress_batch_size,
        )
        .await;

        if let Err(err) = tokio::fs::remove_file(&input_path).await {
            warn!(job_id = %job_id, error = ?err, "Failed to remove upload file");
        }

        let transition = match result {
            Ok(stats) => {
                let url = download_service::download_path(job_id);
                self.lifecycle.complete(job_id, stats, &url).await
            }
            Err(err) => {
                let detail = format!("{err:#}");
                error!(job_id = %job_id, error = %detail, "Job processing failed");
                self.lifecycle.fail(job_id, &detail).await
            }
        };

        if let Err(err) = transition {
            // Last-resort logging: the retry inside the lifecycle already
            // happened, the job may appear stuck in processing.
            error!(job_id = %job_id, error = ?err, "Terminal transition was not recorded");
        }
    }
}
