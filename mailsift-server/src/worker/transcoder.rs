//! Streaming Transcoder
//!
//! Reads the uploaded CSV record-by-record, classifies each record, and
//! writes it to the result file with two trailing columns appended. Only a
//! single record is held in memory at a time; output order equals input
//! order. Progress is pushed through a `ProgressSink` every N records on a
//! best-effort basis.

use anyhow::Context;
use async_trait::async_trait;
use std::path::Path;
use uuid::Uuid;

use crate::service::job::JobLifecycle;
use crate::worker::validator::RecordValidator;
use mailsift_core::domain::job::JobStats;
use mailsift_core::dto::job::ProgressUpdate;
use mailsift_core::validate::Outcome;

pub const STATUS_COLUMN: &str = "Validation Status";
pub const REASON_COLUMN: &str = "Validation Reason";

/// Where incremental progress goes
///
/// Implementations must swallow their own failures: a missed advisory
/// update never aborts the job.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn push(&self, job_id: Uuid, update: ProgressUpdate);
}

#[async_trait]
impl ProgressSink for JobLifecycle {
    async fn push(&self, job_id: Uuid, update: ProgressUpdate) {
        self.report_progress(job_id, update).await;
    }
}

/// Locates the email column: case-insensitive substring match on "email"
/// in the header, falling back to the first column. A missing match is a
/// normal input condition, not an error.
pub fn email_column_index(headers: &csv_async::StringRecord) -> usize {
    headers
        .iter()
        .position(|h| h.to_ascii_lowercase().contains("email"))
        .unwrap_or(0)
}

/// Streams the upload through the validator into the result file.
///
/// On success the result file is flushed and fsynced before the final
/// stats are returned. On a read or write error the partial output is
/// still finalized and kept on disk, and the error propagates to the
/// dispatcher's failure boundary.
pub async fn transcode(
    input_path: &Path,
    output_path: &Path,
    job_id: Uuid,
    validator: &dyn RecordValidator,
    sink: &dyn ProgressSink,
    batch_size: usize,
) -> anyhow::Result<JobStats> {
    let input = tokio::fs::File::open(input_path)
        .await
        .with_context(|| format!("open upload file {}", input_path.display()))?;
    let output = tokio::fs::File::create(output_path)
        .await
        .with_context(|| format!("create results file {}", output_path.display()))?;

    let mut rdr = csv_async::AsyncReader::from_reader(input);
    let mut wtr = csv_async::AsyncWriter::from_writer(output);

    let result = copy_records(&mut rdr, &mut wtr, job_id, validator, sink, batch_size).await;

    // Finalize on both paths: a failed job keeps its partial output, it is
    // just never advertised as complete.
    match result {
        Ok(stats) => {
            finalize(wtr).await?;
            tracing::info!(
                job_id = %job_id,
                processed = stats.total(),
                valid = stats.valid,
                invalid = stats.invalid,
                risky = stats.risky,
                "Transcode finished"
            );
            Ok(stats)
        }
        Err(err) => {
            if let Err(flush_err) = finalize(wtr).await {
                tracing::warn!(
                    job_id = %job_id,
                    error = format!("{flush_err:#}"),
                    "Failed to finalize partial results file"
                );
            }
            Err(err)
        }
    }
}

async fn copy_records(
    rdr: &mut csv_async::AsyncReader<tokio::fs::File>,
    wtr: &mut csv_async::AsyncWriter<tokio::fs::File>,
    job_id: Uuid,
    validator: &dyn RecordValidator,
    sink: &dyn ProgressSink,
    batch_size: usize,
) -> anyhow::Result<JobStats> {
    let headers = rdr.headers().await.context("read header row")?.clone();
    let email_idx = email_column_index(&headers);

    let mut out_headers = headers.clone();
    out_headers.push_field(STATUS_COLUMN);
    out_headers.push_field(REASON_COLUMN);
    wtr.write_record(&out_headers)
        .await
        .context("write header row")?;

    let mut stats = JobStats::default();
    let mut record = csv_async::StringRecord::new();

    while rdr
        .read_record(&mut record)
        .await
        .context("read input record")?
    {
        let candidate = record.get(email_idx).unwrap_or("");
        let outcome = validator.validate(candidate).await;

        match outcome.status {
            Outcome::Valid => stats.valid += 1,
            Outcome::Invalid => stats.invalid += 1,
            Outcome::Risky => stats.risky += 1,
        }

        let mut out = record.clone();
        out.push_field(outcome.status.as_str());
        out.push_field(outcome.reason.as_deref().unwrap_or(""));
        wtr.write_record(&out).await.context("write output record")?;

        let processed = stats.total();
        if processed % batch_size as i64 == 0 {
            sink.push(
                job_id,
                ProgressUpdate {
                    processed_count: processed,
                    stats,
                },
            )
            .await;
        }
    }

    Ok(stats)
}

/// Flushes the writer and waits for the bytes to be durable on disk.
async fn finalize(mut wtr: csv_async::AsyncWriter<tokio::fs::File>) -> anyhow::Result<()> {
    wtr.flush().await.context("flush results file")?;
    let file = wtr.into_inner().await.context("release results file")?;
    file.sync_all().await.context("sync results file")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::validator::SyntaxValidator;
    use std::sync::Mutex;

    struct RecordingSink(Mutex<Vec<ProgressUpdate>>);

    #[async_trait]
    impl ProgressSink for RecordingSink {
        async fn push(&self, _job_id: Uuid, update: ProgressUpdate) {
            self.0.lock().unwrap().push(update);
        }
    }

    async fn run(input: &str, batch_size: usize) -> (anyhow::Result<JobStats>, Vec<ProgressUpdate>, String) {
        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("in.csv");
        let output_path = dir.path().join("out.csv");
        std::fs::write(&input_path, input).unwrap();

        let sink = RecordingSink(Mutex::new(Vec::new()));
        let result = transcode(
            &input_path,
            &output_path,
            Uuid::new_v4(),
            &SyntaxValidator,
            &sink,
            batch_size,
        )
        .await;

        let output = std::fs::read_to_string(&output_path).unwrap_or_default();
        (result, sink.0.into_inner().unwrap(), output)
    }

    #[test]
    fn test_email_column_heuristic() {
        let headers = csv_async::StringRecord::from(vec!["Name", "Work Email", "Phone"]);
        assert_eq!(email_column_index(&headers), 1);

        let headers = csv_async::StringRecord::from(vec!["EMAIL_ADDRESS", "Name"]);
        assert_eq!(email_column_index(&headers), 0);

        // No match falls back to the first column
        let headers = csv_async::StringRecord::from(vec!["a", "b", "c"]);
        assert_eq!(email_column_index(&headers), 0);
    }

    #[tokio::test]
    async fn test_three_row_scenario() {
        let input = "name,email\nalice,a@b.com\nbob,not-an-email\ncarol,\n";
        let (result, _, output) = run(input, 10).await;

        let stats = result.unwrap();
        assert_eq!(stats.valid, 1);
        assert_eq!(stats.invalid, 2);
        assert_eq!(stats.risky, 0);
        assert_eq!(stats.total(), 3);

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "name,email,Validation Status,Validation Reason");
        assert!(lines[1].starts_with("alice,a@b.com,Valid"));
        assert!(lines[2].starts_with("bob,not-an-email,Invalid,"));
        // The email-less record is still a normal row, just Invalid
        assert!(lines[3].starts_with("carol,,Invalid,"));
    }

    #[tokio::test]
    async fn test_output_preserves_order_and_columns() {
        let input = "id,contact email,city\n1,x@y.io,Bern\n2,z@w.org,Basel\n";
        let (result, _, output) = run(input, 10).await;
        result.unwrap();

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[1], "1,x@y.io,Bern,Valid,");
        assert_eq!(lines[2], "2,z@w.org,Basel,Valid,");
    }

    #[tokio::test]
    async fn test_progress_cadence_is_cumulative() {
        let input = "email\na@b.com\nc@d.com\ne@f.com\nbad\ng@h.com\n";
        let (result, updates, _) = run(input, 2).await;

        let stats = result.unwrap();
        assert_eq!(stats.total(), 5);

        // Pushed at 2 and 4; final stats go through the terminal transition
        let counts: Vec<i64> = updates.iter().map(|u| u.processed_count).collect();
        assert_eq!(counts, vec![2, 4]);
        assert_eq!(updates[1].stats.total(), 4);
        assert_eq!(updates[1].stats.invalid, 1);
    }

    #[tokio::test]
    async fn test_ragged_input_fails_but_keeps_partial_output() {
        let input = "email\na@b.com\none,two,three\nc@d.com\n";
        let (result, _, output) = run(input, 10).await;

        assert!(result.is_err());

        // Everything read before the bad record survives on disk
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("a@b.com,Valid"));
    }

    #[tokio::test]
    async fn test_missing_input_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let sink = RecordingSink(Mutex::new(Vec::new()));
        let result = transcode(
            &dir.path().join("nope.csv"),
            &dir.path().join("out.csv"),
            Uuid::new_v4(),
            &SyntaxValidator,
            &sink,
            10,
        )
        .await;
        assert!(result.is_err());
    }
}
