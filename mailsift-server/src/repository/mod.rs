//! Repository Module
//!
//! Data access layer for the job metadata store.
//! All SQL for the jobs table lives here; nothing above this layer builds
//! queries.

pub mod job;

// Re-export for convenience
pub use job as job_repository;
