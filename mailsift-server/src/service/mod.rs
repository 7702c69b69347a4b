//! Service Module
//!
//! Business logic layer. Services orchestrate between the repository and
//! the rest of the system; the job service is the only component that
//! mutates job state in the store.

pub mod download;
pub mod job;

// Re-export for convenience
pub use download as download_service;
pub use job as job_service;
