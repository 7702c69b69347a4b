//! Background worker
//!
//! Everything that happens after a job is accepted: the dispatcher spawns
//! one detached task per job, the transcoder streams records through a
//! pluggable validator, and progress flows back into the job store.

pub mod dispatcher;
pub mod transcoder;
pub mod validator;
