//! Core domain types
//!
//! This module contains the core domain structures used across the Mailsift
//! service. These types represent the fundamental business entities and are
//! shared between the API layer (for responses) and the worker (for
//! progress accounting).

pub mod job;
