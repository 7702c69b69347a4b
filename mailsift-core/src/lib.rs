//! Mailsift Core
//!
//! Core types and abstractions for the Mailsift bulk email validation
//! service.
//!
//! This crate contains:
//! - Domain types: Core business entities (Job, JobStats, etc.)
//! - DTOs: Data transfer objects for the HTTP surface
//! - Validation: The pure email syntax classifier

pub mod domain;
pub mod dto;
pub mod validate;
