//! Data Transfer Objects for the HTTP surface
//!
//! DTOs are lightweight representations of domain entities optimized for
//! the wire, kept separate so the persisted shape can evolve independently
//! of the API contract.

pub mod job;
