//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the backend-facing contract that accepts submitted syllabi.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes validate payloads before any SQL mutation.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod syllabus_repo;
