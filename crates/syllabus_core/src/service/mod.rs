//! Core use-case services.
//!
//! # Responsibility
//! - `editor_service`: in-memory structural editing of one syllabus draft.
//! - `syllabus_service`: submit/load orchestration over a repository.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod editor_service;
pub mod syllabus_service;
