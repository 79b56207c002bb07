//! Core domain logic for the syllabus tree editor.
//! This crate is the single source of truth for draft-tree invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LogLevel};
pub use model::payload::{
    ChapterPayload, PayloadError, SubmissionPayload, SubtopicPayload, TopicPayload,
};
pub use model::subject::{Subject, SubjectDirectory};
pub use model::syllabus::{
    normalize_node_name, Chapter, DraftValidationError, NodeId, NodeKind, NodePath, SubjectId,
    Subtopic, SyllabusDraft, SyllabusNode, Topic,
};
pub use repo::syllabus_repo::{
    SqliteSyllabusRepository, SyllabusId, SyllabusRecord, SyllabusRepoError, SyllabusRepoResult,
    SyllabusRepository, SyllabusSummary,
};
pub use service::editor_service::{EditorError, SyllabusEditor};
pub use service::syllabus_service::{SyllabusService, SyllabusServiceError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
