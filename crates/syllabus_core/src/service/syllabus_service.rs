//! Syllabus submission use-case service.
//!
//! # Responsibility
//! - Hand a finished draft to the repository and clear it on success.
//! - Seed editor sessions from stored syllabi for the edit flow.
//!
//! # Invariants
//! - The editor draft is reset only after the repository write succeeds.
//! - A failed submit leaves the draft exactly as it was, so callers can retry.

use crate::model::subject::Subject;
use crate::repo::syllabus_repo::{
    SyllabusRecord, SyllabusRepoError, SyllabusRepository, SyllabusSummary,
};
use crate::service::editor_service::{EditorError, SyllabusEditor};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Errors from syllabus submission and load operations.
#[derive(Debug)]
pub enum SyllabusServiceError {
    /// Draft could not be turned into a payload, or seed data was invalid.
    Editor(EditorError),
    /// No syllabus is stored for the subject.
    SyllabusNotFound(String),
    /// Repository-level failure.
    Repo(SyllabusRepoError),
}

impl Display for SyllabusServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Editor(err) => write!(f, "{err}"),
            Self::SyllabusNotFound(subject) => {
                write!(f, "syllabus not found for subject: {subject}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SyllabusServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Editor(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::SyllabusNotFound(_) => None,
        }
    }
}

impl From<EditorError> for SyllabusServiceError {
    fn from(value: EditorError) -> Self {
        Self::Editor(value)
    }
}

impl From<SyllabusRepoError> for SyllabusServiceError {
    fn from(value: SyllabusRepoError) -> Self {
        match value {
            SyllabusRepoError::NotFound(subject) => Self::SyllabusNotFound(subject),
            other => Self::Repo(other),
        }
    }
}

/// Syllabus service facade over repository implementations.
pub struct SyllabusService<R: SyllabusRepository> {
    repo: R,
}

impl<R: SyllabusRepository> SyllabusService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Builds the editor's payload, stores it, then clears the draft.
    ///
    /// # Errors
    /// - `Editor(Validation(..))` when the draft has no chapters or subject.
    /// - `Repo(..)` when the write fails; the draft is kept for a retry.
    pub fn submit(
        &self,
        editor: &mut SyllabusEditor,
    ) -> Result<SyllabusRecord, SyllabusServiceError> {
        let started_at = Instant::now();
        let payload = editor.build_submission_payload()?;

        match self.repo.save_syllabus(&payload) {
            Ok(record) => {
                editor.reset();
                info!(
                    "event=syllabus_submit module=service status=ok node_count={} duration_ms={}",
                    payload.node_count(),
                    started_at.elapsed().as_millis()
                );
                Ok(record)
            }
            Err(err) => {
                error!(
                    "event=syllabus_submit module=service status=error duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err.into())
            }
        }
    }

    /// Opens an edit-flow editor seeded from the stored syllabus.
    pub fn open_for_edit(
        &self,
        subjects: Vec<Subject>,
        subject: &str,
    ) -> Result<SyllabusEditor, SyllabusServiceError> {
        let record = self
            .repo
            .get_syllabus(subject)?
            .ok_or_else(|| SyllabusServiceError::SyllabusNotFound(subject.trim().to_string()))?;
        Ok(SyllabusEditor::from_payload(subjects, &record.payload)?)
    }

    /// Loads one stored syllabus.
    pub fn get_syllabus(
        &self,
        subject: &str,
    ) -> Result<Option<SyllabusRecord>, SyllabusServiceError> {
        self.repo.get_syllabus(subject).map_err(Into::into)
    }

    /// Lists stored syllabi sorted by subject.
    pub fn list_syllabi(&self) -> Result<Vec<SyllabusSummary>, SyllabusServiceError> {
        self.repo.list_syllabi().map_err(Into::into)
    }

    /// Deletes the stored syllabus for one subject.
    pub fn delete_syllabus(&self, subject: &str) -> Result<(), SyllabusServiceError> {
        self.repo.delete_syllabus(subject).map_err(Into::into)
    }
}
