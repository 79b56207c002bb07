//! Subject choices supplied by the subject directory service.

use crate::model::syllabus::SubjectId;
use serde::{Deserialize, Serialize};

/// One selectable subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub subject_name: String,
}

impl Subject {
    pub fn new(id: impl Into<SubjectId>, subject_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            subject_name: subject_name.into(),
        }
    }
}

/// Read-only subject list.
///
/// Kept exactly as supplied; order and duplicates are the directory's concern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectDirectory {
    subjects: Vec<Subject>,
}

impl SubjectDirectory {
    pub fn new(subjects: Vec<Subject>) -> Self {
        Self { subjects }
    }

    /// Returns the first subject with a matching id.
    pub fn get(&self, id: &str) -> Option<&Subject> {
        self.subjects.iter().find(|subject| subject.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}
