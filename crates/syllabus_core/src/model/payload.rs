//! Submission payload wire model.
//!
//! # Responsibility
//! - Define the id-free nested shape exchanged with the syllabus backend.
//! - Validate server-shaped payloads before they seed an editor.
//!
//! # Invariants
//! - Field names are fixed: `subject`, `chapters`, `name`, `topics`,
//!   `is_completed`, `subtopics`.
//! - Every field is required on deserialize; `null` names are rejected.

use crate::model::syllabus::{NodeKind, SubjectId};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Flattened syllabus sent to (and received from) the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    pub subject: SubjectId,
    pub chapters: Vec<ChapterPayload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterPayload {
    pub name: String,
    pub topics: Vec<TopicPayload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicPayload {
    pub name: String,
    pub is_completed: bool,
    pub subtopics: Vec<SubtopicPayload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtopicPayload {
    pub name: String,
    pub is_completed: bool,
}

/// Structural problems in a payload received from outside the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadError {
    /// `subject` is blank after trim.
    EmptySubject,
    /// A node name is blank after trim.
    EmptyName(NodeKind),
}

impl Display for PayloadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptySubject => write!(f, "payload subject must not be blank"),
            Self::EmptyName(kind) => write!(f, "payload {kind} name must not be blank"),
        }
    }
}

impl Error for PayloadError {}

impl SubmissionPayload {
    /// Checks that the subject and every node name are non-blank.
    ///
    /// An empty chapter list is allowed here; submit-time rules live on the
    /// draft.
    pub fn validate(&self) -> Result<(), PayloadError> {
        if self.subject.trim().is_empty() {
            return Err(PayloadError::EmptySubject);
        }
        for chapter in &self.chapters {
            ensure_name(&chapter.name, NodeKind::Chapter)?;
            for topic in &chapter.topics {
                ensure_name(&topic.name, NodeKind::Topic)?;
                for subtopic in &topic.subtopics {
                    ensure_name(&subtopic.name, NodeKind::Subtopic)?;
                }
            }
        }
        Ok(())
    }

    /// Total number of chapters, topics and subtopics.
    pub fn node_count(&self) -> usize {
        self.chapters
            .iter()
            .map(|chapter| {
                1 + chapter
                    .topics
                    .iter()
                    .map(|topic| 1 + topic.subtopics.len())
                    .sum::<usize>()
            })
            .sum()
    }
}

fn ensure_name(value: &str, kind: NodeKind) -> Result<(), PayloadError> {
    if value.trim().is_empty() {
        return Err(PayloadError::EmptyName(kind));
    }
    Ok(())
}
