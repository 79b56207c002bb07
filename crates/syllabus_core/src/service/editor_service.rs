//! Syllabus tree editor use-case service.
//!
//! # Responsibility
//! - Own one in-memory `SyllabusDraft` plus the selectable subject list.
//! - Expose structural add/rename/delete/complete/move operations.
//! - Produce the submission payload from the current draft.
//!
//! # Invariants
//! - Every operation either fully applies or leaves the draft unchanged.
//! - Name checks run before path lookups; a blank name never mutates.
//! - Lookups are always fully qualified (chapter, topic, subtopic).
//! - Node names are never written to logs.

use crate::model::payload::{PayloadError, SubmissionPayload};
use crate::model::subject::{Subject, SubjectDirectory};
use crate::model::syllabus::{
    normalize_node_name, Chapter, DraftValidationError, NodeId, NodeKind, NodePath, SubjectId,
    Subtopic, SyllabusDraft, SyllabusNode, Topic,
};
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from syllabus editor operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    /// Node name is blank after trim.
    EmptyName(NodeKind),
    /// Some segment of the node path does not resolve.
    NotFound(NodePath),
    /// Path addresses a chapter, which has no completion flag.
    NoCompletionFlag(NodePath),
    /// Draft does not satisfy submit preconditions.
    Validation(DraftValidationError),
    /// Seed payload is structurally invalid.
    InvalidPayload(PayloadError),
}

impl EditorError {
    /// Stable machine-readable code for logs and FFI envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyName(_) => "empty_name",
            Self::NotFound(_) => "not_found",
            Self::NoCompletionFlag(_) => "no_completion_flag",
            Self::Validation(_) => "validation",
            Self::InvalidPayload(_) => "invalid_payload",
        }
    }
}

impl Display for EditorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName(kind) => write!(f, "{kind} name must not be blank"),
            Self::NotFound(path) => write!(f, "syllabus node not found: {path}"),
            Self::NoCompletionFlag(path) => {
                write!(f, "syllabus node has no completion flag: {path}")
            }
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidPayload(err) => write!(f, "{err}"),
        }
    }
}

impl Error for EditorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::InvalidPayload(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DraftValidationError> for EditorError {
    fn from(value: DraftValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<PayloadError> for EditorError {
    fn from(value: PayloadError) -> Self {
        Self::InvalidPayload(value)
    }
}

/// Editor session over one syllabus draft.
///
/// `new`/`with_subjects` open the add flow with an empty draft;
/// `from_payload` opens the edit flow seeded from existing data.
#[derive(Debug, Clone, Default)]
pub struct SyllabusEditor {
    draft: SyllabusDraft,
    subjects: SubjectDirectory,
}

impl SyllabusEditor {
    /// Creates an editor with an empty draft and no subject choices.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an editor with an empty draft and the given subject choices.
    pub fn with_subjects(subjects: Vec<Subject>) -> Self {
        Self {
            draft: SyllabusDraft::new(),
            subjects: SubjectDirectory::new(subjects),
        }
    }

    /// Creates an editor seeded from server-shaped data.
    ///
    /// The seeded draft gets fresh local ids and the payload's subject.
    pub fn from_payload(
        subjects: Vec<Subject>,
        payload: &SubmissionPayload,
    ) -> Result<Self, EditorError> {
        let draft = SyllabusDraft::from_payload(payload)?;
        debug!(
            "event=syllabus_seed module=editor status=ok node_count={}",
            draft.node_count()
        );
        Ok(Self {
            draft,
            subjects: SubjectDirectory::new(subjects),
        })
    }

    /// Replaces the selectable subject list. The draft is untouched.
    pub fn refresh_subjects(&mut self, subjects: Vec<Subject>) {
        self.subjects = SubjectDirectory::new(subjects);
    }

    pub fn subjects(&self) -> &SubjectDirectory {
        &self.subjects
    }

    /// Resolves the selected subject id against the subject list.
    pub fn selected_subject(&self) -> Option<&Subject> {
        self.draft
            .subject
            .as_deref()
            .and_then(|id| self.subjects.get(id))
    }

    /// Sets the draft subject, trimmed. Last call wins.
    ///
    /// A blank id clears the selection, so the draft reports
    /// `MissingSubject` until a real subject is chosen.
    pub fn select_subject(&mut self, subject_id: impl Into<SubjectId>) {
        let subject_id = subject_id.into();
        self.draft.subject = match subject_id.trim() {
            "" => None,
            trimmed => Some(trimmed.to_string()),
        };
    }

    pub fn subject(&self) -> Option<&str> {
        self.draft.subject.as_deref()
    }

    pub fn draft(&self) -> &SyllabusDraft {
        &self.draft
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.draft.chapters
    }

    pub fn node_count(&self) -> usize {
        self.draft.node_count()
    }

    pub fn is_submittable(&self) -> bool {
        self.draft.validate().is_ok()
    }

    /// Appends a chapter with an empty topic list.
    pub fn add_chapter(&mut self, name: impl Into<String>) -> Result<NodeId, EditorError> {
        let result = self.insert_chapter(name.into());
        log_edit("add", NodeKind::Chapter, &result);
        result
    }

    /// Appends an incomplete topic to one chapter.
    pub fn add_topic(
        &mut self,
        chapter_id: NodeId,
        name: impl Into<String>,
    ) -> Result<NodeId, EditorError> {
        let result = self.insert_topic(chapter_id, name.into());
        log_edit("add", NodeKind::Topic, &result);
        result
    }

    /// Appends an incomplete subtopic to one topic.
    pub fn add_subtopic(
        &mut self,
        chapter_id: NodeId,
        topic_id: NodeId,
        name: impl Into<String>,
    ) -> Result<NodeId, EditorError> {
        let result = self.insert_subtopic(chapter_id, topic_id, name.into());
        log_edit("add", NodeKind::Subtopic, &result);
        result
    }

    /// Replaces the name of one node. Children are untouched.
    pub fn rename_node(
        &mut self,
        path: &NodePath,
        name: impl Into<String>,
    ) -> Result<(), EditorError> {
        let result = self.apply_rename(path, name.into());
        log_edit("rename", path.kind(), &result);
        result
    }

    /// Removes one node together with all of its descendants.
    ///
    /// Deleting an already removed node fails with `NotFound`.
    pub fn delete_node(&mut self, path: &NodePath) -> Result<(), EditorError> {
        let result = self.apply_delete(path);
        log_edit("delete", path.kind(), &result);
        result
    }

    /// Sets `is_completed` on one topic or subtopic.
    pub fn set_completion(&mut self, path: &NodePath, completed: bool) -> Result<(), EditorError> {
        let result = self.apply_completion(path, completed);
        log_edit("complete", path.kind(), &result);
        result
    }

    /// Moves one node to `target_index` within its own sibling list.
    ///
    /// The index is clamped to the sibling range; the sibling set is kept.
    pub fn move_node(&mut self, path: &NodePath, target_index: usize) -> Result<(), EditorError> {
        let result = self.apply_move(path, target_index);
        log_edit("move", path.kind(), &result);
        result
    }

    /// Flattens the current draft into the wire payload.
    ///
    /// Fails with `Validation` when there are no chapters or no subject.
    /// The draft is never modified, so a failed submit can simply retry.
    pub fn build_submission_payload(&self) -> Result<SubmissionPayload, EditorError> {
        let result = self.draft.to_payload().map_err(EditorError::from);
        match &result {
            Ok(payload) => debug!(
                "event=syllabus_payload module=editor status=ok node_count={}",
                payload.node_count()
            ),
            Err(err) => debug!(
                "event=syllabus_payload module=editor status=error error_code={}",
                err.code()
            ),
        }
        result
    }

    /// Discards the draft. The subject list is kept.
    pub fn reset(&mut self) {
        self.draft = SyllabusDraft::new();
        debug!("event=syllabus_reset module=editor status=ok");
    }

    fn insert_chapter(&mut self, name: String) -> Result<NodeId, EditorError> {
        let name = required_name(&name, NodeKind::Chapter)?;
        let chapter = Chapter::new(name);
        let id = chapter.id;
        self.draft.chapters.push(chapter);
        Ok(id)
    }

    fn insert_topic(&mut self, chapter_id: NodeId, name: String) -> Result<NodeId, EditorError> {
        let name = required_name(&name, NodeKind::Topic)?;
        let chapter = self
            .draft
            .chapter_mut(chapter_id)
            .ok_or(EditorError::NotFound(NodePath::chapter(chapter_id)))?;
        let topic = Topic::new(name);
        let id = topic.id;
        chapter.topics.push(topic);
        Ok(id)
    }

    fn insert_subtopic(
        &mut self,
        chapter_id: NodeId,
        topic_id: NodeId,
        name: String,
    ) -> Result<NodeId, EditorError> {
        let name = required_name(&name, NodeKind::Subtopic)?;
        let chapter = self
            .draft
            .chapter_mut(chapter_id)
            .ok_or(EditorError::NotFound(NodePath::chapter(chapter_id)))?;
        let topic = chapter
            .topic_mut(topic_id)
            .ok_or(EditorError::NotFound(NodePath::topic(chapter_id, topic_id)))?;
        let subtopic = Subtopic::new(name);
        let id = subtopic.id;
        topic.subtopics.push(subtopic);
        Ok(id)
    }

    fn apply_rename(&mut self, path: &NodePath, name: String) -> Result<(), EditorError> {
        let name = required_name(&name, path.kind())?;
        let slot = self
            .name_slot_mut(path)
            .ok_or(EditorError::NotFound(*path))?;
        *slot = name;
        Ok(())
    }

    fn apply_delete(&mut self, path: &NodePath) -> Result<(), EditorError> {
        let removed = match *path {
            NodePath::Chapter { chapter } => remove_by_id(&mut self.draft.chapters, chapter),
            NodePath::Topic { chapter, topic } => self
                .draft
                .chapter_mut(chapter)
                .is_some_and(|item| remove_by_id(&mut item.topics, topic)),
            NodePath::Subtopic {
                chapter,
                topic,
                subtopic,
            } => self
                .draft
                .chapter_mut(chapter)
                .and_then(|item| item.topic_mut(topic))
                .is_some_and(|item| remove_by_id(&mut item.subtopics, subtopic)),
        };
        if removed {
            Ok(())
        } else {
            Err(EditorError::NotFound(*path))
        }
    }

    fn apply_completion(&mut self, path: &NodePath, completed: bool) -> Result<(), EditorError> {
        let slot = match *path {
            NodePath::Chapter { .. } => {
                if self.draft.contains(path) {
                    return Err(EditorError::NoCompletionFlag(*path));
                }
                None
            }
            NodePath::Topic { chapter, topic } => self
                .draft
                .chapter_mut(chapter)
                .and_then(|item| item.topic_mut(topic))
                .map(|item| &mut item.is_completed),
            NodePath::Subtopic {
                chapter,
                topic,
                subtopic,
            } => self
                .draft
                .chapter_mut(chapter)
                .and_then(|item| item.topic_mut(topic))
                .and_then(|item| item.subtopic_mut(subtopic))
                .map(|item| &mut item.is_completed),
        };
        let slot = slot.ok_or(EditorError::NotFound(*path))?;
        *slot = completed;
        Ok(())
    }

    fn apply_move(&mut self, path: &NodePath, target_index: usize) -> Result<(), EditorError> {
        let moved = match *path {
            NodePath::Chapter { chapter } => {
                move_by_id(&mut self.draft.chapters, chapter, target_index)
            }
            NodePath::Topic { chapter, topic } => self
                .draft
                .chapter_mut(chapter)
                .is_some_and(|item| move_by_id(&mut item.topics, topic, target_index)),
            NodePath::Subtopic {
                chapter,
                topic,
                subtopic,
            } => self
                .draft
                .chapter_mut(chapter)
                .and_then(|item| item.topic_mut(topic))
                .is_some_and(|item| move_by_id(&mut item.subtopics, subtopic, target_index)),
        };
        if moved {
            Ok(())
        } else {
            Err(EditorError::NotFound(*path))
        }
    }

    fn name_slot_mut(&mut self, path: &NodePath) -> Option<&mut String> {
        match *path {
            NodePath::Chapter { chapter } => {
                self.draft.chapter_mut(chapter).map(|item| &mut item.name)
            }
            NodePath::Topic { chapter, topic } => self
                .draft
                .chapter_mut(chapter)?
                .topic_mut(topic)
                .map(|item| &mut item.name),
            NodePath::Subtopic {
                chapter,
                topic,
                subtopic,
            } => self
                .draft
                .chapter_mut(chapter)?
                .topic_mut(topic)?
                .subtopic_mut(subtopic)
                .map(|item| &mut item.name),
        }
    }
}

fn required_name(value: &str, kind: NodeKind) -> Result<String, EditorError> {
    normalize_node_name(value).ok_or(EditorError::EmptyName(kind))
}

fn position_of<T: SyllabusNode>(items: &[T], id: NodeId) -> Option<usize> {
    items.iter().position(|item| item.id() == id)
}

fn remove_by_id<T: SyllabusNode>(items: &mut Vec<T>, id: NodeId) -> bool {
    match position_of(items, id) {
        Some(index) => {
            items.remove(index);
            true
        }
        None => false,
    }
}

fn move_by_id<T: SyllabusNode>(items: &mut Vec<T>, id: NodeId, target_index: usize) -> bool {
    let Some(from) = position_of(items, id) else {
        return false;
    };
    let item = items.remove(from);
    let target = target_index.min(items.len());
    items.insert(target, item);
    true
}

fn log_edit<T>(op: &str, kind: NodeKind, result: &Result<T, EditorError>) {
    match result {
        Ok(_) => debug!("event=syllabus_edit module=editor op={op} kind={kind} status=ok"),
        Err(err) => debug!(
            "event=syllabus_edit module=editor op={op} kind={kind} status=error error_code={}",
            err.code()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::{move_by_id, EditorError, SyllabusEditor};
    use crate::model::syllabus::{NodeKind, NodePath};

    #[test]
    fn move_by_id_clamps_target_and_keeps_sibling_set() {
        let mut editor = SyllabusEditor::new();
        let a = editor.add_chapter("A").unwrap();
        let b = editor.add_chapter("B").unwrap();
        let c = editor.add_chapter("C").unwrap();

        let mut chapters = editor.chapters().to_vec();
        assert!(move_by_id(&mut chapters, a, 99));
        let ids: Vec<_> = chapters.iter().map(|item| item.id).collect();
        assert_eq!(ids, vec![b, c, a]);
    }

    #[test]
    fn add_trims_name_and_keeps_inner_text() {
        let mut editor = SyllabusEditor::new();
        let id = editor.add_chapter("  C++   Basics\tPart  1 ").unwrap();
        assert_eq!(
            editor.draft().node_name(&NodePath::chapter(id)),
            Some("C++   Basics\tPart  1")
        );
    }

    #[test]
    fn select_subject_trims_and_blank_clears() {
        let mut editor = SyllabusEditor::new();
        editor.select_subject(" math-9 ");
        assert_eq!(editor.subject(), Some("math-9"));

        editor.select_subject("   ");
        assert_eq!(editor.subject(), None);
    }

    #[test]
    fn empty_name_is_checked_before_chapter_lookup() {
        let mut editor = SyllabusEditor::new();
        let err = editor.add_topic(uuid::Uuid::new_v4(), " ").unwrap_err();
        assert_eq!(err, EditorError::EmptyName(NodeKind::Topic));
    }

    #[test]
    fn error_codes_are_stable() {
        let path = NodePath::chapter(uuid::Uuid::nil());
        assert_eq!(EditorError::NotFound(path).code(), "not_found");
        assert_eq!(
            EditorError::EmptyName(NodeKind::Chapter).code(),
            "empty_name"
        );
        assert_eq!(EditorError::NoCompletionFlag(path).code(), "no_completion_flag");
    }
}
