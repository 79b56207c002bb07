//! Syllabus draft tree model.
//!
//! # Responsibility
//! - Define the Chapter -> Topic -> Subtopic tree held by one editor session.
//! - Resolve fully qualified node paths without assuming global id uniqueness.
//! - Flatten a draft into the id-free submission payload.
//!
//! # Invariants
//! - Node ids are unique within their sibling collection and never reused.
//! - Committed names are trimmed and never empty; inner text is kept as typed.
//! - A draft is submittable only with a subject and at least one chapter.

use crate::model::payload::{
    ChapterPayload, PayloadError, SubmissionPayload, SubtopicPayload, TopicPayload,
};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Locally generated node identifier.
///
/// Generated with `Uuid::new_v4()`, so ids never collide across fast
/// successive adds and are never handed out twice.
pub type NodeId = Uuid;

/// Opaque subject identifier supplied by the subject directory.
pub type SubjectId = String;

/// Tree level of one syllabus node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Chapter,
    Topic,
    Subtopic,
}

impl NodeKind {
    /// Stable lowercase label used in logs and FFI input.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chapter => "chapter",
            Self::Topic => "topic",
            Self::Subtopic => "subtopic",
        }
    }

    /// Parses a kind label. Surrounding whitespace is ignored.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "chapter" => Some(Self::Chapter),
            "topic" => Some(Self::Topic),
            "subtopic" => Some(Self::Subtopic),
            _ => None,
        }
    }
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully qualified address of one node.
///
/// Lookups always walk chapter, then topic, then subtopic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodePath {
    Chapter {
        chapter: NodeId,
    },
    Topic {
        chapter: NodeId,
        topic: NodeId,
    },
    Subtopic {
        chapter: NodeId,
        topic: NodeId,
        subtopic: NodeId,
    },
}

impl NodePath {
    pub fn chapter(chapter: NodeId) -> Self {
        Self::Chapter { chapter }
    }

    pub fn topic(chapter: NodeId, topic: NodeId) -> Self {
        Self::Topic { chapter, topic }
    }

    pub fn subtopic(chapter: NodeId, topic: NodeId, subtopic: NodeId) -> Self {
        Self::Subtopic {
            chapter,
            topic,
            subtopic,
        }
    }

    /// Builds a path from a kind plus optional id segments.
    ///
    /// Returns `None` when a segment required by `kind` is missing. Extra
    /// segments beyond the kind's depth are ignored.
    pub fn from_parts(
        kind: NodeKind,
        chapter: NodeId,
        topic: Option<NodeId>,
        subtopic: Option<NodeId>,
    ) -> Option<Self> {
        match kind {
            NodeKind::Chapter => Some(Self::chapter(chapter)),
            NodeKind::Topic => topic.map(|topic| Self::topic(chapter, topic)),
            NodeKind::Subtopic => match (topic, subtopic) {
                (Some(topic), Some(subtopic)) => Some(Self::subtopic(chapter, topic, subtopic)),
                _ => None,
            },
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Chapter { .. } => NodeKind::Chapter,
            Self::Topic { .. } => NodeKind::Topic,
            Self::Subtopic { .. } => NodeKind::Subtopic,
        }
    }

    /// Id of the addressed node itself (last path segment).
    pub fn node_id(&self) -> NodeId {
        match *self {
            Self::Chapter { chapter } => chapter,
            Self::Topic { topic, .. } => topic,
            Self::Subtopic { subtopic, .. } => subtopic,
        }
    }
}

impl Display for NodePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Chapter { chapter } => write!(f, "chapter {chapter}"),
            Self::Topic { chapter, topic } => write!(f, "topic {chapter}/{topic}"),
            Self::Subtopic {
                chapter,
                topic,
                subtopic,
            } => write!(f, "subtopic {chapter}/{topic}/{subtopic}"),
        }
    }
}

/// Shared read access over the three node types.
pub trait SyllabusNode {
    fn id(&self) -> NodeId;
    fn name(&self) -> &str;
}

/// Leaf node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subtopic {
    pub id: NodeId,
    pub name: String,
    pub is_completed: bool,
}

impl Subtopic {
    pub(crate) fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            is_completed: false,
        }
    }
}

/// Middle node with an ordered subtopic list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    pub id: NodeId,
    pub name: String,
    pub is_completed: bool,
    pub subtopics: Vec<Subtopic>,
}

impl Topic {
    pub(crate) fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            is_completed: false,
            subtopics: Vec::new(),
        }
    }

    pub fn subtopic(&self, id: NodeId) -> Option<&Subtopic> {
        self.subtopics.iter().find(|item| item.id == id)
    }

    pub(crate) fn subtopic_mut(&mut self, id: NodeId) -> Option<&mut Subtopic> {
        self.subtopics.iter_mut().find(|item| item.id == id)
    }
}

/// Root-level node. Chapters carry no completion flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub id: NodeId,
    pub name: String,
    pub topics: Vec<Topic>,
}

impl Chapter {
    pub(crate) fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            topics: Vec::new(),
        }
    }

    pub fn topic(&self, id: NodeId) -> Option<&Topic> {
        self.topics.iter().find(|item| item.id == id)
    }

    pub(crate) fn topic_mut(&mut self, id: NodeId) -> Option<&mut Topic> {
        self.topics.iter_mut().find(|item| item.id == id)
    }
}

impl SyllabusNode for Chapter {
    fn id(&self) -> NodeId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl SyllabusNode for Topic {
    fn id(&self) -> NodeId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl SyllabusNode for Subtopic {
    fn id(&self) -> NodeId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Reasons a draft cannot be submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftValidationError {
    /// Draft has no chapters.
    NoChapters,
    /// No subject has been selected.
    MissingSubject,
}

impl Display for DraftValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoChapters => write!(f, "syllabus must contain at least one chapter"),
            Self::MissingSubject => write!(f, "syllabus subject must be selected"),
        }
    }
}

impl Error for DraftValidationError {}

/// In-memory, not-yet-submitted syllabus tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyllabusDraft {
    pub subject: Option<SubjectId>,
    pub chapters: Vec<Chapter>,
}

impl SyllabusDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a draft from server-shaped data.
    ///
    /// Every node gets a fresh local id; names are normalized the same way
    /// as interactive adds.
    pub fn from_payload(payload: &SubmissionPayload) -> Result<Self, PayloadError> {
        payload.validate()?;

        let mut chapters = Vec::with_capacity(payload.chapters.len());
        for chapter_payload in &payload.chapters {
            let mut chapter = Chapter::new(payload_name(&chapter_payload.name, NodeKind::Chapter)?);
            for topic_payload in &chapter_payload.topics {
                let mut topic = Topic::new(payload_name(&topic_payload.name, NodeKind::Topic)?);
                topic.is_completed = topic_payload.is_completed;
                for subtopic_payload in &topic_payload.subtopics {
                    let mut subtopic =
                        Subtopic::new(payload_name(&subtopic_payload.name, NodeKind::Subtopic)?);
                    subtopic.is_completed = subtopic_payload.is_completed;
                    topic.subtopics.push(subtopic);
                }
                chapter.topics.push(topic);
            }
            chapters.push(chapter);
        }

        Ok(Self {
            subject: Some(payload.subject.trim().to_string()),
            chapters,
        })
    }

    pub fn chapter(&self, id: NodeId) -> Option<&Chapter> {
        self.chapters.iter().find(|item| item.id == id)
    }

    pub(crate) fn chapter_mut(&mut self, id: NodeId) -> Option<&mut Chapter> {
        self.chapters.iter_mut().find(|item| item.id == id)
    }

    /// Returns whether `path` resolves to a node in this draft.
    pub fn contains(&self, path: &NodePath) -> bool {
        match *path {
            NodePath::Chapter { chapter } => self.chapter(chapter).is_some(),
            NodePath::Topic { chapter, topic } => self
                .chapter(chapter)
                .and_then(|item| item.topic(topic))
                .is_some(),
            NodePath::Subtopic {
                chapter,
                topic,
                subtopic,
            } => self
                .chapter(chapter)
                .and_then(|item| item.topic(topic))
                .and_then(|item| item.subtopic(subtopic))
                .is_some(),
        }
    }

    /// Resolves `path` to the addressed node's name.
    pub fn node_name(&self, path: &NodePath) -> Option<&str> {
        match *path {
            NodePath::Chapter { chapter } => {
                self.chapter(chapter).map(|item| item.name.as_str())
            }
            NodePath::Topic { chapter, topic } => self
                .chapter(chapter)
                .and_then(|item| item.topic(topic))
                .map(|item| item.name.as_str()),
            NodePath::Subtopic {
                chapter,
                topic,
                subtopic,
            } => self
                .chapter(chapter)
                .and_then(|item| item.topic(topic))
                .and_then(|item| item.subtopic(subtopic))
                .map(|item| item.name.as_str()),
        }
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

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    /// Checks submit preconditions. An empty chapter list is reported first.
    ///
    /// A subject that is blank after trim counts as missing.
    pub fn validate(&self) -> Result<(), DraftValidationError> {
        if self.chapters.is_empty() {
            return Err(DraftValidationError::NoChapters);
        }
        if self.subject.as_deref().map_or(true, |subject| subject.trim().is_empty()) {
            return Err(DraftValidationError::MissingSubject);
        }
        Ok(())
    }

    /// Flattens the draft into the wire payload. Local ids are dropped.
    pub fn to_payload(&self) -> Result<SubmissionPayload, DraftValidationError> {
        self.validate()?;
        let subject = self
            .subject
            .as_deref()
            .map(|subject| subject.trim().to_string())
            .ok_or(DraftValidationError::MissingSubject)?;

        let chapters = self
            .chapters
            .iter()
            .map(|chapter| ChapterPayload {
                name: chapter.name.clone(),
                topics: chapter
                    .topics
                    .iter()
                    .map(|topic| TopicPayload {
                        name: topic.name.clone(),
                        is_completed: topic.is_completed,
                        subtopics: topic
                            .subtopics
                            .iter()
                            .map(|subtopic| SubtopicPayload {
                                name: subtopic.name.clone(),
                                is_completed: subtopic.is_completed,
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();

        Ok(SubmissionPayload { subject, chapters })
    }
}

/// Normalizes a user-entered node name.
///
/// Only surrounding whitespace is removed. Returns `None` when nothing is left.
pub fn normalize_node_name(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn payload_name(value: &str, kind: NodeKind) -> Result<String, PayloadError> {
    normalize_node_name(value).ok_or(PayloadError::EmptyName(kind))
}
