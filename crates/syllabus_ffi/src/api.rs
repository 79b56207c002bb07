//! FFI use-case API for the Flutter syllabus editor screens.
//!
//! # Responsibility
//! - Expose one process-wide editor session to Dart via FRB.
//! - Translate string ids and kind labels into typed node paths.
//! - Hand finished drafts to the local syllabus store.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every edit call reports through a stable response envelope.
//! - Node names never appear in log lines.

use log::{info, warn};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};
use syllabus_core::db::open_db;
use syllabus_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    EditorError, NodeId, NodeKind, NodePath, SqliteSyllabusRepository, Subject, SyllabusEditor,
    SyllabusService, SyllabusServiceError,
};
use uuid::Uuid;

const SYLLABUS_DB_FILE_NAME: &str = "syllabus_editor.sqlite3";
static SYLLABUS_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static EDITOR_SESSION: Mutex<Option<SyllabusEditor>> = Mutex::new(None);

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Subject choice supplied by the Dart subject directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectItem {
    pub id: String,
    pub subject_name: String,
}

/// Response envelope for editor commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Id of the created node (add calls only).
    pub node_id: Option<String>,
    /// Stable machine-readable failure code.
    pub error_code: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl EditorActionResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            node_id: None,
            error_code: None,
            message: message.into(),
        }
    }

    fn created(message: impl Into<String>, node_id: NodeId) -> Self {
        Self {
            node_id: Some(node_id.to_string()),
            ..Self::success(message)
        }
    }

    fn failure(failure: FfiFailure) -> Self {
        Self {
            ok: false,
            node_id: None,
            error_code: Some(failure.code.to_string()),
            message: failure.message,
        }
    }
}

/// Response envelope carrying a JSON-encoded submission payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorPayloadResponse {
    pub ok: bool,
    /// Payload JSON in backend wire shape.
    pub payload_json: Option<String>,
    pub error_code: Option<String>,
    pub message: String,
}

impl EditorPayloadResponse {
    fn failure(failure: FfiFailure) -> Self {
        Self {
            ok: false,
            payload_json: None,
            error_code: Some(failure.code.to_string()),
            message: failure.message,
        }
    }
}

struct FfiFailure {
    code: &'static str,
    message: String,
}

impl FfiFailure {
    fn new(op: &str, code: &'static str, detail: impl std::fmt::Display) -> Self {
        warn!("event=ffi_call module=ffi op={op} status=error error_code={code}");
        Self {
            code,
            message: format!("{op} failed: {detail}"),
        }
    }

    fn editor(op: &str, err: EditorError) -> Self {
        Self::new(op, err.code(), err)
    }

    fn service(op: &str, err: SyllabusServiceError) -> Self {
        match err {
            SyllabusServiceError::Editor(inner) => Self::editor(op, inner),
            SyllabusServiceError::SyllabusNotFound(_) => Self::new(op, "not_found", err),
            SyllabusServiceError::Repo(_) => Self::new(op, "store", err),
        }
    }
}

/// Opens a fresh add-flow session, replacing any previous one.
///
/// # FFI contract
/// - Sync call, in-memory only.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_open(subjects: Vec<SubjectItem>) -> EditorActionResponse {
    *lock_session() = Some(SyllabusEditor::with_subjects(to_subjects(subjects)));
    info!("event=editor_open module=ffi status=ok flow=add");
    EditorActionResponse::success("Editor opened.")
}

/// Opens an edit-flow session seeded from the stored syllabus of `subject`.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - On failure the previous session is kept.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_open_for_edit(subjects: Vec<SubjectItem>, subject: String) -> EditorActionResponse {
    const OP: &str = "editor_open_for_edit";
    let opened = with_syllabus_service(OP, |service| {
        service
            .open_for_edit(to_subjects(subjects), subject.as_str())
            .map_err(|err| FfiFailure::service(OP, err))
    });
    match opened {
        Ok(editor) => {
            info!(
                "event=editor_open module=ffi status=ok flow=edit node_count={}",
                editor.node_count()
            );
            *lock_session() = Some(editor);
            EditorActionResponse::success("Editor opened for edit.")
        }
        Err(failure) => EditorActionResponse::failure(failure),
    }
}

/// Replaces the session's subject choices. The draft is untouched.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_refresh_subjects(subjects: Vec<SubjectItem>) -> EditorActionResponse {
    action("editor_refresh_subjects", |editor| {
        editor.refresh_subjects(to_subjects(subjects));
        Ok(EditorActionResponse::success("Subjects refreshed."))
    })
}

/// Sets the draft subject. Last call wins.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_select_subject(subject_id: String) -> EditorActionResponse {
    action("editor_select_subject", |editor| {
        editor.select_subject(subject_id);
        Ok(EditorActionResponse::success("Subject selected."))
    })
}

/// Appends a chapter and returns its id.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_add_chapter(name: String) -> EditorActionResponse {
    const OP: &str = "editor_add_chapter";
    action(OP, |editor| {
        let node_id = editor
            .add_chapter(name)
            .map_err(|err| FfiFailure::editor(OP, err))?;
        Ok(EditorActionResponse::created("Chapter added.", node_id))
    })
}

/// Appends a topic to one chapter and returns its id.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_add_topic(chapter_id: String, name: String) -> EditorActionResponse {
    const OP: &str = "editor_add_topic";
    action(OP, |editor| {
        let chapter = parse_node_id(OP, "chapter_id", &chapter_id)?;
        let node_id = editor
            .add_topic(chapter, name)
            .map_err(|err| FfiFailure::editor(OP, err))?;
        Ok(EditorActionResponse::created("Topic added.", node_id))
    })
}

/// Appends a subtopic to one topic and returns its id.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_add_subtopic(
    chapter_id: String,
    topic_id: String,
    name: String,
) -> EditorActionResponse {
    const OP: &str = "editor_add_subtopic";
    action(OP, |editor| {
        let chapter = parse_node_id(OP, "chapter_id", &chapter_id)?;
        let topic = parse_node_id(OP, "topic_id", &topic_id)?;
        let node_id = editor
            .add_subtopic(chapter, topic, name)
            .map_err(|err| FfiFailure::editor(OP, err))?;
        Ok(EditorActionResponse::created("Subtopic added.", node_id))
    })
}

/// Renames one node addressed by `kind` plus its id path.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_rename(
    kind: String,
    chapter_id: String,
    topic_id: Option<String>,
    subtopic_id: Option<String>,
    name: String,
) -> EditorActionResponse {
    const OP: &str = "editor_rename";
    action(OP, |editor| {
        let path = parse_path(OP, &kind, &chapter_id, topic_id, subtopic_id)?;
        editor
            .rename_node(&path, name)
            .map_err(|err| FfiFailure::editor(OP, err))?;
        Ok(EditorActionResponse::success("Node renamed."))
    })
}

/// Deletes one node and its descendants.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_delete(
    kind: String,
    chapter_id: String,
    topic_id: Option<String>,
    subtopic_id: Option<String>,
) -> EditorActionResponse {
    const OP: &str = "editor_delete";
    action(OP, |editor| {
        let path = parse_path(OP, &kind, &chapter_id, topic_id, subtopic_id)?;
        editor
            .delete_node(&path)
            .map_err(|err| FfiFailure::editor(OP, err))?;
        Ok(EditorActionResponse::success("Node deleted."))
    })
}

/// Sets the completion flag of one topic or subtopic.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_set_completion(
    kind: String,
    chapter_id: String,
    topic_id: Option<String>,
    subtopic_id: Option<String>,
    completed: bool,
) -> EditorActionResponse {
    const OP: &str = "editor_set_completion";
    action(OP, |editor| {
        let path = parse_path(OP, &kind, &chapter_id, topic_id, subtopic_id)?;
        editor
            .set_completion(&path, completed)
            .map_err(|err| FfiFailure::editor(OP, err))?;
        Ok(EditorActionResponse::success("Completion updated."))
    })
}

/// Moves one node within its sibling list; the index is clamped.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_move(
    kind: String,
    chapter_id: String,
    topic_id: Option<String>,
    subtopic_id: Option<String>,
    target_index: u32,
) -> EditorActionResponse {
    const OP: &str = "editor_move";
    action(OP, |editor| {
        let path = parse_path(OP, &kind, &chapter_id, topic_id, subtopic_id)?;
        let target_index = usize::try_from(target_index).unwrap_or(usize::MAX);
        editor
            .move_node(&path, target_index)
            .map_err(|err| FfiFailure::editor(OP, err))?;
        Ok(EditorActionResponse::success("Node moved."))
    })
}

/// Builds the submission payload of the current draft as JSON.
///
/// # FFI contract
/// - Sync call, in-memory only.
/// - The draft is not modified.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_payload_json() -> EditorPayloadResponse {
    const OP: &str = "editor_payload_json";
    let built = with_session(OP, |editor| {
        let payload = editor
            .build_submission_payload()
            .map_err(|err| FfiFailure::editor(OP, err))?;
        serde_json::to_string(&payload).map_err(|err| FfiFailure::new(OP, "encode", err))
    });
    match built {
        Ok(json) => EditorPayloadResponse {
            ok: true,
            payload_json: Some(json),
            error_code: None,
            message: "Payload built.".to_string(),
        },
        Err(failure) => EditorPayloadResponse::failure(failure),
    }
}

/// Stores the current draft and clears it on success.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - On failure the draft is kept so the user can retry.
/// - Returns the stored payload JSON on success.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_submit() -> EditorPayloadResponse {
    const OP: &str = "editor_submit";
    let submitted = with_session(OP, |editor| {
        let record = with_syllabus_service(OP, |service| {
            service
                .submit(editor)
                .map_err(|err| FfiFailure::service(OP, err))
        })?;
        serde_json::to_string(&record.payload).map_err(|err| FfiFailure::new(OP, "encode", err))
    });
    match submitted {
        Ok(json) => EditorPayloadResponse {
            ok: true,
            payload_json: Some(json),
            error_code: None,
            message: "Syllabus submitted.".to_string(),
        },
        Err(failure) => EditorPayloadResponse::failure(failure),
    }
}

/// Discards the current draft. Subject choices are kept.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_reset() -> EditorActionResponse {
    action("editor_reset", |editor| {
        editor.reset();
        Ok(EditorActionResponse::success("Editor reset."))
    })
}

fn lock_session() -> MutexGuard<'static, Option<SyllabusEditor>> {
    // Editor operations never leave a half-applied draft, so a poisoned
    // guard still holds a consistent session.
    EDITOR_SESSION
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

fn with_session<T>(
    op: &str,
    f: impl FnOnce(&mut SyllabusEditor) -> Result<T, FfiFailure>,
) -> Result<T, FfiFailure> {
    let mut session = lock_session();
    let editor = session
        .as_mut()
        .ok_or_else(|| FfiFailure::new(op, "session_closed", "editor session is not open"))?;
    f(editor)
}

fn action(
    op: &str,
    f: impl FnOnce(&mut SyllabusEditor) -> Result<EditorActionResponse, FfiFailure>,
) -> EditorActionResponse {
    with_session(op, f).unwrap_or_else(EditorActionResponse::failure)
}

fn resolve_syllabus_db_path() -> PathBuf {
    SYLLABUS_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("SYLLABUS_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(SYLLABUS_DB_FILE_NAME)
        })
        .clone()
}

fn with_syllabus_service<T>(
    op: &str,
    f: impl FnOnce(&SyllabusService<SqliteSyllabusRepository<'_>>) -> Result<T, FfiFailure>,
) -> Result<T, FfiFailure> {
    let db_path = resolve_syllabus_db_path();
    let conn = open_db(&db_path).map_err(|err| FfiFailure::new(op, "store", err))?;
    let repo =
        SqliteSyllabusRepository::try_new(&conn).map_err(|err| FfiFailure::new(op, "store", err))?;
    f(&SyllabusService::new(repo))
}

fn to_subjects(items: Vec<SubjectItem>) -> Vec<Subject> {
    items
        .into_iter()
        .map(|item| Subject::new(item.id, item.subject_name))
        .collect()
}

fn parse_node_id(op: &str, field: &str, value: &str) -> Result<NodeId, FfiFailure> {
    Uuid::parse_str(value.trim())
        .map_err(|_| FfiFailure::new(op, "invalid_id", format!("invalid {field} `{value}`")))
}

fn parse_optional_id(
    op: &str,
    field: &str,
    value: Option<String>,
) -> Result<Option<NodeId>, FfiFailure> {
    value
        .map(|raw| parse_node_id(op, field, &raw))
        .transpose()
}

fn parse_path(
    op: &str,
    kind: &str,
    chapter_id: &str,
    topic_id: Option<String>,
    subtopic_id: Option<String>,
) -> Result<NodePath, FfiFailure> {
    let kind = NodeKind::parse(kind).ok_or_else(|| {
        FfiFailure::new(
            op,
            "invalid_kind",
            format!("unsupported kind `{kind}`; expected chapter|topic|subtopic"),
        )
    })?;
    let chapter = parse_node_id(op, "chapter_id", chapter_id)?;
    let topic = parse_optional_id(op, "topic_id", topic_id)?;
    let subtopic = parse_optional_id(op, "subtopic_id", subtopic_id)?;
    NodePath::from_parts(kind, chapter, topic, subtopic).ok_or_else(|| {
        FfiFailure::new(
            op,
            "invalid_path",
            format!("{kind} path is missing a parent id segment"),
        )
    })
}
