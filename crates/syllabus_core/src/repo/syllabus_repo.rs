//! Submitted syllabus repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Accept flattened submission payloads (the backend seam).
//! - Persist one syllabus tree per subject and read it back in order.
//!
//! # Invariants
//! - Saving is an upsert keyed by subject; the old tree is replaced in the
//!   same transaction.
//! - Read-back order is `sort_order ASC, node_uuid ASC` per sibling list.
//! - Node rows never outlive their syllabus row.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::payload::{
    ChapterPayload, PayloadError, SubmissionPayload, SubtopicPayload, TopicPayload,
};
use crate::model::syllabus::{NodeKind, SubjectId};
use rusqlite::{
    params, Connection, OptionalExtension, Row, Statement, Transaction, TransactionBehavior,
};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of one stored syllabus.
pub type SyllabusId = Uuid;

/// Result type used by syllabus repository operations.
pub type SyllabusRepoResult<T> = Result<T, SyllabusRepoError>;

/// Errors from syllabus repository operations.
#[derive(Debug)]
pub enum SyllabusRepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// No syllabus is stored for the subject.
    NotFound(SubjectId),
    /// Payload failed structural validation before write.
    InvalidPayload(PayloadError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Persisted rows cannot be converted into a valid tree.
    InvalidData(String),
}

impl Display for SyllabusRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(subject) => write!(f, "syllabus not found for subject: {subject}"),
            Self::InvalidPayload(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "syllabus repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "syllabus repository requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid syllabus data: {message}"),
        }
    }
}

impl Error for SyllabusRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidPayload(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for SyllabusRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for SyllabusRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<PayloadError> for SyllabusRepoError {
    fn from(value: PayloadError) -> Self {
        Self::InvalidPayload(value)
    }
}

/// Stored syllabus read model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyllabusRecord {
    pub syllabus_uuid: SyllabusId,
    /// Stored tree in submission shape.
    pub payload: SubmissionPayload,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp; bumped on every resubmit.
    pub updated_at: i64,
}

/// Lightweight listing row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyllabusSummary {
    pub syllabus_uuid: SyllabusId,
    pub subject: SubjectId,
    pub chapter_count: u32,
    pub updated_at: i64,
}

/// Repository interface standing in for the syllabus backend.
pub trait SyllabusRepository {
    /// Creates or replaces the syllabus for `payload.subject`.
    fn save_syllabus(&self, payload: &SubmissionPayload) -> SyllabusRepoResult<SyllabusRecord>;
    /// Loads the syllabus for one subject, if stored.
    fn get_syllabus(&self, subject: &str) -> SyllabusRepoResult<Option<SyllabusRecord>>;
    /// Lists stored syllabi sorted by subject.
    fn list_syllabi(&self) -> SyllabusRepoResult<Vec<SyllabusSummary>>;
    /// Deletes the syllabus for one subject.
    fn delete_syllabus(&self, subject: &str) -> SyllabusRepoResult<()>;
}

/// SQLite-backed syllabus repository.
pub struct SqliteSyllabusRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSyllabusRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> SyllabusRepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl SyllabusRepository for SqliteSyllabusRepository<'_> {
    fn save_syllabus(&self, payload: &SubmissionPayload) -> SyllabusRepoResult<SyllabusRecord> {
        payload.validate()?;
        let subject = payload.subject.trim();

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let existing: Option<String> = tx
            .query_row(
                "SELECT syllabus_uuid
                 FROM syllabi
                 WHERE subject_id = ?1;",
                [subject],
                |row| row.get(0),
            )
            .optional()?;

        let syllabus_uuid = match existing {
            Some(value) => {
                let syllabus_uuid = parse_uuid(&value, "syllabi.syllabus_uuid")?;
                tx.execute(
                    "DELETE FROM syllabus_nodes WHERE syllabus_uuid = ?1;",
                    [syllabus_uuid.to_string()],
                )?;
                tx.execute(
                    "UPDATE syllabi
                     SET updated_at = (strftime('%s', 'now') * 1000)
                     WHERE syllabus_uuid = ?1;",
                    [syllabus_uuid.to_string()],
                )?;
                syllabus_uuid
            }
            None => {
                let syllabus_uuid = Uuid::new_v4();
                tx.execute(
                    "INSERT INTO syllabi (syllabus_uuid, subject_id) VALUES (?1, ?2);",
                    params![syllabus_uuid.to_string(), subject],
                )?;
                syllabus_uuid
            }
        };

        insert_tree(&tx, syllabus_uuid, payload)?;
        tx.commit()?;

        load_syllabus(self.conn, subject)?.ok_or_else(|| {
            SyllabusRepoError::InvalidData(format!(
                "saved syllabus {syllabus_uuid} missing in read-back"
            ))
        })
    }

    fn get_syllabus(&self, subject: &str) -> SyllabusRepoResult<Option<SyllabusRecord>> {
        load_syllabus(self.conn, subject.trim())
    }

    fn list_syllabi(&self) -> SyllabusRepoResult<Vec<SyllabusSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                s.syllabus_uuid AS syllabus_uuid,
                s.subject_id AS subject_id,
                s.updated_at AS updated_at,
                (
                  SELECT COUNT(*)
                  FROM syllabus_nodes n
                  WHERE n.syllabus_uuid = s.syllabus_uuid
                    AND n.kind = 'chapter'
                ) AS chapter_count
             FROM syllabi s
             ORDER BY s.subject_id ASC;",
        )?;
        let mut rows = stmt.query([])?;

        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            let uuid_text: String = row.get("syllabus_uuid")?;
            let chapter_count: i64 = row.get("chapter_count")?;
            items.push(SyllabusSummary {
                syllabus_uuid: parse_uuid(&uuid_text, "syllabi.syllabus_uuid")?,
                subject: row.get("subject_id")?,
                chapter_count: u32::try_from(chapter_count).map_err(|_| {
                    SyllabusRepoError::InvalidData(format!(
                        "invalid chapter count `{chapter_count}`"
                    ))
                })?,
                updated_at: row.get("updated_at")?,
            });
        }
        Ok(items)
    }

    fn delete_syllabus(&self, subject: &str) -> SyllabusRepoResult<()> {
        let subject = subject.trim();
        let changed = self
            .conn
            .execute("DELETE FROM syllabi WHERE subject_id = ?1;", [subject])?;
        if changed == 0 {
            return Err(SyllabusRepoError::NotFound(subject.to_string()));
        }
        Ok(())
    }
}

/// One persisted node row before it is attached to its parent.
struct NodeRow {
    node_uuid: Uuid,
    parent_uuid: Option<Uuid>,
    kind: NodeKind,
    name: String,
    is_completed: bool,
}

fn insert_tree(
    conn: &Connection,
    syllabus_uuid: SyllabusId,
    payload: &SubmissionPayload,
) -> SyllabusRepoResult<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO syllabus_nodes (
            node_uuid,
            syllabus_uuid,
            parent_uuid,
            kind,
            name,
            is_completed,
            sort_order
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
    )?;
    let syllabus = syllabus_uuid.to_string();

    for (chapter_order, chapter) in payload.chapters.iter().enumerate() {
        let chapter_uuid = insert_node(
            &mut stmt,
            &syllabus,
            None,
            NodeKind::Chapter,
            &chapter.name,
            false,
            chapter_order,
        )?;
        for (topic_order, topic) in chapter.topics.iter().enumerate() {
            let topic_uuid = insert_node(
                &mut stmt,
                &syllabus,
                Some(chapter_uuid.as_str()),
                NodeKind::Topic,
                &topic.name,
                topic.is_completed,
                topic_order,
            )?;
            for (subtopic_order, subtopic) in topic.subtopics.iter().enumerate() {
                insert_node(
                    &mut stmt,
                    &syllabus,
                    Some(topic_uuid.as_str()),
                    NodeKind::Subtopic,
                    &subtopic.name,
                    subtopic.is_completed,
                    subtopic_order,
                )?;
            }
        }
    }
    Ok(())
}

fn insert_node(
    stmt: &mut Statement<'_>,
    syllabus_uuid: &str,
    parent_uuid: Option<&str>,
    kind: NodeKind,
    name: &str,
    is_completed: bool,
    sort_order: usize,
) -> SyllabusRepoResult<String> {
    let node_uuid = Uuid::new_v4().to_string();
    stmt.execute(params![
        node_uuid,
        syllabus_uuid,
        parent_uuid,
        kind.as_str(),
        name.trim(),
        i64::from(is_completed),
        sort_order as i64,
    ])?;
    Ok(node_uuid)
}

fn load_syllabus(conn: &Connection, subject: &str) -> SyllabusRepoResult<Option<SyllabusRecord>> {
    let header = conn
        .query_row(
            "SELECT syllabus_uuid, subject_id, created_at, updated_at
             FROM syllabi
             WHERE subject_id = ?1;",
            [subject],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            },
        )
        .optional()?;
    let Some((uuid_text, subject_id, created_at, updated_at)) = header else {
        return Ok(None);
    };

    let syllabus_uuid = parse_uuid(&uuid_text, "syllabi.syllabus_uuid")?;
    let chapters = load_tree(conn, syllabus_uuid)?;
    Ok(Some(SyllabusRecord {
        syllabus_uuid,
        payload: SubmissionPayload {
            subject: subject_id,
            chapters,
        },
        created_at,
        updated_at,
    }))
}

fn load_tree(
    conn: &Connection,
    syllabus_uuid: SyllabusId,
) -> SyllabusRepoResult<Vec<ChapterPayload>> {
    let mut stmt = conn.prepare(
        "SELECT node_uuid, parent_uuid, kind, name, is_completed
         FROM syllabus_nodes
         WHERE syllabus_uuid = ?1
         ORDER BY sort_order ASC, node_uuid ASC;",
    )?;
    let mut rows = stmt.query([syllabus_uuid.to_string()])?;

    let mut roots = Vec::new();
    let mut children: HashMap<Uuid, Vec<NodeRow>> = HashMap::new();
    while let Some(row) = rows.next()? {
        let node = parse_node_row(row)?;
        match node.parent_uuid {
            None => roots.push(node),
            Some(parent_uuid) => children.entry(parent_uuid).or_default().push(node),
        }
    }

    let mut chapters = Vec::with_capacity(roots.len());
    for chapter_row in roots {
        expect_kind(&chapter_row, NodeKind::Chapter)?;
        let mut topics = Vec::new();
        for topic_row in children.remove(&chapter_row.node_uuid).unwrap_or_default() {
            expect_kind(&topic_row, NodeKind::Topic)?;
            let mut subtopics = Vec::new();
            for subtopic_row in children.remove(&topic_row.node_uuid).unwrap_or_default() {
                expect_kind(&subtopic_row, NodeKind::Subtopic)?;
                subtopics.push(SubtopicPayload {
                    name: subtopic_row.name,
                    is_completed: subtopic_row.is_completed,
                });
            }
            topics.push(TopicPayload {
                name: topic_row.name,
                is_completed: topic_row.is_completed,
                subtopics,
            });
        }
        chapters.push(ChapterPayload {
            name: chapter_row.name,
            topics,
        });
    }

    if !children.is_empty() {
        return Err(SyllabusRepoError::InvalidData(format!(
            "syllabus {syllabus_uuid} has {} orphaned node group(s)",
            children.len()
        )));
    }
    Ok(chapters)
}

fn parse_node_row(row: &Row<'_>) -> SyllabusRepoResult<NodeRow> {
    let node_uuid_text: String = row.get("node_uuid")?;
    let parent_uuid = row
        .get::<_, Option<String>>("parent_uuid")?
        .map(|value| parse_uuid(&value, "syllabus_nodes.parent_uuid"))
        .transpose()?;

    let kind_text: String = row.get("kind")?;
    let kind = NodeKind::parse(&kind_text).ok_or_else(|| {
        SyllabusRepoError::InvalidData(format!(
            "invalid node kind `{kind_text}` in syllabus_nodes.kind"
        ))
    })?;

    let is_completed = match row.get::<_, i64>("is_completed")? {
        0 => false,
        1 => true,
        other => {
            return Err(SyllabusRepoError::InvalidData(format!(
                "invalid is_completed value `{other}` in syllabus_nodes.is_completed"
            )));
        }
    };

    Ok(NodeRow {
        node_uuid: parse_uuid(&node_uuid_text, "syllabus_nodes.node_uuid")?,
        parent_uuid,
        kind,
        name: row.get("name")?,
        is_completed,
    })
}

fn expect_kind(node: &NodeRow, expected: NodeKind) -> SyllabusRepoResult<()> {
    if node.kind != expected {
        return Err(SyllabusRepoError::InvalidData(format!(
            "node {} is a {} where a {} was expected",
            node.node_uuid, node.kind, expected
        )));
    }
    Ok(())
}

fn parse_uuid(value: &str, column: &'static str) -> SyllabusRepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| SyllabusRepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

fn ensure_connection_ready(conn: &Connection) -> SyllabusRepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(SyllabusRepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in ["syllabi", "syllabus_nodes"] {
        if !table_exists(conn, table)? {
            return Err(SyllabusRepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> SyllabusRepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
