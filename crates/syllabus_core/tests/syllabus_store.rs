use rusqlite::Connection;
use syllabus_core::db::open_db_in_memory;
use syllabus_core::{
    ChapterPayload, DraftValidationError, EditorError, NodePath, PayloadError,
    SqliteSyllabusRepository, Subject, SubmissionPayload, SubtopicPayload, SyllabusEditor,
    SyllabusRepoError, SyllabusRepository, SyllabusService, SyllabusServiceError, TopicPayload,
};

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn algebra_payload(subject: &str) -> SubmissionPayload {
    SubmissionPayload {
        subject: subject.to_string(),
        chapters: vec![
            ChapterPayload {
                name: "Algebra".to_string(),
                topics: vec![
                    TopicPayload {
                        name: "Linear Equations".to_string(),
                        is_completed: false,
                        subtopics: vec![
                            SubtopicPayload {
                                name: "Graphing".to_string(),
                                is_completed: true,
                            },
                            SubtopicPayload {
                                name: "Slope".to_string(),
                                is_completed: false,
                            },
                        ],
                    },
                    TopicPayload {
                        name: "Quadratics".to_string(),
                        is_completed: true,
                        subtopics: Vec::new(),
                    },
                ],
            },
            ChapterPayload {
                name: "Geometry".to_string(),
                topics: Vec::new(),
            },
        ],
    }
}

#[test]
fn save_then_get_preserves_tree_and_order() {
    let conn = setup();
    let repo = SqliteSyllabusRepository::try_new(&conn).unwrap();
    let payload = algebra_payload("math-9");

    let saved = repo.save_syllabus(&payload).unwrap();
    assert_eq!(saved.payload, payload);

    let loaded = repo.get_syllabus("math-9").unwrap().unwrap();
    assert_eq!(loaded.syllabus_uuid, saved.syllabus_uuid);
    assert_eq!(loaded.payload, payload);
}

#[test]
fn get_missing_subject_returns_none() {
    let conn = setup();
    let repo = SqliteSyllabusRepository::try_new(&conn).unwrap();
    assert!(repo.get_syllabus("unknown").unwrap().is_none());
}

#[test]
fn resubmit_replaces_tree_and_keeps_identity() {
    let conn = setup();
    let repo = SqliteSyllabusRepository::try_new(&conn).unwrap();
    let first = repo.save_syllabus(&algebra_payload("math-9")).unwrap();

    let replacement = SubmissionPayload {
        subject: "math-9".to_string(),
        chapters: vec![ChapterPayload {
            name: "Statistics".to_string(),
            topics: Vec::new(),
        }],
    };
    let second = repo.save_syllabus(&replacement).unwrap();

    assert_eq!(second.syllabus_uuid, first.syllabus_uuid);
    assert_eq!(second.created_at, first.created_at);
    assert!(second.updated_at >= first.updated_at);
    assert_eq!(second.payload, replacement);

    let node_count: i64 = conn
        .query_row("SELECT COUNT(*) FROM syllabus_nodes;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(node_count, 1);
}

#[test]
fn save_rejects_invalid_payload_without_writing() {
    let conn = setup();
    let repo = SqliteSyllabusRepository::try_new(&conn).unwrap();
    let mut payload = algebra_payload("math-9");
    payload.chapters[0].topics[0].subtopics[0].name = "   ".to_string();

    let err = repo.save_syllabus(&payload).unwrap_err();
    assert!(matches!(
        err,
        SyllabusRepoError::InvalidPayload(PayloadError::EmptyName(_))
    ));
    assert!(repo.list_syllabi().unwrap().is_empty());
}

#[test]
fn list_is_sorted_by_subject_with_chapter_counts() {
    let conn = setup();
    let repo = SqliteSyllabusRepository::try_new(&conn).unwrap();
    repo.save_syllabus(&algebra_payload("phys-9")).unwrap();
    repo.save_syllabus(&algebra_payload("math-9")).unwrap();

    let items = repo.list_syllabi().unwrap();
    let subjects: Vec<_> = items.iter().map(|item| item.subject.as_str()).collect();
    assert_eq!(subjects, vec!["math-9", "phys-9"]);
    assert!(items.iter().all(|item| item.chapter_count == 2));
}

#[test]
fn delete_removes_syllabus_and_second_delete_is_not_found() {
    let conn = setup();
    let repo = SqliteSyllabusRepository::try_new(&conn).unwrap();
    repo.save_syllabus(&algebra_payload("math-9")).unwrap();

    repo.delete_syllabus("math-9").unwrap();
    assert!(repo.get_syllabus("math-9").unwrap().is_none());
    let node_count: i64 = conn
        .query_row("SELECT COUNT(*) FROM syllabus_nodes;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(node_count, 0);

    let err = repo.delete_syllabus("math-9").unwrap_err();
    assert!(matches!(err, SyllabusRepoError::NotFound(subject) if subject == "math-9"));
}

#[test]
fn repository_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();
    let err = match SqliteSyllabusRepository::try_new(&conn) {
        Ok(_) => panic!("unmigrated connection must be rejected"),
        Err(err) => err,
    };
    assert!(matches!(
        err,
        SyllabusRepoError::UninitializedConnection {
            actual_version: 0,
            ..
        }
    ));
}

#[test]
fn service_submit_persists_and_resets_draft() {
    let conn = setup();
    let service = SyllabusService::new(SqliteSyllabusRepository::try_new(&conn).unwrap());
    let mut editor = SyllabusEditor::with_subjects(vec![Subject::new("math-9", "Mathematics 9")]);
    editor.select_subject("math-9");
    let chapter = editor.add_chapter("Algebra").unwrap();
    let topic = editor.add_topic(chapter, "Linear Equations").unwrap();
    let subtopic = editor.add_subtopic(chapter, topic, "Graphing").unwrap();
    editor
        .set_completion(&NodePath::subtopic(chapter, topic, subtopic), true)
        .unwrap();
    let expected = editor.build_submission_payload().unwrap();

    let record = service.submit(&mut editor).unwrap();

    assert_eq!(record.payload, expected);
    assert!(editor.draft().is_empty());
    assert_eq!(editor.subjects().len(), 1);
    assert_eq!(
        service.get_syllabus("math-9").unwrap().unwrap().payload,
        expected
    );
}

#[test]
fn service_submit_stores_the_payload_the_editor_built() {
    let conn = setup();
    let service = SyllabusService::new(SqliteSyllabusRepository::try_new(&conn).unwrap());
    let mut editor = SyllabusEditor::new();
    editor.select_subject(" math-9 ");
    editor.add_chapter("Linear   Algebra").unwrap();
    let expected = editor.build_submission_payload().unwrap();

    let record = service.submit(&mut editor).unwrap();

    assert_eq!(record.payload, expected);
    assert_eq!(record.payload.subject, "math-9");
    assert_eq!(record.payload.chapters[0].name, "Linear   Algebra");
}

#[test]
fn service_submit_with_blank_subject_is_a_validation_error() {
    let conn = setup();
    let service = SyllabusService::new(SqliteSyllabusRepository::try_new(&conn).unwrap());
    let mut editor = SyllabusEditor::new();
    editor.select_subject("   ");
    editor.add_chapter("Algebra").unwrap();

    let err = service.submit(&mut editor).unwrap_err();

    assert!(matches!(
        err,
        SyllabusServiceError::Editor(EditorError::Validation(
            DraftValidationError::MissingSubject
        ))
    ));
    assert_eq!(editor.node_count(), 1);
    assert!(service.list_syllabi().unwrap().is_empty());
}

#[test]
fn service_submit_rejects_incomplete_draft_without_writing() {
    let conn = setup();
    let service = SyllabusService::new(SqliteSyllabusRepository::try_new(&conn).unwrap());
    let mut editor = SyllabusEditor::new();
    editor.add_chapter("Algebra").unwrap();

    let err = service.submit(&mut editor).unwrap_err();

    assert!(matches!(err, SyllabusServiceError::Editor(_)));
    assert_eq!(editor.node_count(), 1);
    assert!(service.list_syllabi().unwrap().is_empty());
}

#[test]
fn open_for_edit_seeds_editor_from_store() {
    let conn = setup();
    let service = SyllabusService::new(SqliteSyllabusRepository::try_new(&conn).unwrap());
    let payload = algebra_payload("math-9");
    SqliteSyllabusRepository::try_new(&conn)
        .unwrap()
        .save_syllabus(&payload)
        .unwrap();

    let mut editor = service
        .open_for_edit(vec![Subject::new("math-9", "Mathematics 9")], "math-9")
        .unwrap();

    assert_eq!(editor.subject(), Some("math-9"));
    assert_eq!(editor.build_submission_payload().unwrap(), payload);

    let geometry = editor.chapters()[1].id;
    editor.add_topic(geometry, "Angles").unwrap();
    let record = service.submit(&mut editor).unwrap();
    assert_eq!(record.payload.chapters[1].topics[0].name, "Angles");
    assert_eq!(service.list_syllabi().unwrap().len(), 1);
}

#[test]
fn service_delete_missing_syllabus_is_not_found() {
    let conn = setup();
    let service = SyllabusService::new(SqliteSyllabusRepository::try_new(&conn).unwrap());

    let err = service.delete_syllabus("math-9").unwrap_err();
    assert!(matches!(
        err,
        SyllabusServiceError::SyllabusNotFound(subject) if subject == "math-9"
    ));
}
