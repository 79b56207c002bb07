//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `syllabus_core` linkage.
//! - Print one sample submission payload built through the editor.

use std::process::ExitCode;
use syllabus_core::{EditorError, NodePath, Subject, SubmissionPayload, SyllabusEditor};

fn main() -> ExitCode {
    println!("syllabus_core ping={}", syllabus_core::ping());
    println!("syllabus_core version={}", syllabus_core::core_version());

    let payload = match sample_payload() {
        Ok(payload) => payload,
        Err(err) => {
            eprintln!("sample payload failed: code={} {err}", err.code());
            return ExitCode::FAILURE;
        }
    };
    match serde_json::to_string_pretty(&payload) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("sample payload encode failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn sample_payload() -> Result<SubmissionPayload, EditorError> {
    let mut editor = SyllabusEditor::with_subjects(vec![Subject::new("math-9", "Mathematics 9")]);
    editor.select_subject("math-9");
    let chapter = editor.add_chapter("Algebra")?;
    let topic = editor.add_topic(chapter, "Linear Equations")?;
    let subtopic = editor.add_subtopic(chapter, topic, "Graphing")?;
    editor.set_completion(&NodePath::subtopic(chapter, topic, subtopic), true)?;
    editor.build_submission_payload()
}
