//! The `brainkey validate` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use brainkey_core::model::{Lesson, QuestionKind};
use brainkey_core::parser::{load_lesson_directory, parse_lesson_file, review_lesson};
use brainkey_core::typing::word_count;

pub fn execute(lesson_path: PathBuf) -> Result<()> {
    let lessons = if lesson_path.is_dir() {
        load_lesson_directory(&lesson_path)?
    } else {
        vec![parse_lesson_file(&lesson_path)?]
    };

    if lessons.is_empty() {
        anyhow::bail!("no lessons found in {}", lesson_path.display());
    }

    let mut total_warnings = 0;

    for lesson in &lessons {
        println!("Lesson: {} ({} questions)", lesson.title(), lesson.len());
        println!("{}", question_table(lesson));

        let warnings = review_lesson(lesson);
        for w in &warnings {
            let prefix = w
                .question_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All lessons valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}

fn question_table(lesson: &Lesson) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["ID", "Type", "Prompt", "Answer"]);

    for question in lesson.questions() {
        let answer = match &question.kind {
            QuestionKind::Quiz {
                options,
                correct_answer,
            } => format!("{correct_answer} (of {})", options.len()),
            QuestionKind::Typing { typing_text } => {
                format!("{} words", word_count(typing_text))
            }
        };
        table.add_row(vec![
            Cell::new(&question.id),
            Cell::new(question.kind_name()),
            Cell::new(&question.prompt),
            Cell::new(answer),
        ]);
    }

    table
}
