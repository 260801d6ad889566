//! Lesson JSON loading, saving, and review.
//!
//! Generated lessons and hand-written lesson files share one JSON shape
//! (see [`crate::model`]). Chat models sometimes wrap that JSON in a
//! markdown fence, so everything read here goes through
//! [`extract_json_payload`] first.

use std::path::Path;

use anyhow::{Context, Result};

use crate::model::{Lesson, QuestionKind};

/// Recommended option count for quiz questions, matching the generation
/// prompts.
pub const EXPECTED_QUIZ_OPTIONS: usize = 4;

/// Typing passages longer than this get a review warning.
pub const LONG_TYPING_TEXT_CHARS: usize = 400;

/// Pull a JSON document out of a model response.
///
/// Handles:
/// - A ```json``` block (preferred)
/// - A generic ``` block
/// - A bare JSON document, possibly surrounded by prose
pub fn extract_json_payload(response: &str) -> &str {
    let mut json_block = None;
    let mut generic_block = None;
    let mut offset = 0;
    let mut open: Option<(usize, Fence)> = None;

    for line in response.split_inclusive('\n') {
        let trimmed = line.trim();
        let line_start = offset;
        offset += line.len();

        match open {
            None if trimmed.starts_with("```") => {
                let lang = trimmed.trim_start_matches('`').trim().to_lowercase();
                let fence = match lang.as_str() {
                    "json" => Fence::Json,
                    "" => Fence::Generic,
                    _ => Fence::Other,
                };
                open = Some((offset, fence));
            }
            Some((start, fence)) if trimmed == "```" => {
                fence.keep(&response[start..line_start], &mut json_block, &mut generic_block);
                open = None;
            }
            _ => {}
        }
    }

    // an unclosed fence still counts, the response may have been cut short
    if let Some((start, fence)) = open {
        fence.keep(&response[start..], &mut json_block, &mut generic_block);
    }

    if let Some(body) = json_block.or(generic_block) {
        return body.trim();
    }

    match (response.find('{'), response.rfind('}')) {
        (Some(start), Some(end)) if start < end => &response[start..=end],
        _ => response.trim(),
    }
}

#[derive(Debug, Clone, Copy)]
enum Fence {
    Json,
    Generic,
    Other,
}

impl Fence {
    fn keep<'a>(self, body: &'a str, json: &mut Option<&'a str>, generic: &mut Option<&'a str>) {
        let slot = match self {
            Fence::Json => json,
            Fence::Generic => generic,
            Fence::Other => return,
        };
        slot.get_or_insert(body);
    }
}

/// Parse a lesson from JSON text (useful for testing).
pub fn parse_lesson_str(content: &str, source_path: &Path) -> Result<Lesson> {
    let payload = extract_json_payload(content);
    serde_json::from_str::<Lesson>(payload)
        .with_context(|| format!("failed to parse lesson: {}", source_path.display()))
}

/// Parse a single lesson JSON file.
pub fn parse_lesson_file(path: &Path) -> Result<Lesson> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read lesson file: {}", path.display()))?;

    parse_lesson_str(&content, path)
}

/// Write a lesson as pretty-printed JSON, creating parent directories.
pub fn save_lesson(lesson: &Lesson, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(lesson).context("failed to serialize lesson")?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json)
        .with_context(|| format!("failed to write lesson to {}", path.display()))?;
    Ok(())
}

/// Recursively load every `.json` lesson under a directory, skipping files
/// that do not parse.
pub fn load_lesson_directory(dir: &Path) -> Result<Vec<Lesson>> {
    let mut lessons = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            lessons.extend(load_lesson_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "json") {
            match parse_lesson_file(&path) {
                Ok(lesson) => lessons.push(lesson),
                Err(e) => {
                    tracing::warn!("skipping {}: {e:#}", path.display());
                }
            }
        }
    }

    Ok(lessons)
}

/// A soft issue in an otherwise valid lesson.
#[derive(Debug, Clone)]
pub struct LessonWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    pub message: String,
}

/// Look for things that are legal but likely to confuse a learner.
pub fn review_lesson(lesson: &Lesson) -> Vec<LessonWarning> {
    let mut warnings = Vec::new();

    if lesson.title().trim().is_empty() {
        warnings.push(LessonWarning {
            question_id: None,
            message: "lesson title is empty".into(),
        });
    }

    for question in lesson.questions() {
        let mut warn = |message: String| {
            warnings.push(LessonWarning {
                question_id: Some(question.id.clone()),
                message,
            })
        };

        if question.prompt.trim().is_empty() {
            warn("prompt is empty".into());
        }

        match &question.kind {
            QuestionKind::Quiz {
                options,
                correct_answer,
            } => {
                if options.len() != EXPECTED_QUIZ_OPTIONS {
                    warn(format!(
                        "quiz has {} options, expected {EXPECTED_QUIZ_OPTIONS}",
                        options.len()
                    ));
                }
                if correct_answer.trim() != correct_answer {
                    warn("correct answer has surrounding whitespace".into());
                }
            }
            QuestionKind::Typing { typing_text } => {
                let len = typing_text.chars().count();
                if len > LONG_TYPING_TEXT_CHARS {
                    warn(format!("typing text is long ({len} chars)"));
                }
                if typing_text.trim() != typing_text {
                    warn(
                        "typing text has surrounding whitespace; input shorter than the raw text \
                         will read as still typing"
                            .into(),
                    );
                }
            }
        }
    }

    warnings
}
