//! Lesson prompts, the JSON schema generated lessons must follow, and
//! turning generated text back into a [`Lesson`].

use serde_json::{json, Value};

use brainkey_core::model::{GradeLevel, Lesson, Subject};
use brainkey_core::parser::extract_json_payload;

use crate::error::ProviderError;

/// System instruction shared by every provider.
pub const SYSTEM_INSTRUCTION: &str = "You are an expert K-12 teacher. Generate accurate, educational, and engaging content. Ensure JSON is valid.";

/// How many quiz and typing questions a subject's lesson asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionMix {
    pub quiz: usize,
    pub typing: usize,
}

impl QuestionMix {
    pub fn total(&self) -> usize {
        self.quiz + self.typing
    }
}

pub fn question_mix(subject: Subject) -> QuestionMix {
    match subject {
        Subject::Math => QuestionMix { quiz: 3, typing: 2 },
        Subject::EnglishGrammar => QuestionMix { quiz: 3, typing: 2 },
        Subject::AiTechnology => QuestionMix { quiz: 2, typing: 3 },
        Subject::ComputerScience => QuestionMix { quiz: 1, typing: 4 },
    }
}

/// The user prompt for one lesson.
pub fn lesson_prompt(subject: Subject, grade: GradeLevel) -> String {
    let mix = question_mix(subject);
    let quiz = plural(mix.quiz, "multiple choice question");
    let typing = plural(mix.typing, "typing challenge");

    match subject {
        Subject::Math => format!(
            "Create a Grade {grade} Math lesson.\n\
             Include {quiz} (type: 'quiz') and {typing} (type: 'typing') where the student must type a math definition or a number sentence.\n\
             Topics should correspond to Grade {grade} curriculum (e.g. addition for Grade 1, Algebra for Grade 8)."
        ),
        Subject::EnglishGrammar => format!(
            "Create a Grade {grade} English Grammar lesson.\n\
             Include {quiz} (type: 'quiz') spotting errors or choosing words.\n\
             Include {typing} (type: 'typing') where the student types a grammatically correct sentence or paragraph suitable for their reading level."
        ),
        Subject::AiTechnology => format!(
            "Create a Grade {grade} lesson about Artificial Intelligence and Technology.\n\
             Simplify concepts for the specific grade level.\n\
             Include {quiz} (type: 'quiz') and {typing} (type: 'typing') where they type definitions of AI concepts (e.g., 'Robot', 'Neural Network', 'Data')."
        ),
        Subject::ComputerScience => {
            let focus = if grade.get() <= 4 {
                "Focus on hardware and basic computer terms."
            } else {
                "Focus on coding concepts (Python/JS syntax)."
            };
            format!(
                "Create a Grade {grade} Computer Science lesson.\n\
                 {focus}\n\
                 Include {quiz} (type: 'quiz') and {typing} (type: 'typing') where they type actual code snippets or definitions."
            )
        }
    }
}

/// Plain-text description of the lesson JSON, for services without a
/// structured-output schema.
pub fn json_format_instructions() -> &'static str {
    "Respond with a single JSON object and nothing else. Shape:\n\
     {\"title\": string, \"description\": string, \"questions\": [\n\
       {\"id\": string, \"type\": \"quiz\", \"prompt\": string, \"options\": [4 strings], \"correctAnswer\": one of the options},\n\
       {\"id\": string, \"type\": \"typing\", \"prompt\": string, \"typingText\": the full paragraph or code snippet to type}\n\
     ]}\n\
     Question ids must be unique."
}

/// Response schema in the OpenAPI subset accepted by Gemini's
/// `generationConfig.responseSchema`.
pub fn lesson_response_schema() -> Value {
    let question = json!({
        "type": "OBJECT",
        "properties": {
            "id": { "type": "STRING" },
            "type": { "type": "STRING", "enum": ["quiz", "typing"] },
            "prompt": { "type": "STRING", "description": "The question text or instruction" },
            "options": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "4 multiple choice options. Required if type is 'quiz'."
            },
            "correctAnswer": {
                "type": "STRING",
                "description": "The correct option text. Required if type is 'quiz'."
            },
            "typingText": {
                "type": "STRING",
                "description": "The full paragraph or code snippet to type. Required if type is 'typing'."
            }
        },
        "required": ["id", "type", "prompt"]
    });

    json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING" },
            "description": { "type": "STRING" },
            "questions": { "type": "ARRAY", "items": question }
        },
        "required": ["title", "description", "questions"]
    })
}

/// Parse a model's text output into a validated lesson.
pub fn parse_generated_lesson(text: &str) -> Result<Lesson, ProviderError> {
    if text.trim().is_empty() {
        return Err(ProviderError::EmptyResponse);
    }
    serde_json::from_str(extract_json_payload(text))
        .map_err(|e| ProviderError::MalformedLesson(e.to_string()))
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grade(n: u8) -> GradeLevel {
        GradeLevel::new(n).unwrap()
    }

    #[test]
    fn every_subject_asks_for_five_questions() {
        for subject in Subject::ALL {
            assert_eq!(question_mix(subject).total(), 5, "{subject}");
        }
    }

    #[test]
    fn math_prompt_mentions_grade_and_mix() {
        let prompt = lesson_prompt(Subject::Math, grade(3));
        assert!(prompt.contains("Grade 3 Math"));
        assert!(prompt.contains("3 multiple choice questions"));
        assert!(prompt.contains("2 typing challenges"));
    }

    #[test]
    fn computer_science_focus_depends_on_grade() {
        let young = lesson_prompt(Subject::ComputerScience, grade(4));
        let older = lesson_prompt(Subject::ComputerScience, grade(5));
        assert!(young.contains("hardware"));
        assert!(older.contains("coding concepts"));
        assert!(young.contains("1 multiple choice question "));
        assert!(young.contains("4 typing challenges"));
    }

    #[test]
    fn parses_fenced_generation() {
        let text = "```json\n{\"title\": \"T\", \"description\": \"D\", \"questions\": [\n\
                    {\"id\": \"t1\", \"type\": \"typing\", \"prompt\": \"Type\", \"typingText\": \"Hi there.\"}]}\n```";
        let lesson = parse_generated_lesson(text).unwrap();
        assert_eq!(lesson.len(), 1);
    }

    #[test]
    fn empty_and_invalid_generations() {
        assert!(matches!(
            parse_generated_lesson("  "),
            Err(ProviderError::EmptyResponse)
        ));
        let err = parse_generated_lesson(r#"{"title": "T", "description": "", "questions": []}"#)
            .unwrap_err();
        assert!(matches!(err, ProviderError::MalformedLesson(ref m) if m.contains("no questions")));
    }

    #[test]
    fn schema_requires_top_level_fields() {
        let schema = lesson_response_schema();
        assert_eq!(schema["required"], json!(["title", "description", "questions"]));
        assert_eq!(
            schema["properties"]["questions"]["items"]["properties"]["type"]["enum"],
            json!(["quiz", "typing"])
        );
    }
}
