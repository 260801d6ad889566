//! Core data model types for BrainKey.
//!
//! Lessons arrive from a generative service as JSON, so the serde shape of
//! [`Lesson`] mirrors that wire format exactly. Every lesson goes through
//! [`Lesson::new`] on the way in, whether built by hand or deserialized,
//! so a `Lesson` value is always valid.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LessonError;

/// Subjects offered on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subject {
    #[serde(rename = "Math")]
    Math,
    #[serde(rename = "English Grammar")]
    EnglishGrammar,
    #[serde(rename = "AI & Technology")]
    AiTechnology,
    #[serde(rename = "Computer Science")]
    ComputerScience,
}

impl Subject {
    /// Every subject, in dashboard order.
    pub const ALL: [Subject; 4] = [
        Subject::Math,
        Subject::EnglishGrammar,
        Subject::ComputerScience,
        Subject::AiTechnology,
    ];

    /// Display name, also used inside generated prompts.
    pub fn as_str(&self) -> &'static str {
        match self {
            Subject::Math => "Math",
            Subject::EnglishGrammar => "English Grammar",
            Subject::AiTechnology => "AI & Technology",
            Subject::ComputerScience => "Computer Science",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Subject {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "math" | "maths" => Ok(Subject::Math),
            "english" | "english grammar" | "grammar" => Ok(Subject::EnglishGrammar),
            "ai" | "ai & technology" | "ai-tech" | "technology" => Ok(Subject::AiTechnology),
            "cs" | "computer" | "computer science" => Ok(Subject::ComputerScience),
            other => Err(format!("unknown subject: {other}")),
        }
    }
}

/// A school grade between 1 and 10 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct GradeLevel(u8);

impl GradeLevel {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    pub fn new(grade: u8) -> Result<Self, LessonError> {
        if (Self::MIN..=Self::MAX).contains(&grade) {
            Ok(Self(grade))
        } else {
            Err(LessonError::InvalidGrade(grade))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// All grades in ascending order.
    pub fn all() -> impl Iterator<Item = GradeLevel> {
        (Self::MIN..=Self::MAX).map(GradeLevel)
    }
}

impl Default for GradeLevel {
    fn default() -> Self {
        Self(Self::MIN)
    }
}

impl TryFrom<u8> for GradeLevel {
    type Error = LessonError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<GradeLevel> for u8 {
    fn from(grade: GradeLevel) -> Self {
        grade.0
    }
}

impl fmt::Display for GradeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GradeLevel {
    type Err = LessonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let trimmed = trimmed
            .strip_prefix("Grade ")
            .or_else(|| trimmed.strip_prefix("grade "))
            .unwrap_or(trimmed);
        let grade: u8 = trimmed
            .parse()
            .map_err(|_| LessonError::UnparseableGrade(s.to_string()))?;
        Self::new(grade)
    }
}

/// The two kinds of lesson question. The kind never changes after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionKind {
    /// Multiple choice. `correct_answer` equals exactly one option.
    Quiz {
        options: Vec<String>,
        correct_answer: String,
    },
    /// Reproduce `typing_text` verbatim.
    Typing { typing_text: String },
}

/// A single lesson question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    /// Identifier, unique within its lesson.
    pub id: String,
    /// The question text or instruction shown to the learner.
    pub prompt: String,
    pub kind: QuestionKind,
}

impl Question {
    pub fn quiz(
        id: impl Into<String>,
        prompt: impl Into<String>,
        options: impl IntoIterator<Item = impl Into<String>>,
        correct_answer: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            kind: QuestionKind::Quiz {
                options: options.into_iter().map(Into::into).collect(),
                correct_answer: correct_answer.into(),
            },
        }
    }

    pub fn typing(
        id: impl Into<String>,
        prompt: impl Into<String>,
        typing_text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            kind: QuestionKind::Typing {
                typing_text: typing_text.into(),
            },
        }
    }

    pub fn is_typing(&self) -> bool {
        matches!(self.kind, QuestionKind::Typing { .. })
    }

    /// The wire tag for this question's kind.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            QuestionKind::Quiz { .. } => "quiz",
            QuestionKind::Typing { .. } => "typing",
        }
    }

    fn validate(&self) -> Result<(), LessonError> {
        if self.id.trim().is_empty() {
            return Err(LessonError::MissingQuestionId);
        }
        match &self.kind {
            QuestionKind::Quiz {
                options,
                correct_answer,
            } => {
                if options.len() < 2 {
                    return Err(LessonError::TooFewOptions {
                        id: self.id.clone(),
                        count: options.len(),
                    });
                }
                let mut seen = HashSet::new();
                for option in options {
                    if !seen.insert(option.as_str()) {
                        return Err(LessonError::DuplicateOption {
                            id: self.id.clone(),
                            option: option.clone(),
                        });
                    }
                }
                if !seen.contains(correct_answer.as_str()) {
                    return Err(LessonError::AnswerNotInOptions {
                        id: self.id.clone(),
                        answer: correct_answer.clone(),
                    });
                }
            }
            QuestionKind::Typing { typing_text } => {
                if typing_text.trim().is_empty() {
                    return Err(LessonError::EmptyTypingText(self.id.clone()));
                }
            }
        }
        Ok(())
    }
}

/// A complete lesson. Always holds at least one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireLesson", into = "WireLesson")]
pub struct Lesson {
    title: String,
    description: String,
    questions: Vec<Question>,
}

impl Lesson {
    /// Build a lesson, checking every structural invariant.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        questions: Vec<Question>,
    ) -> Result<Self, LessonError> {
        if questions.is_empty() {
            return Err(LessonError::NoQuestions);
        }
        let mut ids = HashSet::new();
        for question in &questions {
            question.validate()?;
            if !ids.insert(question.id.as_str()) {
                return Err(LessonError::DuplicateQuestionId(question.id.clone()));
            }
        }
        Ok(Self {
            title: title.into(),
            description: description.into(),
            questions,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Always false; kept for clippy's `len_without_is_empty`.
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Count of (quiz, typing) questions.
    pub fn mix(&self) -> (usize, usize) {
        let typing = self.questions.iter().filter(|q| q.is_typing()).count();
        (self.questions.len() - typing, typing)
    }
}

/// A learner's profile for the lifetime of one login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub grade: GradeLevel,
    pub stars: u32,
}

impl UserProfile {
    pub fn new(username: impl Into<String>, grade: GradeLevel) -> Self {
        Self {
            username: username.into(),
            grade,
            stars: 0,
        }
    }

    /// Credit a finished lesson's score.
    pub fn award(&mut self, score: u32) {
        self.stars = self.stars.saturating_add(score);
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct WireLesson {
    title: String,
    #[serde(default)]
    description: String,
    questions: Vec<WireQuestion>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireQuestion {
    id: String,
    #[serde(rename = "type")]
    kind: WireKind,
    prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    correct_answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typing_text: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum WireKind {
    Quiz,
    Typing,
}

impl TryFrom<WireQuestion> for Question {
    type Error = LessonError;

    fn try_from(wire: WireQuestion) -> Result<Self, Self::Error> {
        let kind = match wire.kind {
            WireKind::Quiz => QuestionKind::Quiz {
                options: wire.options.ok_or_else(|| LessonError::MissingField {
                    id: wire.id.clone(),
                    field: "options",
                })?,
                correct_answer: wire.correct_answer.ok_or_else(|| {
                    LessonError::MissingField {
                        id: wire.id.clone(),
                        field: "correctAnswer",
                    }
                })?,
            },
            WireKind::Typing => QuestionKind::Typing {
                typing_text: wire.typing_text.ok_or_else(|| LessonError::MissingField {
                    id: wire.id.clone(),
                    field: "typingText",
                })?,
            },
        };
        Ok(Question {
            id: wire.id,
            prompt: wire.prompt,
            kind,
        })
    }
}

impl From<Question> for WireQuestion {
    fn from(question: Question) -> Self {
        match question.kind {
            QuestionKind::Quiz {
                options,
                correct_answer,
            } => WireQuestion {
                id: question.id,
                kind: WireKind::Quiz,
                prompt: question.prompt,
                options: Some(options),
                correct_answer: Some(correct_answer),
                typing_text: None,
            },
            QuestionKind::Typing { typing_text } => WireQuestion {
                id: question.id,
                kind: WireKind::Typing,
                prompt: question.prompt,
                options: None,
                correct_answer: None,
                typing_text: Some(typing_text),
            },
        }
    }
}

impl TryFrom<WireLesson> for Lesson {
    type Error = LessonError;

    fn try_from(wire: WireLesson) -> Result<Self, Self::Error> {
        let questions = wire
            .questions
            .into_iter()
            .map(Question::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Lesson::new(wire.title, wire.description, questions)
    }
}

impl From<Lesson> for WireLesson {
    fn from(lesson: Lesson) -> Self {
        WireLesson {
            title: lesson.title,
            description: lesson.description,
            questions: lesson.questions.into_iter().map(Into::into).collect(),
        }
    }
}
