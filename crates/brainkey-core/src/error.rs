//! Error types for lessons, sessions, and the presentation shell.

use thiserror::Error;

/// A lesson that breaks one of the structural rules in [`crate::model`].
#[derive(Debug, Error)]
pub enum LessonError {
    #[error("lesson has no questions")]
    NoQuestions,

    #[error("question is missing an id")]
    MissingQuestionId,

    #[error("duplicate question id: {0}")]
    DuplicateQuestionId(String),

    #[error("question {id}: missing field `{field}`")]
    MissingField { id: String, field: &'static str },

    #[error("question {id}: quiz needs at least 2 options, got {count}")]
    TooFewOptions { id: String, count: usize },

    #[error("question {id}: option {option:?} appears more than once")]
    DuplicateOption { id: String, option: String },

    #[error("question {id}: correct answer {answer:?} is not one of the options")]
    AnswerNotInOptions { id: String, answer: String },

    #[error("question {0}: typing text is empty")]
    EmptyTypingText(String),

    #[error("grade must be between 1 and 10, got {0}")]
    InvalidGrade(u8),

    #[error("not a grade level: {0:?}")]
    UnparseableGrade(String),
}

/// Misuse of a [`crate::session::Session`]. The session is left untouched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("the lesson is already complete")]
    Completed,

    #[error("question {id} is a {actual} question, not {expected}")]
    WrongQuestionKind {
        id: String,
        expected: &'static str,
        actual: &'static str,
    },
}

/// An event the shell cannot accept in its current view.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShellError {
    #[error("please enter your name")]
    BlankName,

    #[error("no student is logged in")]
    NotLoggedIn,

    #[error("a lesson is already loading")]
    FetchInFlight,

    #[error("no lesson is running")]
    NoActiveLesson,

    #[error("answer the current question before moving on")]
    NotAnswered,

    #[error("cannot {action} from the {view} screen")]
    WrongView {
        action: &'static str,
        view: &'static str,
    },

    #[error(transparent)]
    Session(#[from] SessionError),
}
