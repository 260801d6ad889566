//! brainkey-core: Lessons, sessions, and answer validation.
//!
//! This crate defines the lesson data model, the session state machine
//! that checks quiz and typing answers, and the shell state the
//! `brainkey` binary renders.

pub mod error;
pub mod model;
pub mod parser;
pub mod scheduler;
pub mod session;
pub mod shell;
pub mod traits;
pub mod typing;

pub use error::{LessonError, SessionError, ShellError};
pub use model::{GradeLevel, Lesson, Question, QuestionKind, Subject, UserProfile};
pub use session::{Feedback, FeedbackKind, Session, SessionId, SubmitOutcome};
pub use traits::{LessonProvider, LessonRequest};
