//! The lesson-session state machine.
//!
//! A [`Session`] walks a learner through one [`Lesson`]. It validates
//! answers, keeps the running score, and tracks typing speed. It never
//! blocks and never schedules anything itself: a correct answer reports
//! how long the caller should wait before calling [`Session::advance`].

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SessionError;
use crate::model::{Lesson, Question, QuestionKind};
use crate::typing;

/// Points for a correct multiple-choice answer.
pub const QUIZ_POINTS: u32 = 10;
/// Points for a correctly reproduced typing passage.
pub const TYPING_POINTS: u32 = 20;
/// Delay before moving on after a correct quiz answer.
pub const QUIZ_ADVANCE_DELAY: Duration = Duration::from_millis(1500);
/// Delay before moving on after a correct typing answer.
pub const TYPING_ADVANCE_DELAY: Duration = Duration::from_millis(2000);

const QUIZ_CORRECT: &str = "Correct! Amazing job!";
const QUIZ_WRONG: &str = "Oops! Try again.";
const TYPING_INCOMPLETE: &str = "Keep typing...";
const TYPING_WRONG: &str = "Check your spelling and punctuation!";

/// Identity of one session, used to key deferred work against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    Neutral,
    Success,
    Error,
}

/// What the learner is told after a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub kind: FeedbackKind,
    pub message: String,
}

impl Feedback {
    fn new(kind: FeedbackKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    InProgress { index: usize },
    Complete { final_score: u32 },
}

/// Result of [`Session::submit_input`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank input. Nothing was checked and feedback is unchanged.
    Ignored,
    /// The current question was already answered correctly.
    AlreadyAnswered,
    /// Correct. The caller should advance after `advance_after`.
    Correct { points: u32, advance_after: Duration },
    /// Wrong. The learner may retry.
    Incorrect,
    /// Typing input is shorter than the target and does not match yet.
    KeepTyping,
}

impl SubmitOutcome {
    pub fn advance_after(&self) -> Option<Duration> {
        match self {
            SubmitOutcome::Correct { advance_after, .. } => Some(*advance_after),
            _ => None,
        }
    }
}

/// Result of [`Session::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    Next { index: usize },
    Complete { final_score: u32 },
}

/// Live state for one traversal of a lesson.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    lesson: Lesson,
    state: SessionState,
    input: String,
    feedback: Option<Feedback>,
    score: u32,
    typing_started: Option<Instant>,
    wpm: u32,
    answered: bool,
}

impl Session {
    pub fn new(lesson: Lesson) -> Self {
        let id = SessionId::new();
        tracing::debug!(session = %id, questions = lesson.len(), "session started");
        Self {
            id,
            lesson,
            state: SessionState::InProgress { index: 0 },
            input: String::new(),
            feedback: None,
            score: 0,
            typing_started: None,
            wpm: 0,
            answered: false,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn lesson(&self) -> &Lesson {
        &self.lesson
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.state, SessionState::Complete { .. })
    }

    /// Zero-based index of the current question, or the question count once
    /// the lesson is complete.
    pub fn index(&self) -> usize {
        match self.state {
            SessionState::InProgress { index } => index,
            SessionState::Complete { .. } => self.lesson.len(),
        }
    }

    pub fn total(&self) -> usize {
        self.lesson.len()
    }

    /// Fraction of questions already behind the learner, in `0.0..=1.0`.
    pub fn progress(&self) -> f64 {
        self.index() as f64 / self.total() as f64
    }

    pub fn current_question(&self) -> Option<&Question> {
        match self.state {
            SessionState::InProgress { index } => self.lesson.questions().get(index),
            SessionState::Complete { .. } => None,
        }
    }

    pub fn is_last(&self) -> bool {
        self.index() + 1 == self.total()
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Most recent typing-speed estimate for the current question.
    pub fn wpm(&self) -> u32 {
        self.wpm
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Whether the current question has been answered correctly.
    pub fn is_answered(&self) -> bool {
        self.answered
    }

    /// Check `raw` against the current question.
    ///
    /// The input buffer always takes `raw`. Blank input is not treated as a
    /// submission.
    pub fn submit_input(&mut self, raw: &str) -> Result<SubmitOutcome, SessionError> {
        let question = self.require_question()?.clone();
        self.input = raw.to_string();

        if raw.trim().is_empty() {
            return Ok(SubmitOutcome::Ignored);
        }
        if self.answered {
            return Ok(SubmitOutcome::AlreadyAnswered);
        }

        let outcome = match &question.kind {
            QuestionKind::Quiz { correct_answer, .. } => {
                if raw == correct_answer {
                    self.feedback = Some(Feedback::new(FeedbackKind::Success, QUIZ_CORRECT));
                    self.award(QUIZ_POINTS, QUIZ_ADVANCE_DELAY)
                } else {
                    self.feedback = Some(Feedback::new(FeedbackKind::Error, QUIZ_WRONG));
                    SubmitOutcome::Incorrect
                }
            }
            QuestionKind::Typing { typing_text } => {
                if typing::matches_target(raw, typing_text) {
                    self.feedback = Some(Feedback::new(
                        FeedbackKind::Success,
                        format!("Perfect! Speed: {} WPM", self.wpm),
                    ));
                    self.award(TYPING_POINTS, TYPING_ADVANCE_DELAY)
                } else if typing::char_len(raw) < typing::char_len(typing_text) {
                    self.feedback = Some(Feedback::new(FeedbackKind::Neutral, TYPING_INCOMPLETE));
                    SubmitOutcome::KeepTyping
                } else {
                    self.feedback = Some(Feedback::new(FeedbackKind::Error, TYPING_WRONG));
                    SubmitOutcome::Incorrect
                }
            }
        };

        tracing::debug!(
            session = %self.id,
            question = %question.id,
            ?outcome,
            score = self.score,
            "answer checked"
        );
        Ok(outcome)
    }

    /// Record a change to the typing buffer and refresh the speed estimate.
    pub fn record_keystroke(&mut self, raw: &str) -> Result<u32, SessionError> {
        self.record_keystroke_at(raw, Instant::now())
    }

    /// [`Session::record_keystroke`] with an explicit clock reading.
    pub fn record_keystroke_at(&mut self, raw: &str, now: Instant) -> Result<u32, SessionError> {
        self.require_kind("typing")?;
        self.input = raw.to_string();
        if self.answered {
            return Ok(self.wpm);
        }
        let started = *self.typing_started.get_or_insert(now);
        self.wpm = typing::words_per_minute(raw, now.saturating_duration_since(started));
        Ok(self.wpm)
    }

    /// Choose a quiz option without checking it.
    pub fn select_option(&mut self, option: &str) -> Result<(), SessionError> {
        self.require_kind("quiz")?;
        self.input = option.to_string();
        Ok(())
    }

    /// Move past the current question.
    ///
    /// Callers only do this after a correct answer; it is not re-checked here.
    pub fn advance(&mut self) -> Result<AdvanceOutcome, SessionError> {
        let SessionState::InProgress { index } = self.state else {
            return Err(SessionError::Completed);
        };

        if index + 1 >= self.lesson.len() {
            self.state = SessionState::Complete {
                final_score: self.score,
            };
            tracing::debug!(session = %self.id, score = self.score, "session complete");
            return Ok(AdvanceOutcome::Complete {
                final_score: self.score,
            });
        }

        let next = index + 1;
        self.state = SessionState::InProgress { index: next };
        self.input.clear();
        self.feedback = None;
        self.typing_started = None;
        self.wpm = 0;
        self.answered = false;
        tracing::debug!(session = %self.id, index = next, "advanced");
        Ok(AdvanceOutcome::Next { index: next })
    }

    fn award(&mut self, points: u32, advance_after: Duration) -> SubmitOutcome {
        self.score += points;
        self.answered = true;
        SubmitOutcome::Correct {
            points,
            advance_after,
        }
    }

    fn require_question(&self) -> Result<&Question, SessionError> {
        self.current_question().ok_or(SessionError::Completed)
    }

    fn require_kind(&self, expected: &'static str) -> Result<(), SessionError> {
        let question = self.require_question()?;
        if question.kind_name() == expected {
            Ok(())
        } else {
            Err(SessionError::WrongQuestionKind {
                id: question.id.clone(),
                expected,
                actual: question.kind_name(),
            })
        }
    }
}
