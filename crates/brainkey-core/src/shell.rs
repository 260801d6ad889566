//! Presentation-shell state: the view router and the logged-in user.
//!
//! The shell is synchronous and owns no timers or tasks. It hands the
//! caller a [`LessonRequest`] to fetch and a [`ScheduledAdvance`] to wait
//! for, then accepts the results back tagged with the ticket or session id
//! they were issued for. Anything addressed to a lesson the learner has
//! already left is dropped, so a late fetch or a late timer can never
//! bring a discarded session back.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::ShellError;
use crate::model::{GradeLevel, Lesson, Subject, UserProfile};
use crate::session::{AdvanceOutcome, Session, SessionId, SubmitOutcome};
use crate::traits::LessonRequest;

/// Shown on the dashboard when a lesson could not be fetched.
pub const LOAD_FAILED_NOTICE: &str = "Failed to load lesson. Please try again.";

/// Identifies one lesson fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LessonTicket(u64);

#[derive(Debug)]
pub enum Activity {
    Loading {
        ticket: LessonTicket,
        subject: Subject,
        grade: GradeLevel,
    },
    Running {
        subject: Subject,
        session: Session,
    },
}

#[derive(Debug)]
pub enum View {
    Landing,
    Login,
    Dashboard,
    Activity(Activity),
}

impl View {
    pub fn name(&self) -> &'static str {
        match self {
            View::Landing => "landing",
            View::Login => "login",
            View::Dashboard => "dashboard",
            View::Activity(_) => "activity",
        }
    }
}

/// A correct answer asks the caller to advance this session after `delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledAdvance {
    pub session_id: SessionId,
    pub delay: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Submitted {
    pub outcome: SubmitOutcome,
    pub advance: Option<ScheduledAdvance>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Started(SessionId),
    Failed,
    /// The learner left before the fetch finished.
    Stale,
}

/// A finished lesson, after the stars were credited.
#[derive(Debug, Clone, PartialEq)]
pub struct LessonSummary {
    pub title: String,
    pub subject: Subject,
    pub score: u32,
    pub total_stars: u32,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AdvanceResult {
    Next { index: usize },
    Completed(LessonSummary),
    /// Addressed to a session that is no longer running.
    Stale,
}

/// The application shell.
#[derive(Debug)]
pub struct Shell {
    view: View,
    user: Option<UserProfile>,
    selected_grade: GradeLevel,
    notice: Option<String>,
    next_ticket: u64,
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}

impl Shell {
    pub fn new() -> Self {
        Self {
            view: View::Landing,
            user: None,
            selected_grade: GradeLevel::default(),
            notice: None,
            next_ticket: 0,
        }
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    pub fn selected_grade(&self) -> GradeLevel {
        self.selected_grade
    }

    /// One-shot message for the next render.
    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    pub fn session(&self) -> Option<&Session> {
        match &self.view {
            View::Activity(Activity::Running { session, .. }) => Some(session),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.view, View::Activity(Activity::Loading { .. }))
    }

    pub fn get_started(&mut self) -> Result<(), ShellError> {
        self.expect_view("get started", |v| matches!(v, View::Landing))?;
        self.view = View::Login;
        Ok(())
    }

    pub fn back_to_landing(&mut self) -> Result<(), ShellError> {
        self.expect_view("go back", |v| matches!(v, View::Login))?;
        self.view = View::Landing;
        Ok(())
    }

    pub fn login(&mut self, name: &str, grade: GradeLevel) -> Result<&UserProfile, ShellError> {
        self.expect_view("log in", |v| matches!(v, View::Login))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(ShellError::BlankName);
        }
        tracing::info!(user = name, %grade, "logged in");
        self.selected_grade = grade;
        self.view = View::Dashboard;
        Ok(self.user.insert(UserProfile::new(name, grade)))
    }

    /// Clear the user and whatever lesson was open. Returns the discarded
    /// session, if any, so its pending timer can be cancelled.
    pub fn logout(&mut self) -> Option<SessionId> {
        let discarded = self.session().map(Session::id);
        if let Some(user) = self.user.take() {
            tracing::info!(user = %user.username, stars = user.stars, "logged out");
        }
        self.view = View::Landing;
        self.notice = None;
        self.selected_grade = GradeLevel::default();
        discarded
    }

    pub fn select_grade(&mut self, grade: GradeLevel) -> Result<(), ShellError> {
        self.require_user()?;
        self.expect_view("change grade", |v| matches!(v, View::Dashboard))?;
        self.selected_grade = grade;
        Ok(())
    }

    /// Start fetching a lesson. At most one fetch is in flight at a time.
    pub fn begin_lesson(
        &mut self,
        subject: Subject,
    ) -> Result<(LessonTicket, LessonRequest), ShellError> {
        self.require_user()?;
        if self.is_loading() {
            return Err(ShellError::FetchInFlight);
        }
        self.expect_view("start a lesson", |v| matches!(v, View::Dashboard))?;

        let ticket = LessonTicket(self.next_ticket);
        self.next_ticket += 1;
        let grade = self.selected_grade;
        self.view = View::Activity(Activity::Loading {
            ticket,
            subject,
            grade,
        });
        tracing::info!(%subject, %grade, "loading lesson");
        Ok((ticket, LessonRequest::new(grade, subject)))
    }

    /// Accept the result of a fetch issued by [`Shell::begin_lesson`].
    pub fn lesson_loaded(
        &mut self,
        ticket: LessonTicket,
        result: anyhow::Result<Lesson>,
    ) -> LoadOutcome {
        let subject = match &self.view {
            View::Activity(Activity::Loading {
                ticket: current,
                subject,
                ..
            }) if *current == ticket => *subject,
            _ => {
                tracing::warn!(?ticket, "ignoring lesson for a superseded request");
                return LoadOutcome::Stale;
            }
        };

        match result {
            Ok(lesson) => {
                tracing::info!(title = lesson.title(), questions = lesson.len(), "lesson ready");
                let session = Session::new(lesson);
                let id = session.id();
                self.view = View::Activity(Activity::Running { subject, session });
                LoadOutcome::Started(id)
            }
            Err(e) => {
                tracing::error!("lesson fetch failed: {e:#}");
                self.notice = Some(LOAD_FAILED_NOTICE.to_string());
                self.view = View::Dashboard;
                LoadOutcome::Failed
            }
        }
    }

    /// Leave the activity screen, discarding the session with no credit.
    pub fn exit_lesson(&mut self) -> Result<Option<SessionId>, ShellError> {
        self.expect_view("exit a lesson", |v| matches!(v, View::Activity(_)))?;
        let discarded = self.session().map(Session::id);
        if let Some(id) = discarded {
            tracing::info!(session = %id, "lesson abandoned");
        }
        self.view = View::Dashboard;
        Ok(discarded)
    }

    pub fn select_option(&mut self, option: &str) -> Result<(), ShellError> {
        Ok(self.session_mut()?.select_option(option)?)
    }

    /// Forward a change of the typing buffer. Returns the current WPM.
    pub fn type_text(&mut self, text: &str) -> Result<u32, ShellError> {
        Ok(self.session_mut()?.record_keystroke(text)?)
    }

    pub fn submit(&mut self, input: &str) -> Result<Submitted, ShellError> {
        let session = self.session_mut()?;
        let outcome = session.submit_input(input)?;
        let advance = outcome.advance_after().map(|delay| ScheduledAdvance {
            session_id: session.id(),
            delay,
        });
        Ok(Submitted { outcome, advance })
    }

    /// Move the running session past an answered question.
    ///
    /// Requests for any other session are reported as [`AdvanceResult::Stale`].
    pub fn advance(&mut self, session_id: SessionId) -> Result<AdvanceResult, ShellError> {
        let View::Activity(Activity::Running { subject, session }) = &mut self.view else {
            tracing::debug!(session = %session_id, "advance for a session that is gone");
            return Ok(AdvanceResult::Stale);
        };
        if session.id() != session_id {
            tracing::debug!(session = %session_id, "advance for a superseded session");
            return Ok(AdvanceResult::Stale);
        }
        if !session.is_answered() {
            return Err(ShellError::NotAnswered);
        }

        match session.advance()? {
            AdvanceOutcome::Next { index } => Ok(AdvanceResult::Next { index }),
            AdvanceOutcome::Complete { final_score } => {
                let title = session.lesson().title().to_string();
                let subject = *subject;
                let user = self.user.as_mut().ok_or(ShellError::NotLoggedIn)?;
                user.award(final_score);
                let summary = LessonSummary {
                    title,
                    subject,
                    score: final_score,
                    total_stars: user.stars,
                    completed_at: Utc::now(),
                };
                tracing::info!(
                    %subject,
                    score = final_score,
                    stars = user.stars,
                    "lesson complete"
                );
                self.view = View::Dashboard;
                Ok(AdvanceResult::Completed(summary))
            }
        }
    }

    fn session_mut(&mut self) -> Result<&mut Session, ShellError> {
        match &mut self.view {
            View::Activity(Activity::Running { session, .. }) => Ok(session),
            _ => Err(ShellError::NoActiveLesson),
        }
    }

    fn require_user(&self) -> Result<&UserProfile, ShellError> {
        self.user.as_ref().ok_or(ShellError::NotLoggedIn)
    }

    fn expect_view(
        &self,
        action: &'static str,
        allowed: impl FnOnce(&View) -> bool,
    ) -> Result<(), ShellError> {
        if allowed(&self.view) {
            Ok(())
        } else {
            Err(ShellError::WrongView {
                action,
                view: self.view.name(),
            })
        }
    }
}
