//! The `brainkey play` command.
//!
//! Line-driven front end for the shell. Stdin lines, finished lesson
//! fetches and auto-advance timers are multiplexed on one task, so the
//! shell itself never needs a lock.

use std::collections::VecDeque;
use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use brainkey_core::error::ShellError;
use brainkey_core::model::{GradeLevel, Lesson, QuestionKind, Subject};
use brainkey_core::scheduler::{AdvanceDue, AdvanceScheduler};
use brainkey_core::session::SessionId;
use brainkey_core::shell::{Activity, AdvanceResult, LessonTicket, LoadOutcome, Shell, View};
use brainkey_core::traits::LessonProvider;

use crate::screen;
use crate::ProviderArgs;

pub async fn execute(
    name: Option<String>,
    grade: Option<String>,
    provider_args: ProviderArgs,
) -> Result<()> {
    let grade = grade
        .map(|g| g.parse::<GradeLevel>())
        .transpose()?
        .unwrap_or_default();
    let provider = super::provider_from_args(provider_args)?;

    let (mut app, inbox) = App::new(provider, grade);
    if let Some(name) = name {
        app.shell.get_started()?;
        app.shell.login(&name, grade)?;
    }

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    run(app, inbox, stdin, &mut stdout).await
}

type FetchDone = (LessonTicket, anyhow::Result<Lesson>);

/// Receivers the event loop waits on besides stdin.
pub struct Inbox {
    fetches: mpsc::UnboundedReceiver<FetchDone>,
    advances: mpsc::UnboundedReceiver<AdvanceDue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Landing,
    Login,
    Dashboard,
    Loading,
    Lesson,
}

impl Screen {
    fn of(shell: &Shell) -> Self {
        match shell.view() {
            View::Landing => Screen::Landing,
            View::Login => Screen::Login,
            View::Dashboard => Screen::Dashboard,
            View::Activity(Activity::Loading { .. }) => Screen::Loading,
            View::Activity(Activity::Running { .. }) => Screen::Lesson,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Redraw,
    Quiet,
    Quit,
}

/// Shell plus the async plumbing around it.
pub struct App {
    shell: Shell,
    provider: Arc<dyn LessonProvider>,
    default_grade: GradeLevel,
    scheduler: AdvanceScheduler,
    fetch_tx: mpsc::UnboundedSender<FetchDone>,
    fetch: Option<JoinHandle<()>>,
    awaiting_advance: Option<SessionId>,
    /// Lines typed while a fetch or an advance was pending.
    type_ahead: VecDeque<String>,
}

impl App {
    pub fn new(provider: Arc<dyn LessonProvider>, default_grade: GradeLevel) -> (Self, Inbox) {
        let (scheduler, advances) = AdvanceScheduler::new();
        let (fetch_tx, fetches) = mpsc::unbounded_channel();
        (
            Self {
                shell: Shell::new(),
                provider,
                default_grade,
                scheduler,
                fetch_tx,
                fetch: None,
                awaiting_advance: None,
                type_ahead: VecDeque::new(),
            },
            Inbox { fetches, advances },
        )
    }

    /// A fetch or an advance is still on its way.
    fn has_pending_work(&self) -> bool {
        self.shell.is_loading() || self.awaiting_advance.is_some()
    }

    fn handle_line(&mut self, line: &str, out: &mut impl Write) -> Result<Flow> {
        let line = line.trim_end_matches(['\r', '\n']);
        let command = line.trim();

        if command == "/quit" {
            return Ok(Flow::Quit);
        }

        let result = match Screen::of(&self.shell) {
            Screen::Landing => match command {
                "" | "start" => self.shell.get_started().map(|_| Flow::Redraw),
                "quit" | "q" => return Ok(Flow::Quit),
                _ => Ok(Flow::Quiet),
            },
            Screen::Login => match command {
                "back" => self.shell.back_to_landing().map(|_| Flow::Redraw),
                _ => self.login(command),
            },
            Screen::Dashboard => self.dashboard_command(command, out)?,
            Screen::Loading | Screen::Lesson if command == "/exit" => {
                self.exit_lesson().map(|_| Flow::Redraw)
            }
            Screen::Loading => Ok(Flow::Quiet),
            Screen::Lesson => self.answer(line),
        };

        match result {
            Ok(flow) => Ok(flow),
            Err(e) => {
                writeln!(out, "! {e}")?;
                Ok(Flow::Quiet)
            }
        }
    }

    fn login(&mut self, command: &str) -> Result<Flow, ShellError> {
        let (name, grade) = split_name_and_grade(command, self.default_grade);
        self.shell.login(name, grade)?;
        Ok(Flow::Redraw)
    }

    fn dashboard_command(
        &mut self,
        command: &str,
        out: &mut impl Write,
    ) -> Result<Result<Flow, ShellError>> {
        if command == "quit" || command == "q" {
            return Ok(Ok(Flow::Quit));
        }
        if command == "logout" {
            self.logout();
            return Ok(Ok(Flow::Redraw));
        }
        if let Some(grade) = command.strip_prefix("grade ") {
            return Ok(match grade.parse::<GradeLevel>() {
                Ok(grade) => self.shell.select_grade(grade).map(|_| Flow::Redraw),
                Err(e) => {
                    writeln!(out, "! {e}")?;
                    Ok(Flow::Quiet)
                }
            });
        }

        match parse_subject(command) {
            Some(subject) => Ok(self.begin_lesson(subject).map(|_| Flow::Redraw)),
            None => {
                if !command.is_empty() {
                    writeln!(out, "! unknown choice: {command}")?;
                }
                Ok(Ok(Flow::Quiet))
            }
        }
    }

    fn begin_lesson(&mut self, subject: Subject) -> Result<(), ShellError> {
        let (ticket, request) = self.shell.begin_lesson(subject)?;
        let provider = Arc::clone(&self.provider);
        let tx = self.fetch_tx.clone();
        self.fetch = Some(tokio::spawn(async move {
            let result = provider.generate_lesson(&request).await;
            // receiver gone means the app is shutting down
            let _ = tx.send((ticket, result));
        }));
        Ok(())
    }

    fn answer(&mut self, line: &str) -> Result<Flow, ShellError> {
        let options = self
            .shell
            .session()
            .and_then(|s| s.current_question())
            .map(|q| match &q.kind {
                QuestionKind::Quiz { options, .. } => Some(options.clone()),
                QuestionKind::Typing { .. } => None,
            })
            .ok_or(ShellError::NoActiveLesson)?;

        let input = match options {
            Some(options) => {
                let choice = resolve_option(line, &options);
                self.shell.select_option(&choice)?;
                choice
            }
            None => {
                self.shell.type_text(line)?;
                line.to_string()
            }
        };

        let submitted = self.shell.submit(&input)?;
        if let Some(advance) = submitted.advance {
            self.scheduler.schedule(advance.session_id, advance.delay);
            self.awaiting_advance = Some(advance.session_id);
        }
        Ok(Flow::Redraw)
    }

    fn exit_lesson(&mut self) -> Result<(), ShellError> {
        if let Some(id) = self.shell.exit_lesson()? {
            self.scheduler.cancel(id);
        }
        self.abort_fetch();
        self.awaiting_advance = None;
        self.type_ahead.clear();
        Ok(())
    }

    fn logout(&mut self) {
        if let Some(id) = self.shell.logout() {
            self.scheduler.cancel(id);
        }
        self.abort_fetch();
        self.awaiting_advance = None;
        self.type_ahead.clear();
    }

    fn abort_fetch(&mut self) {
        if let Some(handle) = self.fetch.take() {
            handle.abort();
        }
    }

    fn on_lesson_loaded(&mut self, ticket: LessonTicket, result: anyhow::Result<Lesson>) -> Flow {
        match self.shell.lesson_loaded(ticket, result) {
            LoadOutcome::Started(_) => {
                self.fetch = None;
                self.start_typing_clock();
                Flow::Redraw
            }
            LoadOutcome::Failed => {
                self.fetch = None;
                self.type_ahead.clear();
                Flow::Redraw
            }
            LoadOutcome::Stale => Flow::Quiet,
        }
    }

    fn on_advance_due(&mut self, due: AdvanceDue, out: &mut impl Write) -> Result<Flow> {
        if self.awaiting_advance == Some(due.session_id) {
            self.awaiting_advance = None;
        }
        match self.shell.advance(due.session_id) {
            Ok(AdvanceResult::Next { .. }) => {
                self.start_typing_clock();
                Ok(Flow::Redraw)
            }
            Ok(AdvanceResult::Completed(summary)) => {
                write!(out, "{}", screen::summary(&summary))?;
                Ok(Flow::Redraw)
            }
            Ok(AdvanceResult::Stale) => Ok(Flow::Quiet),
            Err(e) => {
                tracing::warn!("advance rejected: {e}");
                Ok(Flow::Quiet)
            }
        }
    }

    /// Typing speed is measured from the moment a typing question appears.
    fn start_typing_clock(&mut self) {
        let is_typing = self
            .shell
            .session()
            .and_then(|s| s.current_question())
            .is_some_and(|q| q.is_typing());
        if is_typing {
            if let Err(e) = self.shell.type_text("") {
                tracing::debug!("could not start typing clock: {e}");
            }
        }
    }

    /// Show the result of one event. Returns `false` when the learner quit.
    fn present(&mut self, flow: Flow, out: &mut impl Write) -> Result<bool> {
        match flow {
            Flow::Quit => return Ok(false),
            Flow::Redraw => {
                if let Some(notice) = self.shell.take_notice() {
                    writeln!(out, "! {notice}")?;
                }
                write!(out, "{}", screen::render(&self.shell))?;
            }
            Flow::Quiet => {}
        }
        Ok(true)
    }

    /// Replay queued lines until one of them starts new pending work.
    fn drain_type_ahead(&mut self, out: &mut impl Write) -> Result<bool> {
        while !self.has_pending_work() {
            let Some(line) = self.type_ahead.pop_front() else {
                break;
            };
            let flow = self.handle_line(&line, out)?;
            if !self.present(flow, out)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

fn is_control(line: &str) -> bool {
    matches!(line.trim(), "/exit" | "/quit")
}

/// Drive `app` until the learner quits, or input ends and nothing is pending.
pub async fn run<R, W>(mut app: App, mut inbox: Inbox, input: R, out: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let mut input_open = true;

    write!(out, "{}", screen::render(&app.shell))?;
    out.flush()?;

    loop {
        if !input_open && !app.has_pending_work() {
            break;
        }

        let flow = tokio::select! {
            line = lines.next_line(), if input_open => match line? {
                Some(line) if app.has_pending_work() && !is_control(&line) => {
                    app.type_ahead.push_back(line);
                    Flow::Quiet
                }
                Some(line) => app.handle_line(&line, out)?,
                None => {
                    input_open = false;
                    Flow::Quiet
                }
            },
            Some((ticket, result)) = inbox.fetches.recv() => app.on_lesson_loaded(ticket, result),
            Some(due) = inbox.advances.recv() => app.on_advance_due(due, out)?,
            else => break,
        };

        if !app.present(flow, out)? || !app.drain_type_ahead(out)? {
            break;
        }
        out.flush()?;
    }

    if let Some(user) = app.shell.user() {
        writeln!(out, "Bye {}! You finished with {} stars.", user.username, user.stars)?;
    }
    app.logout();
    Ok(())
}

/// "Ada Lovelace 4" → ("Ada Lovelace", 4). A lone word is always a name.
fn split_name_and_grade(command: &str, default: GradeLevel) -> (&str, GradeLevel) {
    if let Some((name, last)) = command.rsplit_once(char::is_whitespace) {
        if let Ok(grade) = last.parse::<GradeLevel>() {
            return (name.trim(), grade);
        }
    }
    (command, default)
}

/// Dashboard choice by menu number or subject name.
fn parse_subject(command: &str) -> Option<Subject> {
    if let Ok(n) = command.parse::<usize>() {
        return n.checked_sub(1).and_then(|i| Subject::ALL.get(i)).copied();
    }
    command.parse().ok()
}

/// Quiz answers may be given by option number or by text.
fn resolve_option(line: &str, options: &[String]) -> String {
    if options.iter().any(|o| o == line) {
        return line.to_string();
    }
    let answer = line.trim();
    answer
        .parse::<usize>()
        .ok()
        .filter(|n| !options.iter().any(|o| o == answer) && (1..=options.len()).contains(n))
        .map(|n| options[n - 1].clone())
        .unwrap_or_else(|| answer.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use brainkey_core::model::Question;
    use brainkey_providers::mock::MockProvider;

    fn quiz_then_typing() -> Lesson {
        Lesson::new(
            "Numbers",
            "",
            vec![
                Question::quiz("q1", "What is 2 + 2?", ["3", "4", "5", "6"], "4"),
                Question::typing("t1", "Type it", "cat sat"),
            ],
        )
        .unwrap()
    }

    async fn play(provider: Arc<dyn LessonProvider>, script: &str) -> String {
        let (app, inbox) = App::new(provider, GradeLevel::new(3).unwrap());
        let mut out = Vec::new();
        run(app, inbox, script.as_bytes(), &mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn name_and_grade_parsing() {
        let default = GradeLevel::new(2).unwrap();
        assert_eq!(
            split_name_and_grade("Ada Lovelace 7", default),
            ("Ada Lovelace", GradeLevel::new(7).unwrap())
        );
        assert_eq!(split_name_and_grade("Ada", default), ("Ada", default));
        assert_eq!(split_name_and_grade("Ada 11", default), ("Ada 11", default));
    }

    #[test]
    fn subject_choice() {
        assert_eq!(parse_subject("1"), Some(Subject::Math));
        assert_eq!(parse_subject("3"), Some(Subject::ComputerScience));
        assert_eq!(parse_subject("5"), None);
        assert_eq!(parse_subject("0"), None);
        assert_eq!(parse_subject("english"), Some(Subject::EnglishGrammar));
    }

    #[test]
    fn option_by_number_or_text() {
        let options: Vec<String> = ["3", "4", "5", "6"].iter().map(|s| s.to_string()).collect();
        // literal option text wins over its menu number
        assert_eq!(resolve_option("4", &options), "4");
        let words: Vec<String> = ["red", "blue"].iter().map(|s| s.to_string()).collect();
        assert_eq!(resolve_option("2", &words), "blue");
        assert_eq!(resolve_option("9", &words), "9");
        assert_eq!(resolve_option("green", &words), "green");
        assert_eq!(resolve_option(" 2 ", &words), "blue");
        let padded: Vec<String> = [" red ", "blue"].iter().map(|s| s.to_string()).collect();
        assert_eq!(resolve_option(" red ", &padded), " red ");
        assert_eq!(resolve_option("red", &padded), "red");
    }

    #[tokio::test(start_paused = true)]
    async fn full_lesson_awards_stars() {
        let provider = Arc::new(MockProvider::with_lesson(quiz_then_typing()));
        let out = play(provider, "\nAda\n1\n5\n4\ncat sat\n").await;

        assert!(out.contains("Oops! Try again."));
        assert!(out.contains("Correct! Amazing job!"));
        assert!(out.contains("Question 2/2 | Score: 10"));
        assert!(out.contains("Perfect! Speed:"));
        assert!(out.contains("You earned 30 stars in Math. Total stars: 30."));
        assert!(out.contains("Bye Ada! You finished with 30 stars."));
    }

    #[tokio::test(start_paused = true)]
    async fn padded_option_matches_exactly() {
        let lesson = Lesson::new(
            "Spaces",
            "",
            vec![Question::quiz("q1", "Pick the padded one", [" a ", "b", "c", "d"], " a ")],
        )
        .unwrap();
        let provider = Arc::new(MockProvider::with_lesson(lesson));
        let out = play(provider, "\nAda\n1\n a \n").await;

        assert!(out.contains("Correct! Amazing job!"));
        assert!(out.contains("You earned 10 stars in Math."));
    }

    #[tokio::test(start_paused = true)]
    async fn typing_question_completes_lesson() {
        let lesson = Lesson::new("Cats", "", vec![Question::typing("t1", "Type", "cat sat")]).unwrap();
        let provider = Arc::new(MockProvider::with_lesson(lesson));
        let out = play(provider, "\nAda 5\nmath\ncat\ncat sat\n").await;

        assert!(out.contains("Keep typing..."));
        assert!(out.contains("Perfect! Speed:"));
        assert!(out.contains("You earned 20 stars in Math. Total stars: 20."));
        assert!(out.contains("Bye Ada! You finished with 20 stars."));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_fetch_returns_to_dashboard() {
        let provider = Arc::new(
            MockProvider::with_lesson(quiz_then_typing())
                .with_script([Err(brainkey_providers::ProviderError::EmptyResponse)]),
        );
        let out = play(provider, "start\nAda\n2\n").await;

        assert!(out.contains("Failed to load lesson. Please try again."));
        assert!(out.ends_with("Bye Ada! You finished with 0 stars.\n"));
    }

    #[tokio::test(start_paused = true)]
    async fn exit_while_loading_drops_the_lesson() {
        let provider = Arc::new(
            MockProvider::with_lesson(quiz_then_typing())
                .with_delay(std::time::Duration::from_secs(5)),
        );
        let out = play(provider, "\nAda\n1\n/exit\n").await;

        assert!(out.contains("Creating your Math lesson for Grade 3"));
        assert!(!out.contains("What is 2 + 2?"));
    }

    #[tokio::test(start_paused = true)]
    async fn blank_name_is_reported() {
        let provider = Arc::new(MockProvider::with_lesson(quiz_then_typing()));
        let out = play(provider, "\n   \n").await;
        assert!(out.contains("! please enter your name"));
    }
}
