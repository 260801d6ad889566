//! Text rendering of the shell's current view.

use std::fmt::Write;

use chrono::Local;

use brainkey_core::model::{QuestionKind, Subject};
use brainkey_core::session::{FeedbackKind, Session};
use brainkey_core::shell::{Activity, LessonSummary, Shell, View};

const PROGRESS_WIDTH: usize = 20;

/// Render whatever the shell is showing.
pub fn render(shell: &Shell) -> String {
    let mut out = String::new();
    match shell.view() {
        View::Landing => landing(&mut out),
        View::Login => login(&mut out, shell),
        View::Dashboard => dashboard(&mut out, shell),
        View::Activity(Activity::Loading { subject, grade, .. }) => {
            let _ = writeln!(out, "Creating your {subject} lesson for Grade {grade}...");
            let _ = writeln!(out, "(type /exit to go back)");
        }
        View::Activity(Activity::Running { subject, session }) => {
            activity(&mut out, *subject, session)
        }
    }
    out
}

fn landing(out: &mut String) {
    let _ = writeln!(out, "=== BrainKey Academy ===");
    let _ = writeln!(out, "Learn math, grammar, computing and AI one question at a time.");
    let _ = writeln!(out, "Press Enter (or type 'start') to get started, 'quit' to leave.");
}

fn login(out: &mut String, shell: &Shell) {
    let _ = writeln!(out, "--- Login ---");
    let _ = writeln!(
        out,
        "Enter your name and grade, e.g. 'Ada 4' (grade defaults to {}). 'back' returns.",
        shell.selected_grade()
    );
}

fn dashboard(out: &mut String, shell: &Shell) {
    if let Some(user) = shell.user() {
        let _ = writeln!(
            out,
            "--- Hi {}! Grade {} | Stars: {} ---",
            user.username,
            shell.selected_grade(),
            user.stars
        );
    }
    for (n, subject) in Subject::ALL.iter().enumerate() {
        let _ = writeln!(out, "  {}) {subject}", n + 1);
    }
    let _ = writeln!(out, "Pick a subject, 'grade N' to change grade, 'logout' or 'quit'.");
}

fn activity(out: &mut String, subject: Subject, session: &Session) {
    let _ = writeln!(
        out,
        "--- {} ({subject}) ---",
        session.lesson().title()
    );
    let _ = writeln!(
        out,
        "{} Question {}/{} | Score: {}",
        progress_bar(session.progress()),
        (session.index() + 1).min(session.total()),
        session.total(),
        session.score()
    );

    let Some(question) = session.current_question() else {
        return;
    };
    let _ = writeln!(out, "{}", question.prompt);
    match &question.kind {
        QuestionKind::Quiz { options, .. } => {
            for (n, option) in options.iter().enumerate() {
                let marker = if session.input() == option { '>' } else { ' ' };
                let _ = writeln!(out, " {marker}{}) {option}", n + 1);
            }
        }
        QuestionKind::Typing { typing_text } => {
            let _ = writeln!(out, "  \"{typing_text}\"");
            let _ = writeln!(out, "WPM: {}", session.wpm());
        }
    }

    if let Some(feedback) = session.feedback() {
        let icon = match feedback.kind {
            FeedbackKind::Success => "[ok]",
            FeedbackKind::Error => "[x]",
            FeedbackKind::Neutral => "[..]",
        };
        let _ = writeln!(out, "{icon} {}", feedback.message);
    }
    if session.is_answered() {
        let next = if session.is_last() {
            "Finishing up..."
        } else {
            "Next question coming up..."
        };
        let _ = writeln!(out, "{next}");
    }
}

/// Completion banner shown on the way back to the dashboard.
pub fn summary(summary: &LessonSummary) -> String {
    let finished = summary.completed_at.with_timezone(&Local).format("%H:%M");
    format!(
        "*** Lesson complete: {} ({finished}) ***\nYou earned {} stars in {}. Total stars: {}.\n",
        summary.title, summary.score, summary.subject, summary.total_stars
    )
}

fn progress_bar(progress: f64) -> String {
    let filled = ((progress.clamp(0.0, 1.0) * PROGRESS_WIDTH as f64).round()) as usize;
    format!(
        "[{}{}]",
        "#".repeat(filled),
        "-".repeat(PROGRESS_WIDTH - filled)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use brainkey_core::model::{GradeLevel, Lesson, Question};

    fn logged_in() -> Shell {
        let mut shell = Shell::new();
        shell.get_started().unwrap();
        shell.login("Ada", GradeLevel::new(4).unwrap()).unwrap();
        shell
    }

    fn running(lesson: Lesson) -> Shell {
        let mut shell = logged_in();
        let (ticket, _) = shell.begin_lesson(Subject::Math).unwrap();
        shell.lesson_loaded(ticket, Ok(lesson));
        shell
    }

    #[test]
    fn landing_screen() {
        assert!(render(&Shell::new()).contains("BrainKey Academy"));
    }

    #[test]
    fn dashboard_lists_subjects_and_stars() {
        let text = render(&logged_in());
        assert!(text.contains("Hi Ada! Grade 4 | Stars: 0"));
        assert!(text.contains("1) Math"));
        assert!(text.contains("4) AI & Technology"));
    }

    #[test]
    fn quiz_screen_marks_selection_and_feedback() {
        let lesson = Lesson::new(
            "Sums",
            "",
            vec![
                Question::quiz("q1", "2 + 2?", ["3", "4", "5", "6"], "4"),
                Question::typing("t1", "Type", "four"),
            ],
        )
        .unwrap();
        let mut shell = running(lesson);
        shell.submit("5").unwrap();

        let text = render(&shell);
        assert!(text.contains("Question 1/2 | Score: 0"));
        assert!(text.contains(" >3) 5"));
        assert!(text.contains("[x] Oops! Try again."));
    }

    #[test]
    fn typing_screen_shows_target_and_wpm() {
        let lesson =
            Lesson::new("Type", "", vec![Question::typing("t1", "Copy this", "cat sat")]).unwrap();
        let mut shell = running(lesson);
        shell.submit("cat").unwrap();

        let text = render(&shell);
        assert!(text.contains("\"cat sat\""));
        assert!(text.contains("WPM: 0"));
        assert!(text.contains("[..] Keep typing..."));
    }

    #[test]
    fn summary_banner() {
        let text = summary(&LessonSummary {
            title: "Sums".into(),
            subject: Subject::Math,
            score: 30,
            total_stars: 50,
            completed_at: chrono::Utc::now(),
        });
        assert!(text.starts_with("*** Lesson complete: Sums ("));
        assert!(text.contains("You earned 30 stars in Math. Total stars: 50."));
    }

    #[test]
    fn progress_bar_bounds() {
        assert_eq!(progress_bar(0.0), format!("[{}]", "-".repeat(PROGRESS_WIDTH)));
        assert_eq!(progress_bar(1.0), format!("[{}]", "#".repeat(PROGRESS_WIDTH)));
    }
}
