//! CLI integration tests using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn brainkey() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("brainkey").unwrap()
}

const VALID_LESSON: &str = r#"{
  "title": "Shapes",
  "description": "Sides and corners.",
  "questions": [
    {"id": "q1", "type": "quiz", "prompt": "How many sides does a triangle have?", "options": ["2", "3", "4", "5"], "correctAnswer": "3"},
    {"id": "t1", "type": "typing", "prompt": "Type it:", "typingText": "A square has four equal sides."}
  ]
}"#;

#[test]
fn help_output() {
    brainkey()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("quiz and typing lessons"));
}

#[test]
fn version_output() {
    brainkey()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("brainkey"));
}

#[test]
fn subjects_table() {
    brainkey()
        .arg("subjects")
        .assert()
        .success()
        .stdout(predicate::str::contains("English Grammar"))
        .stdout(predicate::str::contains("AI & Technology"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    brainkey()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created brainkey.toml"))
        .stdout(predicate::str::contains("Created lessons/sample.json"));

    assert!(dir.path().join("brainkey.toml").exists());
    assert!(dir.path().join("lessons/sample.json").exists());
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    brainkey()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    brainkey()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn init_then_validate_sample() {
    let dir = TempDir::new().unwrap();

    brainkey()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    brainkey()
        .current_dir(dir.path())
        .args(["validate", "--lesson", "lessons/sample.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Counting Fun (3 questions)"))
        .stdout(predicate::str::contains("All lessons valid"));
}

#[test]
fn validate_lesson_with_warnings() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("two-options.json");
    std::fs::write(
        &path,
        r#"{"title": "Yes or no", "description": "", "questions": [
            {"id": "q1", "type": "quiz", "prompt": "Is water wet?", "options": ["yes", "no"], "correctAnswer": "yes"}
        ]}"#,
    )
    .unwrap();

    brainkey()
        .arg("validate")
        .arg("--lesson")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("[q1] WARNING: quiz has 2 options"))
        .stdout(predicate::str::contains("1 warning(s) found"));
}

#[test]
fn validate_directory() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("shapes.json"), VALID_LESSON).unwrap();
    std::fs::create_dir(dir.path().join("more")).unwrap();
    std::fs::write(
        dir.path().join("more/shapes-again.json"),
        VALID_LESSON.replace("Shapes", "More Shapes"),
    )
    .unwrap();

    brainkey()
        .arg("validate")
        .arg("--lesson")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Lesson: Shapes"))
        .stdout(predicate::str::contains("Lesson: More Shapes"));
}

#[test]
fn validate_rejects_bad_answer() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, VALID_LESSON.replace(r#""correctAnswer": "3""#, r#""correctAnswer": "7""#))
        .unwrap();

    brainkey()
        .arg("validate")
        .arg("--lesson")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"))
        .stderr(predicate::str::contains("not one of the options"));
}

#[test]
fn validate_nonexistent_file() {
    brainkey()
        .arg("validate")
        .arg("--lesson")
        .arg("nonexistent.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn generate_offline_prints_lesson() {
    brainkey()
        .args(["generate", "--subject", "cs", "--grade", "6", "--offline"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Computer Science - Grade 6 (Offline Mode)",
        ))
        .stdout(predicate::str::contains("\"typingText\""));
}

#[test]
fn generate_offline_saves_lesson() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out/lesson.json");

    brainkey()
        .args(["generate", "--subject", "math", "--grade", "2", "--offline", "--output"])
        .arg(&path)
        .assert()
        .success()
        .stderr(predicate::str::contains("Lesson saved to"));

    let saved = std::fs::read_to_string(&path).unwrap();
    assert!(saved.contains("fallback-1"));
}

#[test]
fn generate_rejects_bad_grade() {
    brainkey()
        .args(["generate", "--subject", "math", "--grade", "12", "--offline"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("grade must be between 1 and 10"));
}

#[test]
fn generate_rejects_unknown_subject() {
    brainkey()
        .args(["generate", "--subject", "history", "--grade", "3", "--offline"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown subject"));
}

#[test]
fn play_offline_lesson_to_completion() {
    brainkey()
        .args(["play", "--offline", "--name", "Ada", "--grade", "2"])
        .write_stdin("2\nTechnology helps\nTechnology helps us learn and grow every single day.\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Hi Ada! Grade 2 | Stars: 0"))
        .stdout(predicate::str::contains("English Grammar - Grade 2 (Offline Mode)"))
        .stdout(predicate::str::contains("Keep typing..."))
        .stdout(predicate::str::contains("Perfect! Speed:"))
        .stdout(predicate::str::contains("Total stars: 20."))
        .stdout(predicate::str::contains("Bye Ada! You finished with 20 stars."));
}

#[test]
fn play_missing_config_file() {
    brainkey()
        .args(["play", "--config", "no-such-config.toml"])
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}
