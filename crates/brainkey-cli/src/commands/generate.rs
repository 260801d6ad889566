//! The `brainkey generate` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use brainkey_core::model::{GradeLevel, Subject};
use brainkey_core::parser::save_lesson;
use brainkey_core::traits::LessonRequest;

use crate::ProviderArgs;

pub async fn execute(
    subject: String,
    grade: String,
    output: Option<PathBuf>,
    provider_args: ProviderArgs,
) -> Result<()> {
    let subject: Subject = subject.parse().map_err(anyhow::Error::msg)?;
    let grade: GradeLevel = grade.parse()?;
    let mut request = LessonRequest::new(grade, subject);
    if let Some(model) = &provider_args.model {
        request = request.with_model(model.clone());
    }

    let provider = super::provider_from_args(provider_args)?;
    eprintln!("Generating a Grade {grade} {subject} lesson with {}...", provider.name());

    let lesson = provider
        .generate_lesson(&request)
        .await
        .with_context(|| format!("failed to generate {subject} lesson"))?;
    let (quiz, typing) = lesson.mix();
    eprintln!("Got \"{}\": {quiz} quiz, {typing} typing", lesson.title());

    match output {
        Some(path) => {
            save_lesson(&lesson, &path)?;
            eprintln!("Lesson saved to: {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&lesson)?),
    }

    Ok(())
}
