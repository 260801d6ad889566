//! The `brainkey init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    if Path::new("brainkey.toml").exists() {
        println!("brainkey.toml already exists, skipping.");
    } else {
        std::fs::write("brainkey.toml", SAMPLE_CONFIG)?;
        println!("Created brainkey.toml");
    }

    std::fs::create_dir_all("lessons")?;
    let sample_path = Path::new("lessons/sample.json");
    if sample_path.exists() {
        println!("lessons/sample.json already exists, skipping.");
    } else {
        std::fs::write(sample_path, SAMPLE_LESSON)?;
        println!("Created lessons/sample.json");
    }

    println!("\nNext steps:");
    println!("  1. Put your Gemini API key in GEMINI_API_KEY (or edit brainkey.toml)");
    println!("  2. Run: brainkey validate --lesson lessons/sample.json");
    println!("  3. Run: brainkey play");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# brainkey configuration

default_provider = "gemini"
default_model = "gemini-2.5-flash"
max_retries = 2
retry_delay_ms = 1000
# Serve a built-in typing exercise when the provider cannot be reached
offline_fallback = true

[providers.gemini]
type = "gemini"
api_key = "${GEMINI_API_KEY}"

# Any OpenAI-compatible server, e.g. a local Ollama
[providers.local]
type = "openai"
api_key = "${OPENAI_API_KEY}"
base_url = "http://localhost:11434"
"#;

const SAMPLE_LESSON: &str = r#"{
  "title": "Counting Fun",
  "description": "Warm up with addition and a number sentence.",
  "questions": [
    {
      "id": "q1",
      "type": "quiz",
      "prompt": "What is 2 + 2?",
      "options": ["3", "4", "5", "6"],
      "correctAnswer": "4"
    },
    {
      "id": "q2",
      "type": "quiz",
      "prompt": "Which number comes after 9?",
      "options": ["8", "10", "11", "19"],
      "correctAnswer": "10"
    },
    {
      "id": "t1",
      "type": "typing",
      "prompt": "Type the number sentence:",
      "typingText": "Three plus four equals seven."
    }
  ]
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use brainkey_core::model::Lesson;
    use brainkey_core::parser::review_lesson;

    #[test]
    fn sample_lesson_is_clean() {
        let lesson: Lesson = serde_json::from_str(SAMPLE_LESSON).unwrap();
        assert_eq!(lesson.mix(), (2, 1));
        assert!(review_lesson(&lesson).is_empty());
    }

    #[test]
    fn sample_config_parses() {
        let config: brainkey_providers::BrainkeyConfig = toml::from_str(SAMPLE_CONFIG).unwrap();
        assert_eq!(config.providers.len(), 2);
        assert_eq!(config.default_provider, "gemini");
    }
}
