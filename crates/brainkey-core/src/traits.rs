//! The lesson-provider seam.
//!
//! Implemented by the `brainkey-providers` crate. The shell only ever holds
//! an `Arc<dyn LessonProvider>` and awaits one lesson at a time.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::{GradeLevel, Lesson, Subject};

/// Trait for backends that produce lessons.
#[async_trait]
pub trait LessonProvider: Send + Sync {
    /// Human-readable provider name (e.g. "gemini").
    fn name(&self) -> &str;

    /// Produce a lesson for the requested grade and subject.
    async fn generate_lesson(&self, request: &LessonRequest) -> anyhow::Result<Lesson>;
}

/// What the shell asks a provider for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonRequest {
    pub grade: GradeLevel,
    pub subject: Subject,
    /// Model override; providers fall back to their configured model.
    #[serde(default)]
    pub model: Option<String>,
}

impl LessonRequest {
    pub fn new(grade: GradeLevel, subject: Subject) -> Self {
        Self {
            grade,
            subject,
            model: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}
