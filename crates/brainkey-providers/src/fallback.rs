//! Retry wrapper and the offline lesson used when generation fails.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use brainkey_core::error::LessonError;
use brainkey_core::model::{Lesson, Question};
use brainkey_core::traits::{LessonProvider, LessonRequest};

use crate::error::ProviderError;

const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

pub const OFFLINE_QUESTION_ID: &str = "fallback-1";
const OFFLINE_DESCRIPTION: &str =
    "We couldn't connect to the AI brain. Here is a sample typing exercise.";
const OFFLINE_PROMPT: &str = "Type the following sentence accurately:";
const OFFLINE_TEXT: &str = "Technology helps us learn and grow every single day.";

/// The one-question typing lesson shown when no provider can answer.
pub fn offline_lesson(request: &LessonRequest) -> Result<Lesson, LessonError> {
    Lesson::new(
        format!("{} - Grade {} (Offline Mode)", request.subject, request.grade),
        OFFLINE_DESCRIPTION,
        vec![Question::typing(OFFLINE_QUESTION_ID, OFFLINE_PROMPT, OFFLINE_TEXT)],
    )
}

/// Provider that never leaves the machine.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineProvider;

#[async_trait]
impl LessonProvider for OfflineProvider {
    fn name(&self) -> &str {
        "offline"
    }

    async fn generate_lesson(&self, request: &LessonRequest) -> anyhow::Result<Lesson> {
        Ok(offline_lesson(request)?)
    }
}

/// Wraps a provider with retries and, optionally, the offline lesson.
///
/// Transient failures are retried with exponential backoff starting at
/// `retry_delay` and capped at one minute. A rate limit's retry-after
/// hint replaces the next delay. Authentication failures and unknown
/// models are not retried.
pub struct ResilientProvider {
    inner: Arc<dyn LessonProvider>,
    max_retries: u32,
    retry_delay: Duration,
    fallback: bool,
}

impl ResilientProvider {
    pub fn new(inner: Arc<dyn LessonProvider>) -> Self {
        Self {
            inner,
            max_retries: 2,
            retry_delay: Duration::from_secs(1),
            fallback: true,
        }
    }

    pub fn with_retries(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }

    pub fn with_fallback(mut self, fallback: bool) -> Self {
        self.fallback = fallback;
        self
    }

    async fn generate_with_retries(&self, request: &LessonRequest) -> anyhow::Result<Lesson> {
        let mut last_error = None;
        let mut retry_delay = self.retry_delay;
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                debug!(attempt, delay_ms = retry_delay.as_millis() as u64, "retrying lesson generation");
                tokio::time::sleep(retry_delay).await;
                retry_delay = (retry_delay * 2).min(MAX_RETRY_DELAY);
            }
            match self.inner.generate_lesson(request).await {
                Ok(lesson) => return Ok(lesson),
                Err(e) => {
                    if let Some(provider_err) = e.downcast_ref::<ProviderError>() {
                        if provider_err.is_permanent() {
                            return Err(e);
                        }
                        if let Some(ms) = provider_err.retry_after_ms() {
                            retry_delay = Duration::from_millis(ms).min(MAX_RETRY_DELAY);
                        }
                    }
                    warn!(provider = self.inner.name(), attempt, error = %e, "lesson generation failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("no attempts made")))
    }
}

#[async_trait]
impl LessonProvider for ResilientProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn generate_lesson(&self, request: &LessonRequest) -> anyhow::Result<Lesson> {
        match self.generate_with_retries(request).await {
            Ok(lesson) => {
                info!(provider = self.inner.name(), title = lesson.title(), "lesson generated");
                Ok(lesson)
            }
            Err(e) if self.fallback => {
                warn!(provider = self.inner.name(), error = %e, "using offline lesson");
                Ok(offline_lesson(request)?)
            }
            Err(e) => Err(e),
        }
    }
}
