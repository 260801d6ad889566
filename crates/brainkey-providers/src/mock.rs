//! Mock provider for testing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use brainkey_core::model::Lesson;
use brainkey_core::traits::{LessonProvider, LessonRequest};

use crate::error::ProviderError;

/// A mock lesson provider for exercising the shell and retry logic
/// without real API calls.
///
/// Scripted results are handed out in order; once the script runs dry
/// every call returns the fixed lesson.
pub struct MockProvider {
    /// Returned when the script is empty.
    lesson: Lesson,
    /// Results to hand out before falling back to `lesson`.
    script: Mutex<VecDeque<Result<Lesson, ProviderError>>>,
    /// Simulated latency per call.
    delay: Option<Duration>,
    /// Number of calls made.
    call_count: AtomicU32,
    /// Last request received.
    last_request: Mutex<Option<LessonRequest>>,
}

impl MockProvider {
    /// Create a mock that always returns the same lesson.
    pub fn with_lesson(lesson: Lesson) -> Self {
        Self {
            lesson,
            script: Mutex::new(VecDeque::new()),
            delay: None,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Queue results to return before the fixed lesson.
    pub fn with_script(
        self,
        script: impl IntoIterator<Item = Result<Lesson, ProviderError>>,
    ) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            ..self
        }
    }

    /// Sleep this long before answering each call.
    pub fn with_delay(self, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..self
        }
    }

    /// Get the number of calls made to this provider.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the last request made to this provider.
    pub fn last_request(&self) -> Option<LessonRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl LessonProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate_lesson(&self, request: &LessonRequest) -> anyhow::Result<Lesson> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self.last_request.lock().unwrap_or_else(|e| e.into_inner()) = Some(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        match next {
            Some(result) => Ok(result?),
            None => Ok(self.lesson.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brainkey_core::model::{GradeLevel, Question, Subject};

    fn lesson(title: &str) -> Lesson {
        Lesson::new(
            title,
            "",
            vec![Question::typing("t1", "Type", "Hello world.")],
        )
        .unwrap()
    }

    fn request() -> LessonRequest {
        LessonRequest::new(GradeLevel::new(5).unwrap(), Subject::EnglishGrammar)
    }

    #[tokio::test]
    async fn fixed_lesson() {
        let provider = MockProvider::with_lesson(lesson("Fixed"));

        let result = provider.generate_lesson(&request()).await.unwrap();
        assert_eq!(result.title(), "Fixed");
        assert_eq!(provider.call_count(), 1);
        assert_eq!(
            provider.last_request().map(|r| r.subject),
            Some(Subject::EnglishGrammar)
        );
    }

    #[tokio::test]
    async fn script_then_fixed() {
        let provider = MockProvider::with_lesson(lesson("Fixed")).with_script([
            Err(ProviderError::Timeout(30)),
            Ok(lesson("Scripted")),
        ]);

        let err = provider.generate_lesson(&request()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ProviderError>(),
            Some(ProviderError::Timeout(30))
        ));
        assert_eq!(
            provider.generate_lesson(&request()).await.unwrap().title(),
            "Scripted"
        );
        assert_eq!(
            provider.generate_lesson(&request()).await.unwrap().title(),
            "Fixed"
        );
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn delay_is_simulated() {
        let provider =
            MockProvider::with_lesson(lesson("Slow")).with_delay(Duration::from_secs(3));

        let start = tokio::time::Instant::now();
        provider.generate_lesson(&request()).await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(3));
    }
}
