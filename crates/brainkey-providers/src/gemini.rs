//! Google Gemini provider implementation.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use brainkey_core::model::Lesson;
use brainkey_core::traits::{LessonProvider, LessonRequest};

use crate::error::ProviderError;
use crate::prompt::{lesson_prompt, lesson_response_schema, parse_generated_lesson, SYSTEM_INSTRUCTION};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Gemini `generateContent` provider.
pub struct GeminiProvider {
    api_key: String,
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(
        api_key: &str,
        base_url: Option<String>,
        model: Option<String>,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        Ok(Self {
            api_key: api_key.to_string(),
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    system_instruction: GeminiContent,
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize, Default)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: GeminiContent,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Deserialize)]
struct GeminiErrorBody {
    error: GeminiErrorDetail,
}

#[derive(Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<GeminiErrorBody>(body)
        .ok()
        .map(|b| b.error.message)
}

#[async_trait]
impl LessonProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    #[instrument(skip(self, request), fields(subject = %request.subject, grade = %request.grade))]
    async fn generate_lesson(&self, request: &LessonRequest) -> anyhow::Result<Lesson> {
        let start = Instant::now();
        let model = request.model.as_deref().unwrap_or(&self.model);

        let body = GeminiRequest {
            system_instruction: GeminiContent {
                role: None,
                parts: vec![GeminiPart {
                    text: SYSTEM_INSTRUCTION.to_string(),
                }],
            },
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: lesson_prompt(request.subject, request.grade),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: lesson_response_schema(),
            },
        };

        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{model}:generateContent",
                self.base_url
            ))
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::from_transport(e, DEFAULT_TIMEOUT_SECS))?;

        if !response.status().is_success() {
            return Err(ProviderError::from_response(response, model, error_message)
                .await
                .into());
        }

        let api_response: GeminiResponse = response.json().await.map_err(|e| {
            ProviderError::MalformedLesson(format!("failed to parse response: {e}"))
        })?;

        if let Some(usage) = &api_response.usage_metadata {
            debug!(
                prompt_tokens = usage.prompt_token_count,
                output_tokens = usage.candidates_token_count,
                latency_ms = start.elapsed().as_millis() as u64,
                "gemini usage"
            );
        }

        let text: String = api_response
            .candidates
            .first()
            .map(|c| c.content.parts.iter().map(|p| p.text.as_str()).collect())
            .unwrap_or_default();

        Ok(parse_generated_lesson(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brainkey_core::model::{GradeLevel, Subject};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> LessonRequest {
        LessonRequest::new(GradeLevel::new(3).unwrap(), Subject::Math)
    }

    fn candidate(text: &str) -> Value {
        serde_json::json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}],
            "usageMetadata": {"promptTokenCount": 120, "candidatesTokenCount": 300}
        })
    }

    const LESSON_JSON: &str = r#"{
        "title": "Adding Up",
        "description": "Practice addition.",
        "questions": [
            {"id": "q1", "type": "quiz", "prompt": "2 + 2?", "options": ["3", "4", "5", "6"], "correctAnswer": "4"},
            {"id": "t1", "type": "typing", "prompt": "Type it", "typingText": "Two plus two is four."}
        ]
    }"#;

    #[tokio::test]
    async fn successful_generation() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(serde_json::json!({
                "generationConfig": {"responseMimeType": "application/json"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(candidate(LESSON_JSON)))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new("test-key", Some(server.uri()), None).unwrap();
        let lesson = provider.generate_lesson(&request()).await.unwrap();
        assert_eq!(lesson.title(), "Adding Up");
        assert_eq!(lesson.len(), 2);
    }

    #[tokio::test]
    async fn request_model_overrides_default() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.0-pro:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(candidate(LESSON_JSON)))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new("key", Some(server.uri()), None).unwrap();
        let lesson = provider
            .generate_lesson(&request().with_model("gemini-2.0-pro"))
            .await
            .unwrap();
        assert_eq!(lesson.len(), 2);
    }

    #[tokio::test]
    async fn empty_candidates() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"candidates": []})),
            )
            .mount(&server)
            .await;

        let provider = GeminiProvider::new("key", Some(server.uri()), None).unwrap();
        let err = provider.generate_lesson(&request()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ProviderError>(),
            Some(ProviderError::EmptyResponse)
        ));
    }

    #[tokio::test]
    async fn invalid_lesson_is_malformed() {
        let server = MockServer::start().await;

        let bad = r#"{"title": "T", "description": "", "questions": [
            {"id": "q1", "type": "quiz", "prompt": "?", "options": ["a", "b"], "correctAnswer": "c"}
        ]}"#;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(candidate(bad)))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new("key", Some(server.uri()), None).unwrap();
        let err = provider.generate_lesson(&request()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ProviderError>(),
            Some(ProviderError::MalformedLesson(_))
        ));
    }

    #[tokio::test]
    async fn auth_error_reads_message() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "error": {"code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED"}
            })))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new("bad", Some(server.uri()), None).unwrap();
        let err = provider.generate_lesson(&request()).await.unwrap_err();
        match err.downcast_ref::<ProviderError>() {
            Some(ProviderError::AuthenticationFailed(message)) => {
                assert_eq!(message, "API key not valid")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn rate_limit_uses_retry_after() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "2"))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new("key", Some(server.uri()), None).unwrap();
        let err = provider.generate_lesson(&request()).await.unwrap_err();
        let provider_err = err.downcast_ref::<ProviderError>().unwrap();
        assert_eq!(provider_err.retry_after_ms(), Some(2000));
    }

    #[tokio::test]
    async fn unknown_model() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let provider =
            GeminiProvider::new("key", Some(server.uri()), Some("gemini-9".into())).unwrap();
        let err = provider.generate_lesson(&request()).await.unwrap_err();
        assert!(err.to_string().contains("gemini-9"));
    }
}
