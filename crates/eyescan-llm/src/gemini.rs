//! HTTP client for the hosted multimodal model (`generateContent` API).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::classifier::{
    normalize_response, ClassificationError, ClassificationResult, RetryPolicy, VisionClassifier,
};
use crate::payload::ImagePayload;

/// Default public endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Default model name.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Connection settings for [`GeminiClient`].
#[derive(Clone)]
pub struct GeminiSettings {
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
    pub timeout_secs: u64,
    pub retry: RetryPolicy,
}

impl std::fmt::Debug for GeminiSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiSettings")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .field("retry", &self.retry)
            .finish()
    }
}

impl GeminiSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: api_key.into(),
            timeout_secs: 30,
            retry: RetryPolicy::default(),
        }
    }
}

/// Blocking client for a `generateContent` endpoint.
pub struct GeminiClient {
    endpoint: String,
    model: String,
    api_key: String,
    timeout_secs: u64,
    retry: RetryPolicy,
    client: reqwest::blocking::Client,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Build a client. Fails only if the TLS backend cannot be initialised.
    pub fn new(settings: GeminiSettings) -> ClassificationResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| ClassificationError::Transport(e.to_string()))?;

        Ok(Self {
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            model: settings.model,
            api_key: settings.api_key,
            timeout_secs: settings.timeout_secs,
            retry: settings.retry,
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.endpoint, self.model)
    }

    fn send_once(&self, body: &GenerateRequest<'_>) -> ClassificationResult<String> {
        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    ClassificationError::Timeout(self.timeout_secs)
                } else {
                    ClassificationError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ClassificationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response
            .text()
            .map_err(|e| ClassificationError::Transport(e.to_string()))?;
        extract_text(&text)
    }
}

impl VisionClassifier for GeminiClient {
    fn classify(&self, instruction: &str, image: &ImagePayload) -> ClassificationResult<String> {
        let encoded = image.to_base64();
        let body = GenerateRequest::new(instruction, image.media_type(), &encoded);

        tracing::debug!(
            model = %self.model,
            media_type = image.media_type(),
            image_sha256 = image.sha256(),
            "Sending classification request"
        );

        let text = self.retry.run(|_| self.send_once(&body))?;
        Ok(normalize_response(&text))
    }
}

/// Request body for `generateContent`.
#[derive(Debug, Serialize)]
pub struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    InlineData { inline_data: InlineData<'a> },
}

#[derive(Debug, Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

impl<'a> GenerateRequest<'a> {
    /// One content entry: the instruction text followed by the inline image.
    pub fn new(instruction: &'a str, mime_type: &'a str, base64_data: &'a str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![
                    Part::Text { text: instruction },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type,
                            data: base64_data,
                        },
                    },
                ],
            }],
        }
    }
}

/// Response body from `generateContent`.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Pull the reply text out of a raw `generateContent` response body.
///
/// Only the first candidate is read; its text parts are concatenated.
pub fn extract_text(body: &str) -> ClassificationResult<String> {
    let parsed: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| ClassificationError::MalformedResponse(e.to_string()))?;

    let candidate = parsed
        .candidates
        .into_iter()
        .next()
        .ok_or(ClassificationError::EmptyResponse)?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(ClassificationError::EmptyResponse);
    }
    Ok(text)
}
