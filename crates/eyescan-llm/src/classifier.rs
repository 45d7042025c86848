//! Classifier abstraction, retry policy and a mock for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use thiserror::Error;

use crate::payload::ImagePayload;

/// Classification errors. None of these ever stand in for a model verdict.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassificationError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Model returned no text")]
    EmptyResponse,
}

impl ClassificationError {
    /// Whether a fresh attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClassificationError::Transport(_) | ClassificationError::Timeout(_) => true,
            ClassificationError::Status { status, .. } => *status == 429 || *status >= 500,
            ClassificationError::MalformedResponse(_) | ClassificationError::EmptyResponse => {
                false
            }
        }
    }
}

pub type ClassificationResult<T> = Result<T, ClassificationError>;

/// A remote (or fake) multimodal model that labels an eye image.
pub trait VisionClassifier {
    /// Send one instruction plus one image and return the normalized reply.
    fn classify(&self, instruction: &str, image: &ImagePayload) -> ClassificationResult<String>;
}

impl<T: VisionClassifier + ?Sized> VisionClassifier for std::sync::Arc<T> {
    fn classify(&self, instruction: &str, image: &ImagePayload) -> ClassificationResult<String> {
        (**self).classify(instruction, image)
    }
}

/// Normalize model output for matching: trimmed and lower-cased.
pub fn normalize_response(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Largest retry count a deployment may configure.
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// Exponential backoff for retryable failures.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt (0 = single attempt)
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_backoff: Duration,
    /// Delay growth factor between retries
    pub multiplier: f64,
    /// Ceiling on any single delay
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff: Duration::from_millis(500),
            multiplier: 2.0,
            max_backoff: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (1-based), never above `max_backoff`.
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(i32::MAX as u32) as i32;
        let factor = self.multiplier.max(1.0).powi(exponent);
        let secs = self.initial_backoff.as_secs_f64() * factor;
        // Overflow and NaN both land on the ceiling
        Duration::try_from_secs_f64(secs)
            .map_or(self.max_backoff, |delay| delay.min(self.max_backoff))
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// retry budget is spent. The last error is returned in the latter cases.
    pub fn run<T, F>(&self, mut op: F) -> ClassificationResult<T>
    where
        F: FnMut(u32) -> ClassificationResult<T>,
    {
        let mut attempt = 0;
        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.backoff(attempt);
                    tracing::warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Classification call failed, retrying"
                    );
                    std::thread::sleep(delay);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

enum MockReply {
    Text(String),
    Failure(ClassificationError),
}

/// Mock classifier with a fixed reply that counts how often it is called.
pub struct MockClassifier {
    reply: MockReply,
    calls: AtomicUsize,
}

impl MockClassifier {
    /// Always answer with `text` (normalized like a real reply).
    pub fn replying(text: &str) -> Self {
        Self {
            reply: MockReply::Text(text.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always fail with `error`.
    pub fn failing(error: ClassificationError) -> Self {
        Self {
            reply: MockReply::Failure(error),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of classify calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl VisionClassifier for MockClassifier {
    fn classify(&self, _instruction: &str, _image: &ImagePayload) -> ClassificationResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            MockReply::Text(text) => Ok(normalize_response(text)),
            MockReply::Failure(e) => Err(e.clone()),
        }
    }
}
