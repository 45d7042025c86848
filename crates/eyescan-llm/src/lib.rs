//! Multimodal model client for eye image classification.
//!
//! This crate builds the instruction prompt, packages the image for the wire,
//! and talks to a hosted `generateContent` endpoint. Replies come back
//! normalized (trimmed, lower-cased); failures come back as
//! [`ClassificationError`], never as reply text.

pub mod classifier;
pub mod gemini;
pub mod payload;
pub mod prompts;

pub use classifier::*;
pub use gemini::{GeminiClient, GeminiSettings, DEFAULT_ENDPOINT, DEFAULT_MODEL};
pub use payload::ImagePayload;
pub use prompts::*;
