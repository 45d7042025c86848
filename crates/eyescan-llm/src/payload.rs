//! Image payload sent alongside the instruction prompt.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use sha2::{Digest, Sha256};

/// Raw image bytes plus the media type reported to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    media_type: String,
    data: Vec<u8>,
    sha256: String,
}

impl ImagePayload {
    /// Wrap image bytes. The digest is computed once here so that logs and
    /// reports can refer to the image without carrying the bytes around.
    pub fn new(media_type: impl Into<String>, data: Vec<u8>) -> Self {
        let sha256 = hex::encode(Sha256::digest(&data));
        Self {
            media_type: media_type.into(),
            data,
            sha256,
        }
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Hex-encoded SHA-256 of the image bytes.
    pub fn sha256(&self) -> &str {
        &self.sha256
    }

    /// Base64 form used for inline data in the request body.
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.data)
    }
}
