//! Uploaded image handling.

use eyescan_llm::ImagePayload;

use super::InputError;

/// Largest accepted upload (20 MiB).
pub const MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;

/// Media types the upload surface accepts.
pub const ACCEPTED_MEDIA_TYPES: &[&str] = &["image/jpeg", "image/png"];

/// An image as received from the upload surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    bytes: Vec<u8>,
    media_type: String,
}

impl UploadedImage {
    pub fn new(bytes: Vec<u8>, media_type: impl Into<String>) -> Self {
        Self {
            bytes,
            media_type: media_type.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Media type as declared by the uploader.
    pub fn media_type(&self) -> &str {
        &self.media_type
    }
}

/// Package an upload for the classifier.
///
/// The declared type must be JPEG or PNG and must agree with the file's
/// magic bytes; the declared value alone is not trusted.
pub fn pack(upload: Option<&UploadedImage>) -> Result<ImagePayload, InputError> {
    let upload = upload.ok_or(InputError::NoImage)?;
    if upload.bytes.is_empty() {
        return Err(InputError::NoImage);
    }
    if upload.bytes.len() > MAX_IMAGE_BYTES {
        return Err(InputError::ImageTooLarge {
            size: upload.bytes.len(),
            max: MAX_IMAGE_BYTES,
        });
    }

    let declared = canonical_media_type(&upload.media_type);
    if !ACCEPTED_MEDIA_TYPES.contains(&declared.as_str()) {
        return Err(InputError::UnsupportedMediaType(upload.media_type.clone()));
    }

    let detected = detect_media_type(&upload.bytes).unwrap_or("application/octet-stream");
    if detected != declared {
        return Err(InputError::MediaTypeMismatch {
            declared,
            detected: detected.to_string(),
        });
    }

    Ok(ImagePayload::new(declared, upload.bytes.clone()))
}

/// Lower-case a declared type and fold the common "image/jpg" spelling.
pub fn canonical_media_type(media_type: &str) -> String {
    let lower = media_type.trim().to_lowercase();
    match lower.as_str() {
        "image/jpg" | "image/pjpeg" => "image/jpeg".to_string(),
        _ => lower,
    }
}

/// Detect JPEG or PNG from magic bytes.
pub fn detect_media_type(bytes: &[u8]) -> Option<&'static str> {
    // JPEG: FF D8 FF
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }
    // PNG: 89 50 4E 47 0D 0A 1A 0A
    if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("image/png");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    const JPEG_HEADER: [u8; 4] = [0xFF, 0xD8, 0xFF, 0xE0];

    #[test]
    fn test_missing_image_is_input_error() {
        assert_eq!(pack(None), Err(InputError::NoImage));
        let empty = UploadedImage::new(Vec::new(), "image/png");
        assert_eq!(pack(Some(&empty)), Err(InputError::NoImage));
    }

    #[test]
    fn test_pack_png() {
        let upload = UploadedImage::new(PNG_HEADER.to_vec(), "image/png");
        let payload = pack(Some(&upload)).unwrap();
        assert_eq!(payload.media_type(), "image/png");
        assert_eq!(payload.data(), &PNG_HEADER);
    }

    #[test]
    fn test_pack_folds_jpg_alias() {
        let upload = UploadedImage::new(JPEG_HEADER.to_vec(), "Image/JPG");
        let payload = pack(Some(&upload)).unwrap();
        assert_eq!(payload.media_type(), "image/jpeg");
    }

    #[test]
    fn test_rejects_unsupported_type() {
        let upload = UploadedImage::new(b"GIF89a".to_vec(), "image/gif");
        assert_eq!(
            pack(Some(&upload)),
            Err(InputError::UnsupportedMediaType("image/gif".into()))
        );
    }

    #[test]
    fn test_rejects_declared_type_mismatch() {
        let upload = UploadedImage::new(JPEG_HEADER.to_vec(), "image/png");
        assert_eq!(
            pack(Some(&upload)),
            Err(InputError::MediaTypeMismatch {
                declared: "image/png".into(),
                detected: "image/jpeg".into(),
            })
        );

        let text = UploadedImage::new(b"not an image".to_vec(), "image/jpeg");
        assert!(matches!(
            pack(Some(&text)),
            Err(InputError::MediaTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_rejects_oversized_upload() {
        let mut bytes = PNG_HEADER.to_vec();
        bytes.resize(MAX_IMAGE_BYTES + 1, 0);
        let upload = UploadedImage::new(bytes, "image/png");
        assert!(matches!(
            pack(Some(&upload)),
            Err(InputError::ImageTooLarge { .. })
        ));
    }
}
