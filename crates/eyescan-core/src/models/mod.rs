//! Domain models for eye screening.

mod catalog;
mod diagnosis;
mod image;
mod patient;

pub use catalog::*;
pub use diagnosis::*;
pub use image::*;
pub use patient::*;

use thiserror::Error;

/// Problems with what the user submitted. Raised before any remote call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("Required field is missing: {0}")]
    MissingField(&'static str),

    #[error("Unrecognised gender: {0}")]
    InvalidGender(String),

    #[error("Age {age} is outside the accepted range 1-{max}")]
    AgeOutOfRange { age: u32, max: u32 },

    #[error("Select at least one symptom or factor")]
    NoSymptomOrFactor,

    #[error("No image uploaded")]
    NoImage,

    #[error("Unsupported image type: {0}")]
    UnsupportedMediaType(String),

    #[error("Image declared as {declared} but its content is {detected}")]
    MediaTypeMismatch { declared: String, detected: String },

    #[error("Image is {size} bytes, larger than the {max} byte limit")]
    ImageTooLarge { size: usize, max: usize },
}
