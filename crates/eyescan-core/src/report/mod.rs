//! Report rendering: on-screen markdown, PDF document and saved artifact.

mod artifact;
mod pdf;

pub use artifact::*;
pub use pdf::*;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{title_case, Catalog, Diagnosis, DiseaseEntry, PatientForm};

/// File name the downloadable report is always saved under.
pub const REPORT_FILE_NAME: &str = "Eye_Disease_Report.pdf";

pub const HEALTHY_MESSAGE: &str =
    "The uploaded eye image shows no signs of disease. It appears to be a healthy eye!";
pub const UNSUPPORTED_MESSAGE: &str = "This is not an eye image or an unsupported condition.";
pub const NO_DISEASE_HEADING: &str = "No specific eye disease detected";
pub const NO_DISEASE_ADVICE: &str = "While no specific condition was identified, regular eye check-ups are recommended for maintaining optimal eye health.";

/// Render errors.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Failed to embed image: {0}")]
    ImageEmbed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Disease not in catalog: {0}")]
    UnknownDisease(String),
}

pub type RenderResult<T> = Result<T, RenderError>;

/// Everything a printed report is built from.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub id: Uuid,
    /// RFC 3339, UTC
    pub generated_at: String,
    pub profile: String,
    pub patient: PatientForm,
    pub diagnosis: Diagnosis,
    /// SHA-256 of the analysed image
    pub image_sha256: Option<String>,
}

impl Report {
    pub fn new(
        profile: &str,
        patient: PatientForm,
        diagnosis: Diagnosis,
        image_sha256: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            generated_at: Utc::now().to_rfc3339(),
            profile: profile.to_string(),
            patient,
            diagnosis,
            image_sha256,
        }
    }
}

/// Consult line closing every positive report.
pub fn recommendation(disease: &str) -> String {
    format!(
        "It is crucial to consult an ophthalmologist for a comprehensive examination and personalized treatment plan for {}.",
        disease
    )
}

/// Render the on-screen report for a diagnosis.
///
/// Every outcome gets its own text; failures never read as a healthy eye.
pub fn render_markdown(catalog: &Catalog, diagnosis: &Diagnosis) -> RenderResult<String> {
    match diagnosis {
        Diagnosis::Diagnosed { disease, .. } => {
            let entry = catalog
                .lookup(disease)
                .ok_or_else(|| RenderError::UnknownDisease(disease.clone()))?;
            Ok(disease_markdown(entry))
        }
        Diagnosis::Healthy { .. } => Ok(HEALTHY_MESSAGE.to_string()),
        Diagnosis::Unsupported => Ok(UNSUPPORTED_MESSAGE.to_string()),
        Diagnosis::ClassificationFailed { reason } => Ok(format!(
            "**Analysis failed.** The image could not be classified ({}). No diagnosis was made; please try again later.",
            reason
        )),
        Diagnosis::InputInvalid { reason } => {
            Ok(format!("**Submission rejected.** {}.", reason))
        }
        Diagnosis::ReportFailed { reason } => {
            Ok(format!("**Report unavailable.** {}.", reason))
        }
    }
}

fn disease_markdown(entry: &DiseaseEntry) -> String {
    let mut out = format!("### Detected Disease: {}\n\n", entry.display_name());
    out.push_str("**Symptoms:**\n");
    for symptom in &entry.symptoms {
        out.push_str(&format!("- {}\n", symptom));
    }
    out.push_str("\n**Precautions:**\n");
    for precaution in &entry.precautions {
        out.push_str(&format!("- {}\n", precaution));
    }
    out.push_str("\n**Recommendation:**\n");
    out.push_str(&recommendation(&entry.key));
    out.push('\n');
    out
}

/// Disease section read back from a rendered report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReport {
    /// Lower-case catalog key
    pub disease: String,
    pub symptoms: Vec<String>,
    pub precautions: Vec<String>,
}

/// Parse a positive report produced by [`render_markdown`].
///
/// Returns `None` for the fixed-message outcomes.
pub fn parse_markdown(markdown: &str) -> Option<ParsedReport> {
    enum Section {
        None,
        Symptoms,
        Precautions,
    }

    let mut disease = None;
    let mut symptoms = Vec::new();
    let mut precautions = Vec::new();
    let mut section = Section::None;

    for line in markdown.lines() {
        let line = line.trim_end();
        if let Some(title) = line.strip_prefix("### Detected Disease: ") {
            disease = Some(title.trim().to_lowercase());
        } else if line == "**Symptoms:**" {
            section = Section::Symptoms;
        } else if line == "**Precautions:**" {
            section = Section::Precautions;
        } else if line.starts_with("**") {
            section = Section::None;
        } else if let Some(item) = line.strip_prefix("- ") {
            match section {
                Section::Symptoms => symptoms.push(item.to_string()),
                Section::Precautions => precautions.push(item.to_string()),
                Section::None => {}
            }
        }
    }

    disease.map(|disease| ParsedReport {
        disease,
        symptoms,
        precautions,
    })
}

/// Heading used in printed reports ("Detected Condition: Cataract").
pub(crate) fn condition_title(disease: &str) -> String {
    format!("Detected Condition: {}", title_case(disease))
}
