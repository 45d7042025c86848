//! Screening outcome models.

use serde::{Deserialize, Serialize};

use super::RiskFactor;

/// What decided a diagnosis.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosisSource {
    /// A form override fired; the classifier was not called
    Override(RiskFactor),
    /// The classifier's reply was matched against the catalog
    Classifier,
}

/// Terminal state of one screening request.
///
/// Failures have their own variants so that they can never be mistaken for
/// a healthy verdict.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Diagnosis {
    /// A catalog disease was identified
    Diagnosed {
        disease: String,
        source: DiagnosisSource,
    },
    /// No disease found
    Healthy { source: DiagnosisSource },
    /// The model reported a non-eye image or an unlisted condition
    Unsupported,
    /// The remote classification call failed
    ClassificationFailed { reason: String },
    /// The submission was rejected before analysis
    InputInvalid { reason: String },
    /// Analysis finished but the report could not be produced
    ReportFailed { reason: String },
}

impl Diagnosis {
    /// The resolved catalog key, if any.
    pub fn disease(&self) -> Option<&str> {
        match self {
            Diagnosis::Diagnosed { disease, .. } => Some(disease.as_str()),
            _ => None,
        }
    }

    pub fn source(&self) -> Option<DiagnosisSource> {
        match self {
            Diagnosis::Diagnosed { source, .. } | Diagnosis::Healthy { source } => Some(*source),
            _ => None,
        }
    }

    /// Whether the request ended in an error state rather than a verdict.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Diagnosis::ClassificationFailed { .. }
                | Diagnosis::InputInvalid { .. }
                | Diagnosis::ReportFailed { .. }
        )
    }

    /// Short machine label ("diagnosed", "healthy", ...).
    pub fn status(&self) -> &'static str {
        match self {
            Diagnosis::Diagnosed { .. } => "diagnosed",
            Diagnosis::Healthy { .. } => "healthy",
            Diagnosis::Unsupported => "unsupported",
            Diagnosis::ClassificationFailed { .. } => "classification_failed",
            Diagnosis::InputInvalid { .. } => "input_invalid",
            Diagnosis::ReportFailed { .. } => "report_failed",
        }
    }
}
