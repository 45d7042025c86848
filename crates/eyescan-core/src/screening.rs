//! Top-level request handling: form → image → diagnosis → report.

use std::path::{Path, PathBuf};

use eyescan_llm::{ClassificationError, GeminiClient, ImagePayload, VisionClassifier};
use thiserror::Error;
use uuid::Uuid;

use crate::config::{AppConfig, ConfigError};
use crate::models::{self, Diagnosis, FormInput, InputError, PatientForm, UploadedImage};
use crate::profile::{ProfileError, ScreeningProfile};
use crate::report::{self, RenderError, Report};
use crate::resolver::Resolver;

/// Any failure of a screening request.
#[derive(Error, Debug)]
pub enum ScreeningError {
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("Classification error: {0}")]
    Classification(#[from] ClassificationError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Profile error: {0}")]
    Profile(#[from] ProfileError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("No report to export for a {0} outcome")]
    NothingToExport(&'static str),
}

pub type ScreeningResult<T> = Result<T, ScreeningError>;

/// Result of one screening request.
#[derive(Debug, Clone)]
pub struct ScreeningOutcome {
    /// Correlates log lines and the printed report
    pub report_id: Uuid,
    pub diagnosis: Diagnosis,
    /// On-screen report
    pub markdown: String,
    /// Present whenever the form was valid and a verdict was reached
    pub report: Option<Report>,
    image: Option<ImagePayload>,
}

impl ScreeningOutcome {
    /// The image that was analysed.
    pub fn image(&self) -> Option<&ImagePayload> {
        self.image.as_ref()
    }
}

/// A configured screening service.
pub struct Screening {
    profile: ScreeningProfile,
    classifier: Box<dyn VisionClassifier + Send + Sync>,
}

impl Screening {
    /// Create a screening service. The profile is validated here so that a
    /// bad profile fails at startup rather than on a request.
    pub fn new(
        profile: ScreeningProfile,
        classifier: Box<dyn VisionClassifier + Send + Sync>,
    ) -> ScreeningResult<Self> {
        profile.validate()?;
        Ok(Self {
            profile,
            classifier,
        })
    }

    /// Build the remote classifier and load the profile from configuration.
    pub fn from_config(config: &AppConfig) -> ScreeningResult<Self> {
        let profile = config.load_profile()?;
        let client = GeminiClient::new(config.gemini_settings())?;
        tracing::info!(
            profile = %profile.name,
            model = %config.model,
            diseases = profile.diseases.len(),
            "Screening service ready"
        );
        Self::new(profile, Box::new(client))
    }

    pub fn profile(&self) -> &ScreeningProfile {
        &self.profile
    }

    /// Validate, classify and render, returning the first error.
    pub fn analyze(
        &self,
        input: FormInput,
        upload: Option<&UploadedImage>,
    ) -> ScreeningResult<ScreeningOutcome> {
        // Input errors must be raised before the classifier is reachable
        let form = PatientForm::submit(input, &self.profile.form)?;
        let image = models::pack(upload)?;

        let resolver = Resolver::new(&self.profile, self.classifier.as_ref());
        let diagnosis = resolver.try_resolve(&form, &image)?;
        let markdown = report::render_markdown(&self.profile.diseases, &diagnosis)?;

        let report = Report::new(
            &self.profile.name,
            form,
            diagnosis.clone(),
            Some(image.sha256().to_string()),
        );
        tracing::info!(
            report_id = %report.id,
            profile = %self.profile.name,
            status = diagnosis.status(),
            disease = diagnosis.disease().unwrap_or("-"),
            image_sha256 = image.sha256(),
            "Screening complete"
        );

        Ok(ScreeningOutcome {
            report_id: report.id,
            diagnosis,
            markdown,
            report: Some(report),
            image: Some(image),
        })
    }

    /// Handle one request. Never fails: every error becomes a terminal
    /// [`Diagnosis`] with its own message.
    pub fn run(&self, input: FormInput, upload: Option<&UploadedImage>) -> ScreeningOutcome {
        match self.analyze(input, upload) {
            Ok(outcome) => outcome,
            Err(e) => {
                let report_id = Uuid::new_v4();
                let diagnosis = match &e {
                    ScreeningError::Input(err) => {
                        tracing::warn!(%report_id, error = %err, "Submission rejected");
                        Diagnosis::InputInvalid {
                            reason: err.to_string(),
                        }
                    }
                    ScreeningError::Classification(err) => {
                        tracing::error!(%report_id, error = %err, "Classification failed");
                        Diagnosis::ClassificationFailed {
                            reason: err.to_string(),
                        }
                    }
                    other => {
                        tracing::error!(%report_id, error = %other, "Report failed");
                        Diagnosis::ReportFailed {
                            reason: other.to_string(),
                        }
                    }
                };
                let markdown = report::render_markdown(&self.profile.diseases, &diagnosis)
                    .unwrap_or_else(|_| e.to_string());
                ScreeningOutcome {
                    report_id,
                    diagnosis,
                    markdown,
                    report: None,
                    image: None,
                }
            }
        }
    }

    /// Render the printable report for an outcome.
    pub fn render_pdf(&self, outcome: &ScreeningOutcome) -> ScreeningResult<Vec<u8>> {
        let report = outcome
            .report
            .as_ref()
            .ok_or(ScreeningError::NothingToExport(outcome.diagnosis.status()))?;
        Ok(report::render_pdf(
            report,
            &self.profile.diseases,
            outcome.image(),
        )?)
    }

    /// Render the printable report and save it as `Eye_Disease_Report.pdf`
    /// in `dir`.
    pub fn export_pdf(&self, outcome: &ScreeningOutcome, dir: &Path) -> ScreeningResult<PathBuf> {
        let bytes = self.render_pdf(outcome)?;
        Ok(report::write_report(dir, &bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RiskFactor, Symptom};
    use eyescan_llm::MockClassifier;
    use std::sync::Arc;

    const PNG_HEADER: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    fn input() -> FormInput {
        FormInput {
            name: "Meera".into(),
            age: 61,
            gender: "Female".into(),
            location: "Chennai".into(),
            symptoms: vec![Symptom::BlurryVision],
            ..Default::default()
        }
    }

    fn screening(mock: &Arc<MockClassifier>) -> Screening {
        let profile = ScreeningProfile::builtin("final").unwrap();
        Screening::new(profile, Box::new(mock.clone())).unwrap()
    }

    #[test]
    fn test_run_diagnoses() {
        let mock = Arc::new(MockClassifier::replying("Signs of glaucoma."));
        let screening = screening(&mock);
        let upload = UploadedImage::new(PNG_HEADER.to_vec(), "image/png");

        let outcome = screening.run(input(), Some(&upload));

        assert_eq!(outcome.diagnosis.disease(), Some("glaucoma"));
        assert!(outcome.markdown.starts_with("### Detected Disease: Glaucoma"));
        let report = outcome.report.as_ref().unwrap();
        assert_eq!(report.id, outcome.report_id);
        assert_eq!(report.image_sha256.as_deref(), Some(outcome.image().unwrap().sha256()));
        assert_eq!(mock.calls(), 1);
    }

    #[test]
    fn test_missing_image_never_calls_classifier() {
        let mock = Arc::new(MockClassifier::replying("cataract"));
        let screening = screening(&mock);

        let outcome = screening.run(input(), None);

        assert!(matches!(outcome.diagnosis, Diagnosis::InputInvalid { .. }));
        assert!(outcome.markdown.contains("No image uploaded"));
        assert!(outcome.report.is_none());
        assert_eq!(mock.calls(), 0);
    }

    #[test]
    fn test_classifier_failure_surfaces() {
        let mock = Arc::new(MockClassifier::failing(ClassificationError::Transport(
            "connection refused".into(),
        )));
        let screening = screening(&mock);
        let upload = UploadedImage::new(PNG_HEADER.to_vec(), "image/png");

        let outcome = screening.run(input(), Some(&upload));

        assert!(matches!(outcome.diagnosis, Diagnosis::ClassificationFailed { .. }));
        assert!(outcome.markdown.contains("connection refused"));
        assert!(matches!(
            screening.analyze(input(), Some(&upload)),
            Err(ScreeningError::Classification(_))
        ));
    }

    #[test]
    fn test_export_requires_report() {
        let mock = Arc::new(MockClassifier::replying("cataract"));
        let screening = screening(&mock);
        let outcome = screening.run(FormInput::default(), None);
        let dir = tempfile::tempdir().unwrap();

        assert!(matches!(
            screening.export_pdf(&outcome, dir.path()),
            Err(ScreeningError::NothingToExport("input_invalid"))
        ));
    }

    #[test]
    fn test_override_outcome_has_report() {
        let mock = Arc::new(MockClassifier::replying("cataract"));
        let screening = screening(&mock);
        let mut form = input();
        form.risk_factors = vec![RiskFactor::NoneOfTheAbove];
        let upload = UploadedImage::new(PNG_HEADER.to_vec(), "image/png");

        let outcome = screening.run(form, Some(&upload));

        assert!(matches!(outcome.diagnosis, Diagnosis::Healthy { .. }));
        assert_eq!(outcome.markdown, report::HEALTHY_MESSAGE);
        assert!(outcome.report.is_some());
        assert_eq!(mock.calls(), 0);
    }

    #[test]
    fn test_rejects_invalid_profile() {
        let mut profile = ScreeningProfile::builtin("final").unwrap();
        profile.unsupported_phrases.push("  ".into());
        let result = Screening::new(profile, Box::new(MockClassifier::replying("x")));
        assert!(matches!(result, Err(ScreeningError::Profile(_))));
    }
}
