//! Eyescan Core Library
//!
//! Eye photo screening: a questionnaire and an uploaded image go in, a
//! diagnosis and a printable report come out.
//!
//! # Architecture
//!
//! ```text
//! FormInput ──► PatientForm::submit ──┐
//!                                     ├──► Resolver ──► Diagnosis ──► Report
//! UploadedImage ──► pack ─────────────┘       │                         │
//!                                              │                 ┌──────┴──────┐
//!                         override fired? ─────┤                 ▼             ▼
//!                           yes: no call       │             Markdown    PDF artifact
//!                           no:  one call ─────▼
//!                                   VisionClassifier (remote model)
//! ```
//!
//! # Core Principle
//!
//! **A failure is never a verdict.** Classification errors, rejected input
//! and render failures each have their own [`Diagnosis`] variant and message;
//! none of them reads as a healthy eye.
//!
//! # Modules
//!
//! - [`models`]: Domain types (PatientForm, DiseaseEntry, Diagnosis, etc.)
//! - [`profile`]: Catalog, override table and form rules as JSON data
//! - [`resolver`]: Overrides first, then ordered matching of the model reply
//! - [`report`]: Markdown, PDF and the saved report file
//! - [`screening`]: Top-level request handler
//! - [`config`]: Environment configuration

pub mod config;
pub mod models;
pub mod profile;
pub mod report;
pub mod resolver;
pub mod screening;

// Re-export commonly used types
pub use config::{AppConfig, ConfigError};
pub use models::{
    Catalog, Diagnosis, DiagnosisSource, DiseaseEntry, FormInput, Gender, InputError,
    MedicalHistory, PatientForm, RiskFactor, Symptom, UploadedImage,
};
pub use profile::{ScreeningProfile, BUILTIN_PROFILES};
pub use report::{RenderError, Report, REPORT_FILE_NAME};
pub use resolver::{ResponseMatcher, Resolver};
pub use screening::{Screening, ScreeningError, ScreeningOutcome};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum EyeScreenError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Profile error: {0}")]
    ProfileError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Classification failed: {0}")]
    ClassificationFailed(String),

    #[error("Render error: {0}")]
    RenderError(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<ConfigError> for EyeScreenError {
    fn from(e: ConfigError) -> Self {
        EyeScreenError::ConfigError(e.to_string())
    }
}

impl From<profile::ProfileError> for EyeScreenError {
    fn from(e: profile::ProfileError) -> Self {
        EyeScreenError::ProfileError(e.to_string())
    }
}

impl From<ScreeningError> for EyeScreenError {
    fn from(e: ScreeningError) -> Self {
        match e {
            ScreeningError::Input(err) => EyeScreenError::InvalidInput(err.to_string()),
            ScreeningError::Classification(err) => {
                EyeScreenError::ClassificationFailed(err.to_string())
            }
            ScreeningError::Render(err) => EyeScreenError::RenderError(err.to_string()),
            ScreeningError::Profile(err) => EyeScreenError::ProfileError(err.to_string()),
            ScreeningError::Config(err) => EyeScreenError::ConfigError(err.to_string()),
            ScreeningError::NothingToExport(status) => {
                EyeScreenError::NotFound(format!("no report for a {} outcome", status))
            }
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for EyeScreenError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        EyeScreenError::RenderError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open a screening service configured from the process environment.
#[uniffi::export]
pub fn open_screening_from_env() -> Result<Arc<EyeScreen>, EyeScreenError> {
    let config = AppConfig::from_env()?;
    open_screening_with(&config)
}

/// Open a screening service from explicit settings.
#[uniffi::export]
pub fn open_screening(config: FfiConfig) -> Result<Arc<EyeScreen>, EyeScreenError> {
    let config = config.into_config()?;
    open_screening_with(&config)
}

fn open_screening_with(config: &AppConfig) -> Result<Arc<EyeScreen>, EyeScreenError> {
    let screening = Screening::from_config(config)?;
    Ok(Arc::new(EyeScreen::new(screening)))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe screening service for FFI.
///
/// The most recent outcome is kept so the front-end can ask for its PDF.
#[derive(uniffi::Object)]
pub struct EyeScreen {
    screening: Screening,
    last_outcome: Arc<Mutex<Option<ScreeningOutcome>>>,
}

impl EyeScreen {
    /// Wrap an already configured service.
    pub fn new(screening: Screening) -> Self {
        Self {
            screening,
            last_outcome: Arc::new(Mutex::new(None)),
        }
    }
}

#[uniffi::export]
impl EyeScreen {
    /// Run one screening request. Rejected input and classifier failures
    /// come back as outcome statuses, not errors.
    pub fn analyze(
        &self,
        form: FfiForm,
        image_bytes: Option<Vec<u8>>,
        media_type: Option<String>,
    ) -> Result<FfiOutcome, EyeScreenError> {
        let input = form.into_input()?;
        let upload = image_bytes
            .map(|bytes| UploadedImage::new(bytes, media_type.unwrap_or_default()));

        let outcome = self.screening.run(input, upload.as_ref());
        let ffi = FfiOutcome::from(&outcome);
        *self.last_outcome.lock()? = Some(outcome);
        Ok(ffi)
    }

    /// PDF bytes for the outcome with `report_id`.
    pub fn export_pdf(&self, report_id: String) -> Result<Vec<u8>, EyeScreenError> {
        let guard = self.last_outcome.lock()?;
        let outcome = guard
            .as_ref()
            .filter(|o| o.report_id.to_string() == report_id)
            .ok_or_else(|| EyeScreenError::NotFound(report_id.clone()))?;
        Ok(self.screening.render_pdf(outcome)?)
    }

    /// Look up a disease by catalog key.
    pub fn lookup_disease(&self, key: String) -> Option<FfiDisease> {
        self.screening
            .profile()
            .diseases
            .lookup(&key)
            .map(FfiDisease::from)
    }

    /// All diseases in match-priority order.
    pub fn diseases(&self) -> Vec<FfiDisease> {
        self.screening
            .profile()
            .diseases
            .entries()
            .iter()
            .map(FfiDisease::from)
            .collect()
    }

    pub fn profile_name(&self) -> String {
        self.screening.profile().name.clone()
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe configuration. Unset fields take their defaults.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiConfig {
    pub api_key: String,
    pub model: Option<String>,
    pub endpoint: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
    pub profile: Option<String>,
}

impl FfiConfig {
    fn into_config(self) -> Result<AppConfig, ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey(config::API_KEY_VAR));
        }
        let mut config = AppConfig::new(self.api_key);
        if let Some(model) = self.model {
            config.model = model;
        }
        if let Some(endpoint) = self.endpoint {
            config.endpoint = endpoint;
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout_secs = secs;
        }
        if let Some(retries) = self.max_retries {
            config.max_retries = retries;
        }
        if let Some(profile) = self.profile {
            config.profile = profile;
        }
        config.validate()?;
        Ok(config)
    }
}

/// FFI-safe questionnaire. Symptoms and factors are machine keys
/// ("blurry_vision", "sugar", "none", ...).
#[derive(Debug, Clone, Default, uniffi::Record)]
pub struct FfiForm {
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub location: String,
    pub symptoms: Vec<String>,
    pub other_symptoms: String,
    pub risk_factors: Vec<String>,
    pub medications: Option<String>,
    pub previous_eye_condition: Option<String>,
    pub family_eye_history: Option<String>,
    pub other_illness: Option<String>,
    pub wears_corrective_lenses: Option<bool>,
    pub previous_eye_surgery: Option<bool>,
    pub frequent_eye_strain: Option<bool>,
    pub uses_screens: Option<bool>,
    pub screen_hours_per_day: Option<u32>,
    pub smokes_or_drinks: Option<bool>,
    pub work_exposure: Option<bool>,
}

impl FfiForm {
    fn into_input(self) -> Result<FormInput, EyeScreenError> {
        let symptoms = self
            .symptoms
            .iter()
            .map(|key| {
                Symptom::from_key(key)
                    .ok_or_else(|| EyeScreenError::InvalidInput(format!("unknown symptom: {}", key)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let risk_factors = self
            .risk_factors
            .iter()
            .map(|key| {
                RiskFactor::from_key(key)
                    .ok_or_else(|| EyeScreenError::InvalidInput(format!("unknown factor: {}", key)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(FormInput {
            name: self.name,
            age: self.age,
            gender: self.gender,
            location: self.location,
            symptoms,
            other_symptoms: self.other_symptoms,
            risk_factors,
            history: MedicalHistory {
                medications: self.medications,
                previous_eye_condition: self.previous_eye_condition,
                family_eye_history: self.family_eye_history,
                other_illness: self.other_illness,
                wears_corrective_lenses: self.wears_corrective_lenses,
                previous_eye_surgery: self.previous_eye_surgery,
                frequent_eye_strain: self.frequent_eye_strain,
                uses_screens: self.uses_screens,
                screen_hours_per_day: self.screen_hours_per_day,
                smokes_or_drinks: self.smokes_or_drinks,
                work_exposure: self.work_exposure,
            },
        })
    }
}

/// FFI-safe screening outcome.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiOutcome {
    pub report_id: String,
    /// "diagnosed", "healthy", "unsupported", "classification_failed", ...
    pub status: String,
    pub disease: Option<String>,
    /// Override factor key, or "classifier"
    pub decided_by: Option<String>,
    pub markdown: String,
    /// Whether `export_pdf` can produce a document
    pub exportable: bool,
}

impl From<&ScreeningOutcome> for FfiOutcome {
    fn from(outcome: &ScreeningOutcome) -> Self {
        let decided_by = outcome.diagnosis.source().map(|source| match source {
            DiagnosisSource::Override(factor) => factor.key().to_string(),
            DiagnosisSource::Classifier => "classifier".to_string(),
        });
        Self {
            report_id: outcome.report_id.to_string(),
            status: outcome.diagnosis.status().to_string(),
            disease: outcome.diagnosis.disease().map(str::to_string),
            decided_by,
            markdown: outcome.markdown.clone(),
            exportable: outcome.report.is_some(),
        }
    }
}

/// FFI-safe catalog entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDisease {
    pub key: String,
    pub display_name: String,
    pub symptoms: Vec<String>,
    pub precautions: Vec<String>,
}

impl From<&DiseaseEntry> for FfiDisease {
    fn from(entry: &DiseaseEntry) -> Self {
        Self {
            key: entry.key.clone(),
            display_name: entry.display_name(),
            symptoms: entry.symptoms.clone(),
            precautions: entry.precautions.clone(),
        }
    }
}
