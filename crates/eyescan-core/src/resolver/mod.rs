//! Override/match resolver.
//!
//! Pipeline: Overrides → Classifier (at most once) → Ordered matching

mod matcher;
mod overrides;

pub use matcher::*;
pub use overrides::*;

use eyescan_llm::{normalize_response, ClassificationError, ImagePayload, VisionClassifier};

use crate::models::{Diagnosis, DiagnosisSource, PatientForm};
use crate::profile::{NoMatchOutcome, OverrideOutcome, ScreeningProfile};

/// Decides the diagnosis for one submitted form and image.
pub struct Resolver<'a> {
    profile: &'a ScreeningProfile,
    classifier: &'a dyn VisionClassifier,
    matcher: ResponseMatcher,
    instruction: String,
}

impl<'a> Resolver<'a> {
    /// Create a resolver over a validated profile.
    pub fn new(profile: &'a ScreeningProfile, classifier: &'a dyn VisionClassifier) -> Self {
        Self {
            profile,
            classifier,
            matcher: ResponseMatcher::from_profile(profile),
            instruction: profile.instruction(),
        }
    }

    /// Resolve a diagnosis. Classifier failures come back as errors and are
    /// never read as a verdict.
    pub fn try_resolve(
        &self,
        form: &PatientForm,
        image: &ImagePayload,
    ) -> Result<Diagnosis, ClassificationError> {
        // Step 1: Overrides suppress the remote call entirely
        if let Some(rule) = first_override(&self.profile.overrides, form) {
            let source = DiagnosisSource::Override(rule.factor);
            tracing::info!(
                profile = %self.profile.name,
                factor = rule.factor.key(),
                "Override fired, classifier skipped"
            );
            return Ok(match &rule.outcome {
                OverrideOutcome::Disease(key) => Diagnosis::Diagnosed {
                    disease: key.clone(),
                    source,
                },
                OverrideOutcome::Healthy => Diagnosis::Healthy { source },
            });
        }

        // Step 2: One classifier call
        tracing::debug!(image_sha256 = image.sha256(), "Calling classifier");
        let reply = self.classifier.classify(&self.instruction, image)?;

        // Step 3: Ordered matching
        Ok(self.interpret(&reply))
    }

    /// Turn a classifier reply into a diagnosis without calling anything.
    pub fn interpret(&self, reply: &str) -> Diagnosis {
        let text = normalize_response(reply);
        match self.matcher.evaluate(&text) {
            TextVerdict::Disease(key) => {
                tracing::info!(profile = %self.profile.name, matched = %key, "Reply matched catalog");
                Diagnosis::Diagnosed {
                    disease: key,
                    source: DiagnosisSource::Classifier,
                }
            }
            TextVerdict::Unsupported => {
                tracing::info!(profile = %self.profile.name, "Reply flagged image as unsupported");
                Diagnosis::Unsupported
            }
            TextVerdict::NoMatch => match self.profile.no_match {
                NoMatchOutcome::Healthy => Diagnosis::Healthy {
                    source: DiagnosisSource::Classifier,
                },
                NoMatchOutcome::Unsupported => Diagnosis::Unsupported,
            },
        }
    }

    /// The ordered matching policy in use.
    pub fn matcher(&self) -> &ResponseMatcher {
        &self.matcher
    }

    /// The instruction sent with every classifier call.
    pub fn instruction(&self) -> &str {
        &self.instruction
    }
}
