//! Screening profiles: catalog, override table and form rules as data.
//!
//! Deployments disagree on which diseases exist, which form flags force a
//! diagnosis and which fields are required, so none of that is compiled in.
//! Three built-in profiles ship as JSON files; any other profile can be
//! loaded from disk.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Catalog, FormRules, RiskFactor};

/// Names of the profiles bundled with the crate.
pub const BUILTIN_PROFILES: &[&str] = &["final", "app", "demo"];

const FINAL_PROFILE: &str = include_str!("../profiles/final.json");
const APP_PROFILE: &str = include_str!("../profiles/app.json");
const DEMO_PROFILE: &str = include_str!("../profiles/demo.json");

/// Profile errors.
#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to read profile {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Unknown built-in profile: {0}")]
    UnknownBuiltin(String),

    #[error("Invalid profile: {0}")]
    Invalid(String),
}

pub type ProfileResult<T> = Result<T, ProfileError>;

/// What an override forces.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OverrideOutcome {
    /// Report this catalog disease
    Disease(String),
    /// Report a healthy eye
    Healthy,
}

/// One row of the override table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OverrideRule {
    pub factor: RiskFactor,
    pub outcome: OverrideOutcome,
}

/// Verdict when the reply names no disease and no unsupported phrase.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NoMatchOutcome {
    #[default]
    Healthy,
    Unsupported,
}

/// A complete screening configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScreeningProfile {
    pub name: String,
    /// Diseases in match-priority order
    pub diseases: Catalog,
    /// Overrides in priority order; the first set flag wins
    #[serde(default)]
    pub overrides: Vec<OverrideRule>,
    /// Reply phrases meaning "not an eye image / unsupported condition"
    #[serde(default = "default_unsupported_phrases")]
    pub unsupported_phrases: Vec<String>,
    #[serde(default)]
    pub no_match: NoMatchOutcome,
    #[serde(default)]
    pub form: FormRules,
}

fn default_unsupported_phrases() -> Vec<String> {
    vec!["unsupported".to_string(), "not an eye image".to_string()]
}

impl ScreeningProfile {
    /// Parse and validate a profile from JSON.
    pub fn from_json(json: &str) -> ProfileResult<Self> {
        let profile: ScreeningProfile = serde_json::from_str(json)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Load and validate a profile file.
    pub fn load<P: AsRef<Path>>(path: P) -> ProfileResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ProfileError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// One of the bundled profiles.
    pub fn builtin(name: &str) -> ProfileResult<Self> {
        let json = match name {
            "final" => FINAL_PROFILE,
            "app" => APP_PROFILE,
            "demo" => DEMO_PROFILE,
            other => return Err(ProfileError::UnknownBuiltin(other.to_string())),
        };
        Self::from_json(json)
    }

    /// A built-in profile name, or else a path to a profile file.
    pub fn resolve(name_or_path: &str) -> ProfileResult<Self> {
        if BUILTIN_PROFILES.contains(&name_or_path) {
            Self::builtin(name_or_path)
        } else {
            Self::load(name_or_path)
        }
    }

    /// Check internal consistency.
    pub fn validate(&self) -> ProfileResult<()> {
        if self.diseases.is_empty() {
            return Err(ProfileError::Invalid("catalog has no diseases".into()));
        }

        let mut keys = HashSet::new();
        for entry in self.diseases.entries() {
            if entry.key.is_empty() {
                return Err(ProfileError::Invalid("empty disease key".into()));
            }
            if entry.key != entry.key.trim().to_lowercase() {
                return Err(ProfileError::Invalid(format!(
                    "disease key must be trimmed lower-case: {:?}",
                    entry.key
                )));
            }
            if !keys.insert(entry.key.as_str()) {
                return Err(ProfileError::Invalid(format!(
                    "duplicate disease key: {}",
                    entry.key
                )));
            }
            if entry.symptoms.is_empty() || entry.precautions.is_empty() {
                return Err(ProfileError::Invalid(format!(
                    "{} needs at least one symptom and one precaution",
                    entry.key
                )));
            }
            if entry.aliases.iter().any(|a| a.trim().is_empty()) {
                return Err(ProfileError::Invalid(format!("{} has an empty alias", entry.key)));
            }
        }

        let mut factors = HashSet::new();
        for rule in &self.overrides {
            if !factors.insert(rule.factor) {
                return Err(ProfileError::Invalid(format!(
                    "factor {} appears twice in the override table",
                    rule.factor.key()
                )));
            }
            if let OverrideOutcome::Disease(key) = &rule.outcome {
                if !self.diseases.contains(key) {
                    return Err(ProfileError::Invalid(format!(
                        "override for {} names unknown disease {}",
                        rule.factor.key(),
                        key
                    )));
                }
            }
        }

        if self.unsupported_phrases.iter().any(|p| p.trim().is_empty()) {
            return Err(ProfileError::Invalid("empty unsupported phrase".into()));
        }

        Ok(())
    }

    /// Instruction prompt listing this profile's diseases.
    pub fn instruction(&self) -> String {
        let names: Vec<&str> = self.diseases.keys().collect();
        let hints: Vec<&str> = self
            .diseases
            .entries()
            .iter()
            .filter_map(|e| e.prompt_hint.as_deref())
            .collect();
        eyescan_llm::build_instruction(&names, &hints)
    }
}
