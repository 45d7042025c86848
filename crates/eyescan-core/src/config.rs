//! Application configuration from the process environment.

use eyescan_llm::{
    GeminiSettings, RetryPolicy, DEFAULT_ENDPOINT, DEFAULT_MODEL, MAX_RETRIES_LIMIT,
};
use thiserror::Error;

use crate::profile::{ProfileResult, ScreeningProfile};

pub const API_KEY_VAR: &str = "GOOGLE_API_KEY";
pub const MODEL_VAR: &str = "EYESCAN_MODEL";
pub const ENDPOINT_VAR: &str = "EYESCAN_ENDPOINT";
pub const TIMEOUT_VAR: &str = "EYESCAN_TIMEOUT_SECS";
pub const MAX_RETRIES_VAR: &str = "EYESCAN_MAX_RETRIES";
pub const PROFILE_VAR: &str = "EYESCAN_PROFILE";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_PROFILE: &str = "final";

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "eyescan=info,eyescan_core=info,eyescan_llm=info"
}

/// Configuration errors. Raised at startup, before any request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set; the classifier cannot be reached without an API key")]
    MissingApiKey(&'static str),

    #[error("Invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

/// Settings for one screening deployment.
#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    /// Built-in profile name or path to a profile file
    pub profile: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("profile", &self.profile)
            .finish()
    }
}

impl AppConfig {
    /// Defaults for everything but the key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            profile: DEFAULT_PROFILE.to_string(),
        }
    }

    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through `lookup`. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = get(API_KEY_VAR).ok_or(ConfigError::MissingApiKey(API_KEY_VAR))?;
        let mut config = Self::new(api_key);

        if let Some(model) = get(MODEL_VAR) {
            config.model = model;
        }
        if let Some(endpoint) = get(ENDPOINT_VAR) {
            config.endpoint = endpoint.trim_end_matches('/').to_string();
        }
        if let Some(value) = get(TIMEOUT_VAR) {
            config.timeout_secs = match value.parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: TIMEOUT_VAR,
                        value,
                    })
                }
            };
        }
        if let Some(value) = get(MAX_RETRIES_VAR) {
            config.max_retries = value.parse().map_err(|_| ConfigError::Invalid {
                var: MAX_RETRIES_VAR,
                value: value.clone(),
            })?;
        }
        if let Some(profile) = get(PROFILE_VAR) {
            config.profile = profile;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the bounds that keep a single request from waiting indefinitely.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: TIMEOUT_VAR,
                value: self.timeout_secs.to_string(),
            });
        }
        if self.max_retries > MAX_RETRIES_LIMIT {
            return Err(ConfigError::Invalid {
                var: MAX_RETRIES_VAR,
                value: self.max_retries.to_string(),
            });
        }
        Ok(())
    }

    /// Client settings for the remote classifier.
    pub fn gemini_settings(&self) -> GeminiSettings {
        GeminiSettings {
            endpoint: self.endpoint.clone(),
            model: self.model.clone(),
            api_key: self.api_key.clone(),
            timeout_secs: self.timeout_secs,
            retry: RetryPolicy {
                max_retries: self.max_retries,
                ..RetryPolicy::default()
            },
        }
    }

    /// Load the configured screening profile.
    pub fn load_profile(&self) -> ProfileResult<ScreeningProfile> {
        ScreeningProfile::resolve(&self.profile)
    }
}
