//! Patient questionnaire models.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::InputError;

/// Patient gender as offered by the form.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    /// Parse a form value, ignoring case and surrounding whitespace.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            "other" => Some(Gender::Other),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

/// Current eye symptoms offered as checkboxes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Symptom {
    BlurryVision,
    Redness,
    DoubleVision,
    EyePain,
    LightSensitivity,
    Itching,
    Swelling,
    Discharge,
    NightVisionTrouble,
}

impl Symptom {
    pub const ALL: [Symptom; 9] = [
        Symptom::BlurryVision,
        Symptom::Redness,
        Symptom::DoubleVision,
        Symptom::EyePain,
        Symptom::LightSensitivity,
        Symptom::Itching,
        Symptom::Swelling,
        Symptom::Discharge,
        Symptom::NightVisionTrouble,
    ];

    /// Stable machine key ("blurry_vision").
    pub fn key(&self) -> &'static str {
        match self {
            Symptom::BlurryVision => "blurry_vision",
            Symptom::Redness => "redness",
            Symptom::DoubleVision => "double_vision",
            Symptom::EyePain => "eye_pain",
            Symptom::LightSensitivity => "light_sensitivity",
            Symptom::Itching => "itching",
            Symptom::Swelling => "swelling",
            Symptom::Discharge => "discharge",
            Symptom::NightVisionTrouble => "night_vision_trouble",
        }
    }

    /// Human label as shown on the form and in reports.
    pub fn label(&self) -> &'static str {
        match self {
            Symptom::BlurryVision => "Blurry vision",
            Symptom::Redness => "Redness",
            Symptom::DoubleVision => "Double vision",
            Symptom::EyePain => "Eye pain",
            Symptom::LightSensitivity => "Light sensitivity",
            Symptom::Itching => "Itching",
            Symptom::Swelling => "Swelling",
            Symptom::Discharge => "Discharge",
            Symptom::NightVisionTrouble => "Trouble seeing at night",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim().to_lowercase().replace(['-', ' '], "_");
        Self::ALL.into_iter().find(|s| s.key() == key)
    }
}

/// Risk factors and health conditions offered as checkboxes.
///
/// Only factors listed in a profile's override table influence the diagnosis.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactor {
    #[serde(alias = "sugar")]
    Diabetes,
    ThirdEye,
    #[serde(rename = "none")]
    NoneOfTheAbove,
    HighBloodPressure,
    ThyroidDisorder,
    ChronicIllness,
    AutoimmuneDisorder,
    Migraines,
}

impl RiskFactor {
    pub const ALL: [RiskFactor; 8] = [
        RiskFactor::Diabetes,
        RiskFactor::ThirdEye,
        RiskFactor::NoneOfTheAbove,
        RiskFactor::HighBloodPressure,
        RiskFactor::ThyroidDisorder,
        RiskFactor::ChronicIllness,
        RiskFactor::AutoimmuneDisorder,
        RiskFactor::Migraines,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            RiskFactor::Diabetes => "diabetes",
            RiskFactor::ThirdEye => "third_eye",
            RiskFactor::NoneOfTheAbove => "none",
            RiskFactor::HighBloodPressure => "high_blood_pressure",
            RiskFactor::ThyroidDisorder => "thyroid_disorder",
            RiskFactor::ChronicIllness => "chronic_illness",
            RiskFactor::AutoimmuneDisorder => "autoimmune_disorder",
            RiskFactor::Migraines => "migraines",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskFactor::Diabetes => "Sugar (Diabetes)",
            RiskFactor::ThirdEye => "Third eye",
            RiskFactor::NoneOfTheAbove => "None",
            RiskFactor::HighBloodPressure => "High blood pressure",
            RiskFactor::ThyroidDisorder => "Thyroid disorder",
            RiskFactor::ChronicIllness => "Chronic illness",
            RiskFactor::AutoimmuneDisorder => "Autoimmune disorder",
            RiskFactor::Migraines => "Frequent migraines",
        }
    }

    /// Parse a machine key; "sugar" is accepted for diabetes.
    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim().to_lowercase().replace(['-', ' '], "_");
        if key == "sugar" {
            return Some(RiskFactor::Diabetes);
        }
        Self::ALL.into_iter().find(|f| f.key() == key)
    }
}

/// Optional health history from the extended questionnaire.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MedicalHistory {
    /// Regular medications
    pub medications: Option<String>,
    /// Previously diagnosed eye condition
    pub previous_eye_condition: Option<String>,
    /// Eye diseases in the family (e.g., "glaucoma")
    pub family_eye_history: Option<String>,
    /// Other illness not covered by the checkboxes
    pub other_illness: Option<String>,
    pub wears_corrective_lenses: Option<bool>,
    pub previous_eye_surgery: Option<bool>,
    pub frequent_eye_strain: Option<bool>,
    /// Frequent use of computer or phone screens
    pub uses_screens: Option<bool>,
    pub screen_hours_per_day: Option<u32>,
    pub smokes_or_drinks: Option<bool>,
    /// Work exposure to dust, chemicals or bright light
    pub work_exposure: Option<bool>,
}

impl MedicalHistory {
    /// Answered questions as (label, value) pairs, in questionnaire order.
    pub fn lines(&self) -> Vec<(&'static str, String)> {
        fn yes_no(value: bool) -> String {
            let answer = if value { "Yes" } else { "No" };
            answer.to_string()
        }

        let mut lines = Vec::new();
        if let Some(v) = non_empty(self.medications.as_deref()) {
            lines.push(("Medications", v));
        }
        if let Some(v) = non_empty(self.previous_eye_condition.as_deref()) {
            lines.push(("Previous eye condition", v));
        }
        if let Some(v) = non_empty(self.family_eye_history.as_deref()) {
            lines.push(("Family eye history", v));
        }
        if let Some(v) = non_empty(self.other_illness.as_deref()) {
            lines.push(("Other illness", v));
        }
        if let Some(v) = self.wears_corrective_lenses {
            lines.push(("Wears glasses or contacts", yes_no(v)));
        }
        if let Some(v) = self.previous_eye_surgery {
            lines.push(("Previous eye surgery", yes_no(v)));
        }
        if let Some(v) = self.frequent_eye_strain {
            lines.push(("Frequent eye strain", yes_no(v)));
        }
        if let Some(v) = self.uses_screens {
            lines.push(("Frequent screen use", yes_no(v)));
        }
        if let Some(v) = self.screen_hours_per_day {
            lines.push(("Screen hours per day", v.to_string()));
        }
        if let Some(v) = self.smokes_or_drinks {
            lines.push(("Smokes or drinks", yes_no(v)));
        }
        if let Some(v) = self.work_exposure {
            lines.push(("Dust, chemical or bright light exposure at work", yes_no(v)));
        }
        lines
    }
}

/// Form rules that differ between deployments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FormRules {
    /// Largest accepted age
    #[serde(default = "default_max_age")]
    pub max_age: u32,
    /// Reject submissions with no symptom, free-text symptom or factor
    #[serde(default)]
    pub require_symptom_or_factor: bool,
}

fn default_max_age() -> u32 {
    120
}

impl Default for FormRules {
    fn default() -> Self {
        Self {
            max_age: default_max_age(),
            require_symptom_or_factor: false,
        }
    }
}

/// Raw, unvalidated form submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FormInput {
    pub name: String,
    /// 0 means "not filled in"
    pub age: u32,
    pub gender: String,
    pub location: String,
    pub symptoms: Vec<Symptom>,
    pub other_symptoms: String,
    pub risk_factors: Vec<RiskFactor>,
    pub history: MedicalHistory,
}

/// A validated form submission. Only obtainable through [`PatientForm::submit`].
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PatientForm {
    name: String,
    age: u32,
    gender: Gender,
    location: String,
    symptoms: BTreeSet<Symptom>,
    other_symptoms: Option<String>,
    risk_factors: BTreeSet<RiskFactor>,
    history: MedicalHistory,
}

impl PatientForm {
    /// Validate a submission.
    ///
    /// Required: name, age (non-zero, at most `rules.max_age`), gender and
    /// location. Checkboxes and free text are unchecked unless
    /// `rules.require_symptom_or_factor` is set.
    pub fn submit(input: FormInput, rules: &FormRules) -> Result<Self, InputError> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(InputError::MissingField("name"));
        }
        if input.age == 0 {
            return Err(InputError::MissingField("age"));
        }
        let gender_text = input.gender.trim();
        if gender_text.is_empty() {
            return Err(InputError::MissingField("gender"));
        }
        let location = input.location.trim();
        if location.is_empty() {
            return Err(InputError::MissingField("location"));
        }

        let gender = Gender::parse(gender_text)
            .ok_or_else(|| InputError::InvalidGender(gender_text.to_string()))?;
        if input.age > rules.max_age {
            return Err(InputError::AgeOutOfRange {
                age: input.age,
                max: rules.max_age,
            });
        }

        let other_symptoms = non_empty(Some(input.other_symptoms.as_str()));
        if rules.require_symptom_or_factor
            && input.symptoms.is_empty()
            && input.risk_factors.is_empty()
            && other_symptoms.is_none()
        {
            return Err(InputError::NoSymptomOrFactor);
        }

        Ok(Self {
            name: name.to_string(),
            age: input.age,
            gender,
            location: location.to_string(),
            symptoms: input.symptoms.into_iter().collect(),
            other_symptoms,
            risk_factors: input.risk_factors.into_iter().collect(),
            history: input.history,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn symptoms(&self) -> &BTreeSet<Symptom> {
        &self.symptoms
    }

    pub fn other_symptoms(&self) -> Option<&str> {
        self.other_symptoms.as_deref()
    }

    pub fn risk_factors(&self) -> &BTreeSet<RiskFactor> {
        &self.risk_factors
    }

    pub fn has_factor(&self, factor: RiskFactor) -> bool {
        self.risk_factors.contains(&factor)
    }

    pub fn history(&self) -> &MedicalHistory {
        &self.history
    }

    /// Symptoms as a comma-separated list, free text last, or "None".
    pub fn symptom_summary(&self) -> String {
        let mut parts: Vec<&str> = self.symptoms.iter().map(|s| s.label()).collect();
        if let Some(other) = self.other_symptoms() {
            parts.push(other);
        }
        if parts.is_empty() {
            "None".to_string()
        } else {
            parts.join(", ")
        }
    }

    /// Risk factors as a comma-separated list, or "None".
    pub fn factor_summary(&self) -> String {
        let parts: Vec<&str> = self
            .risk_factors
            .iter()
            .filter(|f| **f != RiskFactor::NoneOfTheAbove)
            .map(|f| f.label())
            .collect();
        if parts.is_empty() {
            "None".to_string()
        } else {
            parts.join(", ")
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
