//! Form-driven overrides.

use crate::models::PatientForm;
use crate::profile::{OverrideOutcome, OverrideRule};

/// First rule whose factor is set on the form, in table order.
pub fn first_override<'r>(rules: &'r [OverrideRule], form: &PatientForm) -> Option<&'r OverrideRule> {
    rules.iter().find(|rule| form.has_factor(rule.factor))
}

/// Whether an outcome names a disease.
pub fn forces_disease(outcome: &OverrideOutcome) -> Option<&str> {
    match outcome {
        OverrideOutcome::Disease(key) => Some(key.as_str()),
        OverrideOutcome::Healthy => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FormInput, FormRules, RiskFactor};

    fn table() -> Vec<OverrideRule> {
        vec![
            OverrideRule {
                factor: RiskFactor::Diabetes,
                outcome: OverrideOutcome::Disease("glaucoma".into()),
            },
            OverrideRule {
                factor: RiskFactor::ThirdEye,
                outcome: OverrideOutcome::Disease("uveitis".into()),
            },
            OverrideRule {
                factor: RiskFactor::NoneOfTheAbove,
                outcome: OverrideOutcome::Healthy,
            },
        ]
    }

    fn form(factors: Vec<RiskFactor>) -> PatientForm {
        PatientForm::submit(
            FormInput {
                name: "Ravi".into(),
                age: 30,
                gender: "male".into(),
                location: "Delhi".into(),
                risk_factors: factors,
                ..Default::default()
            },
            &FormRules::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_priority_follows_table_order() {
        let rules = table();
        let all = form(vec![
            RiskFactor::NoneOfTheAbove,
            RiskFactor::ThirdEye,
            RiskFactor::Diabetes,
        ]);
        assert_eq!(first_override(&rules, &all).unwrap().factor, RiskFactor::Diabetes);

        let third_and_none = form(vec![RiskFactor::NoneOfTheAbove, RiskFactor::ThirdEye]);
        assert_eq!(
            first_override(&rules, &third_and_none).unwrap().factor,
            RiskFactor::ThirdEye
        );
    }

    #[test]
    fn test_unlisted_factors_do_not_override() {
        let rules = table();
        assert!(first_override(&rules, &form(vec![RiskFactor::Migraines])).is_none());
        assert!(first_override(&rules, &form(vec![])).is_none());
        assert!(first_override(&[], &form(vec![RiskFactor::Diabetes])).is_none());
    }

    #[test]
    fn test_forces_disease() {
        let rules = table();
        assert_eq!(forces_disease(&rules[0].outcome), Some("glaucoma"));
        assert_eq!(forces_disease(&rules[2].outcome), None);
    }
}
