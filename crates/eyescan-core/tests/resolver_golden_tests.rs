//! Golden tests for the override/match resolver.
//!
//! Each case runs the full request handler against a mock classifier and
//! checks the terminal diagnosis and how many remote calls were made.

use std::sync::Arc;

use eyescan_core::models::{FormInput, RiskFactor, Symptom, UploadedImage};
use eyescan_core::{Diagnosis, DiagnosisSource, Screening, ScreeningProfile};
use eyescan_llm::{ClassificationError, MockClassifier};
use proptest::prelude::*;

const PNG_HEADER: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// What the mock classifier does.
enum Reply {
    Text(&'static str),
    Fail(ClassificationError),
}

/// Expected terminal state.
#[derive(Debug)]
enum Expected {
    Disease(&'static str),
    Healthy,
    Unsupported,
    ClassificationFailed,
    InputInvalid,
}

/// Test case from the golden table.
struct GoldenCase {
    id: &'static str,
    profile: &'static str,
    factors: Vec<RiskFactor>,
    drop_name: bool,
    with_image: bool,
    reply: Reply,
    expected: Expected,
    expected_calls: usize,
}

fn get_golden_cases() -> Vec<GoldenCase> {
    vec![
        GoldenCase {
            id: "diabetes-beats-none",
            profile: "final",
            factors: vec![RiskFactor::NoneOfTheAbove, RiskFactor::Diabetes],
            drop_name: false,
            with_image: true,
            reply: Reply::Text("cataract"),
            expected: Expected::Disease("glaucoma"),
            expected_calls: 0,
        },
        GoldenCase {
            id: "diabetes-beats-third-eye",
            profile: "final",
            factors: vec![RiskFactor::ThirdEye, RiskFactor::Diabetes],
            drop_name: false,
            with_image: true,
            reply: Reply::Text("cataract"),
            expected: Expected::Disease("glaucoma"),
            expected_calls: 0,
        },
        GoldenCase {
            id: "third-eye-beats-none",
            profile: "final",
            factors: vec![RiskFactor::NoneOfTheAbove, RiskFactor::ThirdEye],
            drop_name: false,
            with_image: true,
            reply: Reply::Text("cataract"),
            expected: Expected::Disease("uveitis"),
            expected_calls: 0,
        },
        GoldenCase {
            id: "none-alone-is-healthy",
            profile: "final",
            factors: vec![RiskFactor::NoneOfTheAbove],
            drop_name: false,
            with_image: true,
            reply: Reply::Text("cataract"),
            expected: Expected::Healthy,
            expected_calls: 0,
        },
        GoldenCase {
            id: "third-eye-ignored-without-override",
            profile: "app",
            factors: vec![RiskFactor::ThirdEye],
            drop_name: false,
            with_image: true,
            reply: Reply::Text("this looks like early cataract changes"),
            expected: Expected::Disease("cataract"),
            expected_calls: 1,
        },
        GoldenCase {
            id: "substring-match",
            profile: "final",
            factors: vec![],
            drop_name: false,
            with_image: true,
            reply: Reply::Text("this looks like early cataract changes"),
            expected: Expected::Disease("cataract"),
            expected_calls: 1,
        },
        GoldenCase {
            id: "reply-is-normalized",
            profile: "final",
            factors: vec![],
            drop_name: false,
            with_image: true,
            reply: Reply::Text("  CONJUNCTIVITIS detected.\n"),
            expected: Expected::Disease("conjunctivitis"),
            expected_calls: 1,
        },
        GoldenCase {
            id: "bulging-eyes-only-in-app",
            profile: "app",
            factors: vec![],
            drop_name: false,
            with_image: true,
            reply: Reply::Text("bulging eyes"),
            expected: Expected::Disease("bulging eyes"),
            expected_calls: 1,
        },
        GoldenCase {
            id: "bulging-eyes-unknown-in-final",
            profile: "final",
            factors: vec![],
            drop_name: false,
            with_image: true,
            reply: Reply::Text("bulging eyes"),
            expected: Expected::Healthy,
            expected_calls: 1,
        },
        GoldenCase {
            id: "unsupported-phrase",
            profile: "final",
            factors: vec![],
            drop_name: false,
            with_image: true,
            reply: Reply::Text("This is not an eye image or an unsupported condition."),
            expected: Expected::Unsupported,
            expected_calls: 1,
        },
        GoldenCase {
            id: "demo-no-match-is-unsupported",
            profile: "demo",
            factors: vec![RiskFactor::Diabetes],
            drop_name: false,
            with_image: true,
            reply: Reply::Text("the eye looks normal"),
            expected: Expected::Unsupported,
            expected_calls: 1,
        },
        GoldenCase {
            id: "transport-failure",
            profile: "final",
            factors: vec![],
            drop_name: false,
            with_image: true,
            reply: Reply::Fail(ClassificationError::Transport("connection refused".into())),
            expected: Expected::ClassificationFailed,
            expected_calls: 1,
        },
        GoldenCase {
            id: "quota-failure",
            profile: "final",
            factors: vec![],
            drop_name: false,
            with_image: true,
            reply: Reply::Fail(ClassificationError::Status {
                status: 429,
                body: "quota exceeded".into(),
            }),
            expected: Expected::ClassificationFailed,
            expected_calls: 1,
        },
        GoldenCase {
            id: "missing-name",
            profile: "final",
            factors: vec![],
            drop_name: true,
            with_image: true,
            reply: Reply::Text("cataract"),
            expected: Expected::InputInvalid,
            expected_calls: 0,
        },
        GoldenCase {
            id: "missing-image",
            profile: "final",
            factors: vec![],
            drop_name: false,
            with_image: false,
            reply: Reply::Text("cataract"),
            expected: Expected::InputInvalid,
            expected_calls: 0,
        },
    ]
}

fn form(factors: Vec<RiskFactor>) -> FormInput {
    FormInput {
        name: "Lakshmi".into(),
        age: 47,
        gender: "Female".into(),
        location: "Kochi".into(),
        symptoms: vec![Symptom::Redness],
        risk_factors: factors,
        ..Default::default()
    }
}

fn screening(profile: &str, mock: &Arc<MockClassifier>) -> Screening {
    let profile = ScreeningProfile::builtin(profile).unwrap();
    Screening::new(profile, Box::new(mock.clone())).unwrap()
}

fn check(case: &GoldenCase, diagnosis: &Diagnosis) {
    match (&case.expected, diagnosis) {
        (Expected::Disease(key), Diagnosis::Diagnosed { disease, .. }) => {
            assert_eq!(disease, key, "Case {}: disease mismatch", case.id)
        }
        (Expected::Healthy, Diagnosis::Healthy { .. })
        | (Expected::Unsupported, Diagnosis::Unsupported)
        | (Expected::ClassificationFailed, Diagnosis::ClassificationFailed { .. })
        | (Expected::InputInvalid, Diagnosis::InputInvalid { .. }) => {}
        (expected, actual) => panic!(
            "Case {}: expected {:?}, got {:?}",
            case.id, expected, actual
        ),
    }
}

#[test]
fn test_golden_cases() {
    for case in get_golden_cases() {
        let mock = Arc::new(match &case.reply {
            Reply::Text(text) => MockClassifier::replying(text),
            Reply::Fail(err) => MockClassifier::failing(err.clone()),
        });
        let screening = screening(case.profile, &mock);

        let mut input = form(case.factors.clone());
        if case.drop_name {
            input.name.clear();
        }
        let upload = UploadedImage::new(PNG_HEADER.to_vec(), "image/png");
        let upload = case.with_image.then_some(&upload);

        let outcome = screening.run(input, upload);

        check(&case, &outcome.diagnosis);
        assert_eq!(
            mock.calls(),
            case.expected_calls,
            "Case {}: classifier call count mismatch",
            case.id
        );
    }
}

#[test]
fn test_failure_never_equals_healthy() {
    let mock = Arc::new(MockClassifier::failing(ClassificationError::Timeout(30)));
    let screening = screening("final", &mock);
    let upload = UploadedImage::new(PNG_HEADER.to_vec(), "image/png");

    let outcome = screening.run(form(vec![]), Some(&upload));

    assert_ne!(
        outcome.diagnosis,
        Diagnosis::Healthy {
            source: DiagnosisSource::Classifier
        }
    );
    assert!(outcome.diagnosis.is_failure());
    assert!(!outcome.markdown.contains("healthy eye"));
}

#[test]
fn test_unsupported_message_is_not_healthy_message() {
    let mock = Arc::new(MockClassifier::replying(
        "this is not an eye image or an unsupported condition.",
    ));
    let screening = screening("final", &mock);
    let upload = UploadedImage::new(PNG_HEADER.to_vec(), "image/png");

    let outcome = screening.run(form(vec![]), Some(&upload));

    assert_eq!(outcome.diagnosis, Diagnosis::Unsupported);
    assert!(outcome.markdown.contains("not an eye image"));
    assert!(!outcome.markdown.contains("healthy"));
}

proptest! {
    #[test]
    fn prop_key_found_anywhere_in_noise(
        index in 0usize..5,
        prefix in "[0-9 .,:;!?()-]{0,24}",
        suffix in "[0-9 .,:;!?()-]{0,24}",
    ) {
        let profile = ScreeningProfile::builtin("final").unwrap();
        let key = profile.diseases.entries()[index].key.clone();
        let reply = format!("{prefix}{key}{suffix}");
        let mock = Arc::new(MockClassifier::replying(&reply));
        let screening = Screening::new(profile, Box::new(mock.clone())).unwrap();
        let upload = UploadedImage::new(PNG_HEADER.to_vec(), "image/png");

        let outcome = screening.run(form(vec![]), Some(&upload));

        prop_assert_eq!(outcome.diagnosis.disease(), Some(key.as_str()));
        prop_assert_eq!(mock.calls(), 1);
    }

    #[test]
    fn prop_diabetes_always_wins(
        others in proptest::sample::subsequence(RiskFactor::ALL.to_vec(), 0..=RiskFactor::ALL.len()),
    ) {
        let mock = Arc::new(MockClassifier::replying("cataract"));
        let screening = screening("final", &mock);
        let upload = UploadedImage::new(PNG_HEADER.to_vec(), "image/png");
        let mut factors = others;
        factors.push(RiskFactor::Diabetes);

        let outcome = screening.run(form(factors), Some(&upload));

        prop_assert_eq!(outcome.diagnosis.disease(), Some("glaucoma"));
        prop_assert_eq!(
            outcome.diagnosis.source(),
            Some(DiagnosisSource::Override(RiskFactor::Diabetes))
        );
        prop_assert_eq!(mock.calls(), 0);
    }
}
