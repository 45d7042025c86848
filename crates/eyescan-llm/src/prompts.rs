//! Instruction prompts for eye image classification.
//!
//! The model is asked to name one of the supported conditions, or to answer
//! with [`UNSUPPORTED_REPLY`] verbatim when it cannot.

/// Literal reply requested for non-eye images and unlisted conditions.
pub const UNSUPPORTED_REPLY: &str = "This is not an eye image or an unsupported condition.";

/// Opening line of every instruction.
pub const SYSTEM_PROMPT: &str = "You are an expert in identifying eye diseases.";

/// Build the instruction sent with the image.
///
/// `conditions` are listed in the given order; `hints` are extra per-condition
/// sentences appended after the list.
pub fn build_instruction(conditions: &[&str], hints: &[&str]) -> String {
    let mut prompt = String::new();

    prompt.push_str(SYSTEM_PROMPT);
    prompt.push('\n');
    prompt.push_str("Detect if the input image shows one of the following conditions: ");
    prompt.push_str(&join_conditions(conditions));
    prompt.push_str(".\n");

    for hint in hints {
        let hint = hint.trim();
        if !hint.is_empty() {
            prompt.push_str(hint);
            prompt.push('\n');
        }
    }

    prompt.push_str(&format!(
        "If it is not an eye image or if the disease is not listed, respond with \"{}\"",
        UNSUPPORTED_REPLY
    ));

    prompt
}

/// Join condition names as an English list: "a, b, or c".
pub fn join_conditions(conditions: &[&str]) -> String {
    match conditions {
        [] => String::new(),
        [only] => only.to_string(),
        [first, second] => format!("{} or {}", first, second),
        [init @ .., last] => format!("{}, or {}", init.join(", "), last),
    }
}
