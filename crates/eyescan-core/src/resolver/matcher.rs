//! Ordered matching of classifier replies against the catalog.
//!
//! Rules are evaluated in catalog order and the first hit wins; nothing is
//! ranked by confidence. Unsupported phrases are consulted only when no
//! disease rule matched.

use crate::profile::ScreeningProfile;

/// How a rule recognises its phrase in a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    /// Literal, case-sensitive substring of the normalized reply
    Substring(String),
}

impl Matcher {
    pub fn matches(&self, text: &str) -> bool {
        match self {
            Matcher::Substring(needle) => text.contains(needle.as_str()),
        }
    }
}

/// A (catalog key, matcher) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRule {
    pub key: String,
    pub matcher: Matcher,
}

/// Result of reading one reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextVerdict {
    Disease(String),
    Unsupported,
    NoMatch,
}

/// The full matching policy of a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseMatcher {
    rules: Vec<MatchRule>,
    unsupported: Vec<Matcher>,
}

impl ResponseMatcher {
    /// One rule per key, followed by that key's aliases, in catalog order.
    pub fn from_profile(profile: &ScreeningProfile) -> Self {
        let mut rules = Vec::new();
        for entry in profile.diseases.entries() {
            rules.push(MatchRule {
                key: entry.key.clone(),
                matcher: Matcher::Substring(entry.key.clone()),
            });
            for alias in &entry.aliases {
                rules.push(MatchRule {
                    key: entry.key.clone(),
                    matcher: Matcher::Substring(alias.trim().to_lowercase()),
                });
            }
        }

        let unsupported = profile
            .unsupported_phrases
            .iter()
            .map(|p| Matcher::Substring(p.trim().to_lowercase()))
            .collect();

        Self { rules, unsupported }
    }

    pub fn rules(&self) -> &[MatchRule] {
        &self.rules
    }

    /// Read a normalized reply.
    pub fn evaluate(&self, text: &str) -> TextVerdict {
        if let Some(rule) = self.rules.iter().find(|r| r.matcher.matches(text)) {
            return TextVerdict::Disease(rule.key.clone());
        }
        if self.unsupported.iter().any(|m| m.matches(text)) {
            return TextVerdict::Unsupported;
        }
        TextVerdict::NoMatch
    }
}
