//! Disease catalog models.

use serde::{Deserialize, Serialize};

/// A single disease the screening can report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiseaseEntry {
    /// Lower-case catalog key, also the phrase looked for in model replies
    pub key: String,
    /// Extra lower-case phrases that also identify this disease in a reply
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Extra guidance sentence appended to the instruction prompt
    #[serde(default)]
    pub prompt_hint: Option<String>,
    /// Typical symptoms, in display order
    pub symptoms: Vec<String>,
    /// Recommended precautions, in display order
    pub precautions: Vec<String>,
}

impl DiseaseEntry {
    /// Create an entry with the required fields.
    pub fn new(key: &str, symptoms: &[&str], precautions: &[&str]) -> Self {
        Self {
            key: key.to_string(),
            aliases: Vec::new(),
            prompt_hint: None,
            symptoms: symptoms.iter().map(|s| s.to_string()).collect(),
            precautions: precautions.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Key in title case for display ("cross eyes" → "Cross Eyes").
    pub fn display_name(&self) -> String {
        title_case(&self.key)
    }
}

/// Ordered, read-only table of diseases. Iteration order is match priority.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Catalog {
    entries: Vec<DiseaseEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<DiseaseEntry>) -> Self {
        Self { entries }
    }

    /// Look up a disease by its exact (lower-case) key.
    pub fn lookup(&self, key: &str) -> Option<&DiseaseEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    /// Keys in catalog order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    pub fn entries(&self) -> &[DiseaseEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Upper-case the first letter of every space-separated word.
pub fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Catalog {
        Catalog::new(vec![
            DiseaseEntry::new(
                "cross eyes",
                &["Misalignment of the eyes"],
                &["Vision therapy"],
            ),
            DiseaseEntry::new("cataract", &["Blurred or cloudy vision"], &["Regular eye check-ups"]),
        ])
    }

    #[test]
    fn test_lookup_is_exact() {
        let catalog = sample();
        assert!(catalog.lookup("cataract").is_some());
        assert!(catalog.lookup("Cataract").is_none());
        assert!(catalog.lookup("cataracts").is_none());
        assert!(!catalog.contains("glaucoma"));
    }

    #[test]
    fn test_keys_keep_order() {
        let catalog = sample();
        let keys: Vec<&str> = catalog.keys().collect();
        assert_eq!(keys, vec!["cross eyes", "cataract"]);
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_display_name() {
        let catalog = sample();
        assert_eq!(catalog.lookup("cross eyes").unwrap().display_name(), "Cross Eyes");
        assert_eq!(title_case("bulging eyes"), "Bulging Eyes");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_catalog_deserializes_from_list() {
        let json = r#"[{"key":"uveitis","symptoms":["Eye redness"],"precautions":["Avoid eye strain"]}]"#;
        let catalog: Catalog = serde_json::from_str(json).unwrap();
        let entry = catalog.lookup("uveitis").unwrap();
        assert!(entry.aliases.is_empty());
        assert!(entry.prompt_hint.is_none());
        assert_eq!(entry.precautions, vec!["Avoid eye strain".to_string()]);
    }
}
