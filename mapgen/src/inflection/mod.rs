//! Singularization of property names
//!
//! Property names are snake_case, so only the last word is inflected:
//! `dog_teeth` yields `dog_tooth`. Candidates come out most specific first and the
//! position of a candidate is its tier; lower tiers win during correlation.

mod noun_knowledge;

use std::collections::BTreeMap;
use std::collections::HashMap;

use itertools::Itertools;
pub use noun_knowledge::IRREGULAR_SINGULARS;
use noun_knowledge::SUFFIX_RULES;

/// Derives singular forms of plural property names
#[derive(Debug, Clone, Default)]
pub struct Inflector {
    overrides: HashMap<String, String>,
}

impl Inflector {
    /// Create an inflector with domain-specific overrides
    pub fn new(overrides: &BTreeMap<String, String>) -> Self {
        Self {
            overrides: overrides
                .iter()
                .map(|(plural, singular)| (plural.clone(), singular.clone()))
                .collect(),
        }
    }

    /// Singular candidates for `word`, most specific first
    ///
    /// Order: user override, irregular table, regular suffix rules, then the word itself.
    /// The word itself is always the last candidate.
    pub fn singular_candidates(&self, word: &str) -> Vec<String> {
        let (prefix, last) = match word.rfind('_') {
            Some(split) => word.split_at(split + 1),
            None => ("", word),
        };

        let mut candidates = Vec::new();
        if let Some(singular) = self.overrides.get(word) {
            candidates.push(singular.clone());
        }
        if let Some(singular) = self.overrides.get(last) {
            candidates.push(format!("{prefix}{singular}"));
        }
        if let Some(singular) = IRREGULAR_SINGULARS.get(last) {
            candidates.push(format!("{prefix}{singular}"));
        }
        candidates.extend(
            Self::regular_singulars(last)
                .into_iter()
                .map(|singular| format!("{prefix}{singular}")),
        );
        candidates.push(word.to_string());

        candidates.into_iter().unique().collect()
    }

    /// The most specific singular form of `word`
    pub fn singularize(&self, word: &str) -> String {
        self.singular_candidates(word)
            .into_iter()
            .next()
            .unwrap_or_else(|| word.to_string())
    }

    /// Tier of `candidate` among the singular candidates of `word`
    pub fn singular_tier(&self, word: &str, candidate: &str) -> Option<usize> {
        self.singular_candidates(word)
            .iter()
            .position(|singular| singular == candidate)
    }

    fn regular_singulars(word: &str) -> Vec<String> {
        SUFFIX_RULES
            .iter()
            .filter_map(|(suffix, replacement)| {
                let stem = word.strip_suffix(suffix)?;
                if stem.is_empty() {
                    return None;
                }
                // `class`, `status`
                if *suffix == "s" && (word.ends_with("ss") || word.ends_with("us")) {
                    return None;
                }
                Some(format!("{stem}{replacement}"))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inflector() -> Inflector {
        Inflector::default()
    }

    #[test]
    fn test_irregular_entry_comes_before_regular_guess() {
        let candidates = inflector().singular_candidates("teeth");
        assert_eq!(candidates, vec!["tooth".to_string(), "teeth".to_string()]);
        assert_eq!(inflector().singularize("mice"), "mouse");
    }

    #[test]
    fn test_regular_rules() {
        let cases = [
            ("pets", "pet"),
            ("categories", "category"),
            ("boxes", "box"),
            ("churches", "church"),
            ("classes", "class"),
            ("wolves", "wolf"),
            ("pet_names", "pet_name"),
            ("dog_teeth", "dog_tooth"),
        ];

        for (plural, singular) in cases {
            assert_eq!(inflector().singularize(plural), singular, "Failed for: {plural}");
        }
    }

    #[test]
    fn test_word_itself_is_always_last_candidate() {
        for word in ["pets", "teeth", "status", "x"] {
            assert_eq!(
                inflector().singular_candidates(word).last().map(String::as_str),
                Some(word),
                "Failed for: {word}"
            );
        }
    }

    #[test]
    fn test_override_outranks_irregular_table() {
        let overrides = BTreeMap::from([("teeth".to_string(), "fang".to_string())]);
        let inflector = Inflector::new(&overrides);
        assert_eq!(
            inflector.singular_candidates("teeth"),
            vec!["fang".to_string(), "tooth".to_string(), "teeth".to_string()]
        );
        assert_eq!(inflector.singular_tier("teeth", "tooth"), Some(1));
        assert_eq!(inflector.singular_tier("teeth", "molar"), None);
    }
}
