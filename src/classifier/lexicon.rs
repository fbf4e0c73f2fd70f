//! Built-in deterministic classifier.
//!
//! Maps well-known import symbols to the distribution packages that provide
//! them, with fixed confidences. Lookup walks the symbol's dotted prefixes
//! longest-first, so `com.fasterxml.jackson.databind.ObjectMapper` matches
//! the `com.fasterxml.jackson` entry. Unknown symbols yield no predictions.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::error::ClassifierError;
use crate::models::Ecosystem;

use super::{Classifier, Prediction};

/// (symbol prefix, label, confidence) per ecosystem. Labels may carry a
/// version hint; most defer to registry resolution instead.
static LEXICON: Lazy<HashMap<(Ecosystem, &'static str), (&'static str, f64)>> = Lazy::new(|| {
    let entries: &[(Ecosystem, &str, &str, f64)] = &[
        // Python: import name and distribution name frequently differ.
        (Ecosystem::Python, "numpy", "numpy", 0.98),
        (Ecosystem::Python, "pandas", "pandas", 0.98),
        (Ecosystem::Python, "scipy", "scipy", 0.97),
        (Ecosystem::Python, "matplotlib", "matplotlib", 0.97),
        (Ecosystem::Python, "requests", "requests", 0.98),
        (Ecosystem::Python, "flask", "flask", 0.97),
        (Ecosystem::Python, "django", "django", 0.97),
        (Ecosystem::Python, "sklearn", "scikit-learn", 0.96),
        (Ecosystem::Python, "cv2", "opencv-python", 0.95),
        (Ecosystem::Python, "PIL", "pillow", 0.95),
        (Ecosystem::Python, "yaml", "pyyaml", 0.94),
        (Ecosystem::Python, "bs4", "beautifulsoup4", 0.94),
        (Ecosystem::Python, "dotenv", "python-dotenv", 0.92),
        (Ecosystem::Python, "tensorflow", "tensorflow", 0.97),
        (Ecosystem::Python, "torch", "torch", 0.97),
        (Ecosystem::Python, "sqlalchemy", "sqlalchemy", 0.96),
        (Ecosystem::Python, "pytest", "pytest", 0.96),
        // Low-confidence example: ambiguous single-letter import.
        (Ecosystem::Python, "np", "numpy", 0.42),
        // Node: specifiers usually name the package directly.
        (Ecosystem::Node, "react", "react", 0.98),
        (Ecosystem::Node, "react-dom", "react-dom", 0.98),
        (Ecosystem::Node, "express", "express", 0.98),
        (Ecosystem::Node, "lodash", "lodash", 0.97),
        (Ecosystem::Node, "axios", "axios", 0.97),
        (Ecosystem::Node, "vue", "vue", 0.97),
        (Ecosystem::Node, "@babel/core", "@babel/core", 0.96),
        (Ecosystem::Node, "typescript", "typescript", 0.96),
        // Java: dotted package prefixes map to Maven coordinates.
        (Ecosystem::Java, "org.slf4j", "org.slf4j:slf4j-api", 0.95),
        (Ecosystem::Java, "com.fasterxml.jackson", "com.fasterxml.jackson.core:jackson-databind", 0.94),
        (Ecosystem::Java, "org.apache.commons.lang3", "org.apache.commons:commons-lang3", 0.94),
        (Ecosystem::Java, "com.google.gson", "com.google.code.gson:gson", 0.94),
        (Ecosystem::Java, "org.junit", "org.junit.jupiter:junit-jupiter", 0.93),
        (Ecosystem::Java, "org.springframework", "org.springframework:spring-core", 0.9),
        // Ruby: gem names pass through.
        (Ecosystem::Ruby, "rails", "rails", 0.97),
        (Ecosystem::Ruby, "sinatra", "sinatra", 0.96),
        (Ecosystem::Ruby, "nokogiri", "nokogiri", 0.96),
        (Ecosystem::Ruby, "puma", "puma", 0.95),
    ];

    entries
        .iter()
        .map(|&(eco, symbol, label, confidence)| ((eco, symbol), (label, confidence)))
        .collect()
});

/// Deterministic table-backed classifier used when no external model is
/// wired in.
pub struct LexiconClassifier;

impl LexiconClassifier {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LexiconClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for LexiconClassifier {
    fn predict(
        &self,
        symbol: &str,
        ecosystem: Ecosystem,
    ) -> Result<Vec<Prediction>, ClassifierError> {
        for prefix in dotted_prefixes(symbol) {
            if let Some(&(label, confidence)) = LEXICON.get(&(ecosystem, prefix)) {
                return Ok(vec![Prediction {
                    label: label.to_string(),
                    confidence,
                }]);
            }
        }
        Ok(Vec::new())
    }
}

/// Dotted prefixes of a symbol, longest first:
/// `a.b.c` → `["a.b.c", "a.b", "a"]`.
fn dotted_prefixes(symbol: &str) -> Vec<&str> {
    let mut prefixes = vec![symbol];
    let mut end = symbol.len();
    while let Some(dot) = symbol[..end].rfind('.') {
        prefixes.push(&symbol[..dot]);
        end = dot;
    }
    prefixes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_symbol() {
        let preds = LexiconClassifier.predict("sklearn", Ecosystem::Python).unwrap();
        assert_eq!(preds.len(), 1);
        assert_eq!(preds[0].label, "scikit-learn");
        assert!(preds[0].confidence >= 0.7);
    }

    #[test]
    fn test_prefix_match_longest_first() {
        let preds = LexiconClassifier
            .predict("com.fasterxml.jackson.databind.ObjectMapper", Ecosystem::Java)
            .unwrap();
        assert_eq!(preds[0].label, "com.fasterxml.jackson.core:jackson-databind");
    }

    #[test]
    fn test_unknown_symbol_yields_nothing() {
        let preds = LexiconClassifier.predict("left_pad_util", Ecosystem::Python).unwrap();
        assert!(preds.is_empty());
    }

    #[test]
    fn test_ecosystems_do_not_bleed() {
        let preds = LexiconClassifier.predict("react", Ecosystem::Python).unwrap();
        assert!(preds.is_empty());
    }

    #[test]
    fn test_dotted_prefixes() {
        assert_eq!(dotted_prefixes("a.b.c"), vec!["a.b.c", "a.b", "a"]);
        assert_eq!(dotted_prefixes("plain"), vec!["plain"]);
    }
}
