use crate::error::ClassifierError;
use crate::models::Ecosystem;

pub mod lexicon;

/// Acceptance threshold applied by the resolution engine; the classifier
/// itself reports everything it knows.
pub const CONFIDENCE_THRESHOLD: f64 = 0.7;

/// A single classifier label. The label names a dependency and may carry a
/// version hint as `name:version`; without one the version resolves later.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub confidence: f64,
}

impl Prediction {
    /// Split the label into (dependency name, optional version hint).
    ///
    /// Only a trailing segment that looks like a version (leading digit)
    /// counts as a hint, so Maven `group:artifact` coordinates survive
    /// intact.
    pub fn into_parts(self) -> (String, Option<String>) {
        match self.label.rsplit_once(':') {
            Some((name, version))
                if version.chars().next().is_some_and(|c| c.is_ascii_digit()) =>
            {
                (name.to_string(), Some(version.to_string()))
            }
            _ => (self.label, None),
        }
    }
}

/// Maps an import symbol to dependency predictions. Pluggable: the engine
/// only relies on this contract, and a failing adapter degrades to zero
/// predictions for the affected import, never aborting inference elsewhere.
pub trait Classifier: Send + Sync {
    fn predict(
        &self,
        symbol: &str,
        ecosystem: Ecosystem,
    ) -> Result<Vec<Prediction>, ClassifierError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_into_parts() {
        let with_hint = Prediction { label: "numpy:1.26.0".to_string(), confidence: 0.9 };
        assert_eq!(
            with_hint.into_parts(),
            ("numpy".to_string(), Some("1.26.0".to_string()))
        );

        let bare = Prediction { label: "requests".to_string(), confidence: 0.9 };
        assert_eq!(bare.into_parts(), ("requests".to_string(), None));
    }

    #[test]
    fn test_maven_coordinates_are_not_version_hints() {
        let coord = Prediction { label: "org.slf4j:slf4j-api".to_string(), confidence: 0.9 };
        assert_eq!(coord.into_parts(), ("org.slf4j:slf4j-api".to_string(), None));

        let coord_with_hint =
            Prediction { label: "org.slf4j:slf4j-api:2.0.13".to_string(), confidence: 0.9 };
        assert_eq!(
            coord_with_hint.into_parts(),
            ("org.slf4j:slf4j-api".to_string(), Some("2.0.13".to_string()))
        );
    }
}
