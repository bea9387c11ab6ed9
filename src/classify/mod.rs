//! Emotion classification of journal text.
//!
//! [`Classifier::classify`] never fails: whenever the upstream model cannot
//! give an authoritative answer the caller receives [`ClassificationResult::fallback`].
//! A fallback is indistinguishable from a genuine "neutral, 50%" prediction,
//! so downstream code must not treat it as a signal of upstream health.

mod huggingface;
mod prediction;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use huggingface::HuggingFaceClassifier;
pub use prediction::parse_prediction;

/// Label returned when no authoritative answer could be obtained.
pub const FALLBACK_LABEL: &str = "neutral";

/// Confidence returned alongside [`FALLBACK_LABEL`].
pub const FALLBACK_CONFIDENCE: f64 = 50.0;

/// Dominant emotion of a text with its confidence as a percentage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Lowercase category name, never empty
    pub label: String,
    /// Percentage in `[0, 100]`, rounded to one decimal place
    pub confidence: f64,
}

impl ClassificationResult {
    pub fn fallback() -> Self {
        Self {
            label: FALLBACK_LABEL.to_string(),
            confidence: FALLBACK_CONFIDENCE,
        }
    }

    /// Label with its first letter upper-cased, e.g. `joy` -> `Joy`.
    pub fn display_label(&self) -> String {
        title_case(&self.label)
    }
}

impl fmt::Display for ClassificationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.1}%)", self.display_label(), self.confidence)
    }
}

pub(crate) fn title_case(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Anything that can label the dominant emotion of a text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Best-effort classification; degrades to the fallback instead of failing.
    async fn classify(&self, text: &str) -> ClassificationResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback() {
        let result = ClassificationResult::fallback();
        assert_eq!(result.label, "neutral");
        assert_eq!(result.confidence, 50.0);
    }

    #[test]
    fn test_display() {
        let result = ClassificationResult {
            label: "joy".into(),
            confidence: 87.3,
        };
        assert_eq!(result.to_string(), "Joy (87.3%)");
        assert_eq!(ClassificationResult::fallback().to_string(), "Neutral (50.0%)");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("sadness"), "Sadness");
        assert_eq!(title_case(""), "");
    }
}
