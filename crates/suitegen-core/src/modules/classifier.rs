//! Lexical classification of captured oracle output.
//!
//! The oracle offers no structured verdict, so the category comes from
//! case-sensitive substring matches checked in a fixed order: error markers,
//! then benign-anomaly phrases, then the bare `invalid` token. The first tier
//! that matches decides.

use crate::domain::Category;

pub const ERROR_MARKERS: [&str; 2] = ["ERROR:", "ERRORS DETECTED"];
pub const WARNING_PHRASES: [&str; 2] = [
    "additional data after IEND chunk",
    "private (invalid?) PLTE chunk",
];
pub const LOOSE_WARNING_TOKEN: &str = "invalid";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    High,
    /// Only the bare `invalid` token matched, which also shows up in
    /// ordinary chunk descriptions.
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub category: Category,
    pub confidence: Confidence,
    pub matched: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationPolicy {
    pub error_markers: Vec<String>,
    pub warning_phrases: Vec<String>,
    pub loose_warning_token: Option<String>,
}

impl Default for ClassificationPolicy {
    fn default() -> Self {
        Self {
            error_markers: ERROR_MARKERS.iter().map(|marker| marker.to_string()).collect(),
            warning_phrases: WARNING_PHRASES
                .iter()
                .map(|phrase| phrase.to_string())
                .collect(),
            loose_warning_token: Some(LOOSE_WARNING_TOKEN.to_string()),
        }
    }
}

impl ClassificationPolicy {
    /// Category for a record's text, or `Unknown` when no record exists.
    pub fn classify(&self, text: Option<&str>) -> Category {
        self.classify_detailed(text).category
    }

    pub fn classify_detailed(&self, text: Option<&str>) -> Classification {
        let Some(text) = text else {
            return Classification {
                category: Category::Unknown,
                confidence: Confidence::High,
                matched: None,
            };
        };

        if let Some(marker) = first_match(text, &self.error_markers) {
            return Classification {
                category: Category::Invalid,
                confidence: Confidence::High,
                matched: Some(marker.to_string()),
            };
        }

        if let Some(phrase) = first_match(text, &self.warning_phrases) {
            return Classification {
                category: Category::Warning,
                confidence: Confidence::High,
                matched: Some(phrase.to_string()),
            };
        }

        if let Some(token) = self
            .loose_warning_token
            .as_deref()
            .filter(|token| text.contains(token))
        {
            return Classification {
                category: Category::Warning,
                confidence: Confidence::Low,
                matched: Some(token.to_string()),
            };
        }

        Classification {
            category: Category::Valid,
            confidence: Confidence::High,
            matched: None,
        }
    }
}

fn first_match<'a>(text: &str, needles: &'a [String]) -> Option<&'a str> {
    needles
        .iter()
        .map(String::as_str)
        .find(|needle| text.contains(needle))
}

/// [`ClassificationPolicy::classify`] with the default policy.
pub fn classify(text: Option<&str>) -> Category {
    ClassificationPolicy::default().classify(text)
}
