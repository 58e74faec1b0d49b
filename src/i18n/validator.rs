//! Translation quality validation module.
//!
//! Checks a provider's raw output against the text that was sent: every
//! placeholder token must come back, and numbers (doses, times, counts) must
//! survive unchanged. Findings are reported, never enforced.

use crate::i18n::terms::placeholders_in;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Validation report containing errors and warnings about a translation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Critical errors that indicate translation issues
    pub errors: Vec<String>,

    /// Non-critical warnings about potential issues
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Check if the report is clean (no errors or warnings)
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

/// Validator for translation quality.
pub struct TranslationValidator;

static NUMBER_REGEX: OnceLock<Regex> = OnceLock::new();

impl TranslationValidator {
    /// Validate that a translation preserves important elements of the text sent.
    ///
    /// # Arguments
    /// * `sent` - The text handed to the provider (placeholders included)
    /// * `received` - The provider's raw output, before placeholders are restored
    pub fn validate(sent: &str, received: &str) -> ValidationReport {
        let mut report = ValidationReport::default();

        let sent_tokens: BTreeSet<String> = placeholders_in(sent).into_iter().collect();
        let received_tokens: BTreeSet<String> = placeholders_in(received).into_iter().collect();
        let missing: Vec<_> = sent_tokens.difference(&received_tokens).collect();
        if !missing.is_empty() {
            report.errors.push(format!(
                "Placeholders lost in translation: {:?}",
                missing
            ));
        }

        let mut sent_numbers = Self::extract_numbers(sent);
        let mut received_numbers = Self::extract_numbers(received);
        sent_numbers.sort();
        received_numbers.sort();
        if sent_numbers != received_numbers {
            report.warnings.push(format!(
                "Number mismatch: original has {:?}, translation has {:?}",
                sent_numbers, received_numbers
            ));
        }

        report
    }

    /// Extract numeric tokens (e.g. "500", "2.5", "0,5") outside placeholders
    fn extract_numbers(text: &str) -> Vec<String> {
        let regex = NUMBER_REGEX
            .get_or_init(|| Regex::new(r"(?i)__TERM_\d+__|\d+(?:[.,]\d+)?").unwrap());

        regex
            .find_iter(text)
            .map(|m| m.as_str())
            .filter(|token| !token.starts_with("__"))
            .map(|token| token.replace(',', "."))
            .collect()
    }
}
