//! Language data and translation-quality support.
//!
//! - `registry`: supported languages and reading-level bands
//! - `terms`: medical term dictionary and placeholder substitution
//! - `validator`: post-translation checks on placeholders and numbers
//! - `metrics`: per-client translation counters

mod metrics;
mod registry;
pub mod terms;
mod validator;

pub use metrics::{MetricsReport, TranslationMetrics};
pub use registry::{LanguageCatalog, LanguageEntry, ReadingLevelBand};
pub use terms::{Replacements, Substitution, TermDictionary, TermEntry};
pub use validator::{TranslationValidator, ValidationReport};
