//! Language catalog: the closed set of supported languages and the reading-level
//! bands used to label readability grades.
//!
//! The catalog is an ordinary value. Callers build one and hand it (usually in an
//! `Arc`) to the translation client and the readability scorer, so independent
//! pipelines never share hidden global state.

use serde::Serialize;

/// A supported language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageEntry {
    /// ISO 639-1 language code (e.g., "en", "es", "hi")
    pub code: &'static str,

    /// English name of the language (e.g., "Spanish")
    pub name: &'static str,

    /// Native name of the language (e.g., "Español")
    pub native_name: &'static str,
}

/// A grade range mapped to a reading level.
///
/// Bands are half-open: a grade matches when `grade_min <= grade < grade_max`.
/// The last band has no upper bound.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingLevelBand {
    pub key: &'static str,
    pub grade_min: f64,
    pub grade_max: Option<f64>,
    pub label: &'static str,
}

impl ReadingLevelBand {
    fn contains(&self, grade: f64) -> bool {
        grade >= self.grade_min && self.grade_max.map_or(true, |max| grade < max)
    }
}

const fn language(
    code: &'static str,
    name: &'static str,
    native_name: &'static str,
) -> LanguageEntry {
    LanguageEntry {
        code,
        name,
        native_name,
    }
}

const fn band(
    key: &'static str,
    grade_min: f64,
    grade_max: Option<f64>,
    label: &'static str,
) -> ReadingLevelBand {
    ReadingLevelBand {
        key,
        grade_min,
        grade_max,
        label,
    }
}

const LANGUAGES: &[LanguageEntry] = &[
    language("en", "English", "English"),
    language("es", "Spanish", "Español"),
    language("hi", "Hindi", "हिन्दी"),
    language("fr", "French", "Français"),
    language("de", "German", "Deutsch"),
    language("pt", "Portuguese", "Português"),
    language("zh", "Chinese", "中文"),
    language("ar", "Arabic", "العربية"),
    language("ru", "Russian", "Русский"),
    language("ja", "Japanese", "日本語"),
];

const READING_LEVELS: &[ReadingLevelBand] = &[
    band("elementary", 0.0, Some(6.0), "Elementary School"),
    band("middle_school", 6.0, Some(9.0), "Middle School"),
    band("high_school", 9.0, Some(12.0), "High School"),
    band("college", 12.0, Some(16.0), "College"),
    band("graduate", 16.0, None, "Graduate"),
];

/// Registry of supported languages and reading-level bands.
#[derive(Debug, Clone)]
pub struct LanguageCatalog {
    languages: &'static [LanguageEntry],
    bands: &'static [ReadingLevelBand],
}

impl LanguageCatalog {
    /// Build the catalog of built-in languages and bands.
    pub fn new() -> Self {
        Self {
            languages: LANGUAGES,
            bands: READING_LEVELS,
        }
    }

    /// All supported languages, in display order.
    pub fn list_languages(&self) -> &[LanguageEntry] {
        self.languages
    }

    /// Get a language entry by its code (case-insensitive).
    pub fn get_by_code(&self, code: &str) -> Option<&LanguageEntry> {
        let code = code.trim();
        self.languages
            .iter()
            .find(|lang| lang.code.eq_ignore_ascii_case(code))
    }

    /// Check if a language code is supported.
    pub fn is_supported(&self, code: &str) -> bool {
        self.get_by_code(code).is_some()
    }

    /// The ordered reading-level bands.
    pub fn bands(&self) -> &[ReadingLevelBand] {
        self.bands
    }

    /// The band a grade falls in.
    ///
    /// Negative grades resolve to the first band; anything no band claims
    /// (NaN, infinities) resolves to the open-ended last band.
    pub fn band_for_grade(&self, grade: f64) -> &ReadingLevelBand {
        let first = &self.bands[0];
        if grade < first.grade_min {
            return first;
        }
        self.bands
            .iter()
            .find(|band| band.contains(grade))
            .unwrap_or(&self.bands[self.bands.len() - 1])
    }

    pub fn key_for_grade(&self, grade: f64) -> &'static str {
        self.band_for_grade(grade).key
    }

    pub fn label_for_grade(&self, grade: f64) -> &'static str {
        self.band_for_grade(grade).label
    }
}

impl Default for LanguageCatalog {
    fn default() -> Self {
        Self::new()
    }
}
