//! Per-language readability scoring.
//!
//! Grades text on a US school-grade scale with Flesch–Kincaid style formulas.
//! English uses the standard coefficients; Spanish and Hindi use adapted
//! constants that compensate for how their syllable heuristics count.

pub mod syllables;

use crate::i18n::LanguageCatalog;
use regex::Regex;
use serde::Serialize;
use std::sync::{Arc, OnceLock};

/// Minimum number of words for a meaningful score (see [`ReadabilityScorer::analyze`])
pub const DEFAULT_MIN_WORDS: usize = 10;

/// Word floor that still applies when the text has several sentences
const MULTI_SENTENCE_MIN_WORDS: usize = 5;

/// Grades above this are flagged as complex (college level)
pub const DEFAULT_COMPLEXITY_THRESHOLD: f64 = 12.0;

pub const TOO_SHORT_MESSAGE: &str = "Text too short to analyze.";

/// Formula and syllable rules used for a language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringModel {
    English,
    Spanish,
    Hindi,
}

struct Coefficients {
    grade_per_word: f64,
    grade_per_syllable: f64,
    grade_offset: f64,
    ease_base: f64,
    ease_per_word: f64,
    ease_per_syllable: f64,
}

impl ScoringModel {
    /// `es*` → Spanish, `hi*` → Hindi, anything else → English.
    pub fn for_language(code: &str) -> Self {
        let code = code.trim().to_lowercase();
        if code.starts_with("es") {
            ScoringModel::Spanish
        } else if code.starts_with("hi") {
            ScoringModel::Hindi
        } else {
            ScoringModel::English
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ScoringModel::English => "en",
            ScoringModel::Spanish => "es",
            ScoringModel::Hindi => "hi",
        }
    }

    pub fn syllables(&self, word: &str) -> usize {
        match self {
            ScoringModel::English => syllables::english(word),
            ScoringModel::Spanish => syllables::spanish(word),
            ScoringModel::Hindi => syllables::hindi(word),
        }
    }

    fn coefficients(&self) -> Coefficients {
        match self {
            ScoringModel::English => Coefficients {
                grade_per_word: 0.39,
                grade_per_syllable: 11.8,
                grade_offset: -15.59,
                ease_base: 206.835,
                ease_per_word: 1.015,
                ease_per_syllable: 84.6,
            },
            ScoringModel::Spanish => Coefficients {
                grade_per_word: 0.6,
                grade_per_syllable: 9.0,
                grade_offset: -14.0,
                ease_base: 206.835,
                ease_per_word: 0.9,
                ease_per_syllable: 60.0,
            },
            ScoringModel::Hindi => Coefficients {
                grade_per_word: 0.5,
                grade_per_syllable: 7.5,
                grade_offset: -12.0,
                ease_base: 200.0,
                ease_per_word: 1.0,
                ease_per_syllable: 50.0,
            },
        }
    }
}

/// Raw counts behind a score.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadabilityStats {
    pub word_count: usize,
    pub sentence_count: usize,
    pub syllable_count: usize,
    pub avg_words_per_sentence: f64,
    pub avg_syllables_per_word: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadabilityReport {
    /// Estimated US school grade, ≥ 0
    pub grade_level: f64,
    /// 0 (hard) to 100 (easy)
    pub ease_score: f64,
    pub level_key: String,
    pub level_label: String,
    pub is_complex: bool,
    /// Scoring model used: "en", "es" or "hi"
    pub language: String,
    pub stats: ReadabilityStats,
    pub recommendations: Vec<String>,
}

impl ReadabilityReport {
    fn too_short(model: ScoringModel) -> Self {
        Self {
            grade_level: 0.0,
            ease_score: 0.0,
            level_key: "unknown".to_string(),
            level_label: "Unknown".to_string(),
            is_complex: false,
            language: model.code().to_string(),
            stats: ReadabilityStats::default(),
            recommendations: vec![TOO_SHORT_MESSAGE.to_string()],
        }
    }
}

static CLEAN_REGEX: OnceLock<Regex> = OnceLock::new();
static WHITESPACE_REGEX: OnceLock<Regex> = OnceLock::new();
static WORD_REGEX: OnceLock<Regex> = OnceLock::new();
static SENTENCE_END_REGEX: OnceLock<Regex> = OnceLock::new();

/// Normalise Devanagari danda to '.', drop everything except letters, marks,
/// digits, whitespace and sentence punctuation, and collapse whitespace.
fn clean_text(text: &str) -> String {
    let clean = CLEAN_REGEX.get_or_init(|| Regex::new(r"[^\p{L}\p{M}\p{N}\s.!?]").unwrap());
    let whitespace = WHITESPACE_REGEX.get_or_init(|| Regex::new(r"\s+").unwrap());

    let text = text.replace(['।', '॥'], ".");
    let stripped = clean.replace_all(&text, "");
    whitespace.replace_all(&stripped, " ").trim().to_string()
}

fn words(text: &str) -> Vec<&str> {
    let regex = WORD_REGEX.get_or_init(|| Regex::new(r"\w+").unwrap());
    regex.find_iter(text).map(|m| m.as_str()).collect()
}

/// Sentence count; text without terminal punctuation is one sentence.
fn sentence_count(text: &str) -> usize {
    let regex = SENTENCE_END_REGEX.get_or_init(|| Regex::new(r"[.!?]+(?:\s+|$)").unwrap());
    regex
        .split(text)
        .filter(|fragment| !fragment.trim().is_empty())
        .count()
        .max(1)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Scores text readability against a [`LanguageCatalog`]'s reading bands.
#[derive(Debug, Clone)]
pub struct ReadabilityScorer {
    catalog: Arc<LanguageCatalog>,
    min_words: usize,
    complexity_threshold: f64,
}

impl ReadabilityScorer {
    pub fn new(catalog: Arc<LanguageCatalog>) -> Self {
        Self {
            catalog,
            min_words: DEFAULT_MIN_WORDS,
            complexity_threshold: DEFAULT_COMPLEXITY_THRESHOLD,
        }
    }

    pub fn with_min_words(mut self, min_words: usize) -> Self {
        self.min_words = min_words;
        self
    }

    pub fn with_complexity_threshold(mut self, threshold: f64) -> Self {
        self.complexity_threshold = threshold;
        self
    }

    /// Score `text` as `language`.
    ///
    /// Text with no words, fewer than the minimum word count in a single
    /// sentence, or fewer than five words overall yields the "too short"
    /// report with level `unknown`.
    pub fn analyze(&self, text: &str, language: &str) -> ReadabilityReport {
        let model = ScoringModel::for_language(language);
        let cleaned = clean_text(text);
        let words = words(&cleaned);
        let sentence_count = sentence_count(&cleaned);
        let word_count = words.len();

        let floor = MULTI_SENTENCE_MIN_WORDS.min(self.min_words);
        if word_count == 0
            || word_count < floor
            || (word_count < self.min_words && sentence_count < 2)
        {
            return ReadabilityReport::too_short(model);
        }

        let syllable_count: usize = words.iter().map(|w| model.syllables(w).max(1)).sum();
        let words_per_sentence = word_count as f64 / sentence_count as f64;
        let syllables_per_word = syllable_count as f64 / word_count as f64;

        let c = model.coefficients();
        let raw_grade = c.grade_per_word * words_per_sentence
            + c.grade_per_syllable * syllables_per_word
            + c.grade_offset;
        let raw_ease = c.ease_base
            - c.ease_per_word * words_per_sentence
            - c.ease_per_syllable * syllables_per_word;

        let grade_level = round1(raw_grade.max(0.0));
        let ease_score = round1(raw_ease.clamp(0.0, 100.0));
        let is_complex = grade_level > self.complexity_threshold;

        let stats = ReadabilityStats {
            word_count,
            sentence_count,
            syllable_count,
            avg_words_per_sentence: round2(words_per_sentence),
            avg_syllables_per_word: round2(syllables_per_word),
        };
        let band = self.catalog.band_for_grade(grade_level);

        ReadabilityReport {
            grade_level,
            ease_score,
            level_key: band.key.to_string(),
            level_label: band.label.to_string(),
            is_complex,
            language: model.code().to_string(),
            recommendations: recommendations(&stats, ease_score, is_complex),
            stats,
        }
    }
}

fn recommendations(stats: &ReadabilityStats, ease_score: f64, is_complex: bool) -> Vec<String> {
    if !is_complex {
        return vec!["Text readability is appropriate for a general audience.".to_string()];
    }

    let mut recommendations = Vec::new();
    if stats.avg_words_per_sentence > 20.0 {
        recommendations
            .push("Break long sentences into shorter ones (aim for under 20 words).".to_string());
    }
    if stats.avg_syllables_per_word > 1.8 {
        recommendations.push("Replace long words with simpler everyday alternatives.".to_string());
    }
    if ease_score < 30.0 {
        recommendations.push("Simplify sentence structure to improve reading ease.".to_string());
    }
    if stats.sentence_count < 3 {
        recommendations.push("Expand the explanation over a few short sentences.".to_string());
    }
    if recommendations.is_empty() {
        recommendations.push(
            "Simplify medical terminology or add plain-language explanations.".to_string(),
        );
    }
    recommendations
}
