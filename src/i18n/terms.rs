//! Medical term dictionary and placeholder substitution.
//!
//! Generic translation providers tend to mangle drug names and clinical phrases.
//! Before medical text is sent out, every known term is swapped for an opaque
//! token such as `__TERM_0__`; after the provider answers, the tokens are put back.
//!
//! All terms are compiled into one case-insensitive, whole-word pattern when the
//! dictionary is built. Alternatives are ordered longest first, so with the regex
//! engine's leftmost-first semantics "high blood pressure" wins over
//! "blood pressure", which wins over "blood".

use regex::{Captures, Regex};
use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

/// Placeholder token → the exact text it replaced.
pub type Replacements = BTreeMap<String, String>;

/// Result of [`TermDictionary::substitute_placeholders`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub text: String,
    pub replacements: Replacements,
}

/// A canonical English term and its per-language translations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermEntry {
    pub canonical_term: String,
    pub translations: HashMap<String, String>,
}

impl TermEntry {
    pub fn new(canonical_term: impl Into<String>) -> Self {
        Self {
            canonical_term: canonical_term.into(),
            translations: HashMap::new(),
        }
    }

    pub fn with_translation(mut self, language: &str, translation: impl Into<String>) -> Self {
        self.translations
            .insert(language.to_lowercase(), translation.into());
        self
    }
}

/// Built-in medical terms: (English, [(language, translation)])
const MEDICAL_TERMS: &[(&str, &[(&str, &str)])] = &[
    ("blood pressure", &[("es", "presión arterial"), ("hi", "रक्तचाप")]),
    ("high blood pressure", &[("es", "presión arterial alta"), ("hi", "उच्च रक्तचाप")]),
    ("blood sugar", &[("es", "azúcar en la sangre"), ("hi", "रक्त शर्करा")]),
    ("heart rate", &[("es", "frecuencia cardíaca"), ("hi", "हृदय गति")]),
    ("blood", &[("es", "sangre"), ("hi", "रक्त")]),
    ("diabetes", &[("es", "diabetes"), ("hi", "मधुमेह")]),
    ("hypertension", &[("es", "hipertensión"), ("hi", "उच्च रक्तचाप")]),
    ("cholesterol", &[("es", "colesterol"), ("hi", "कोलेस्ट्रॉल")]),
    ("insulin", &[("es", "insulina"), ("hi", "इंसुलिन")]),
    ("metformin", &[("es", "metformina"), ("hi", "मेटफॉर्मिन")]),
    ("aspirin", &[("es", "aspirina"), ("hi", "एस्पिरिन")]),
    ("ibuprofen", &[("es", "ibuprofeno"), ("hi", "आइबुप्रोफेन")]),
    ("acetaminophen", &[("es", "acetaminofén"), ("hi", "एसिटामिनोफेन")]),
    ("lisinopril", &[("es", "lisinopril"), ("hi", "लिसिनोप्रिल")]),
    ("atorvastatin", &[("es", "atorvastatina"), ("hi", "एटोरवास्टेटिन")]),
    ("amoxicillin", &[("es", "amoxicilina"), ("hi", "एमोक्सिसिलिन")]),
    ("antibiotic", &[("es", "antibiótico"), ("hi", "एंटीबायोटिक")]),
    ("prescription", &[("es", "receta médica"), ("hi", "पर्चा")]),
    ("dosage", &[("es", "dosis"), ("hi", "खुराक")]),
    ("side effects", &[("es", "efectos secundarios"), ("hi", "दुष्प्रभाव")]),
    ("allergy", &[("es", "alergia"), ("hi", "एलर्जी")]),
    ("tablet", &[("es", "tableta"), ("hi", "गोली")]),
    ("capsule", &[("es", "cápsula"), ("hi", "कैप्सूल")]),
    ("mg", &[("es", "mg"), ("hi", "मि.ग्रा.")]),
    ("once daily", &[("es", "una vez al día"), ("hi", "दिन में एक बार")]),
    ("twice daily", &[("es", "dos veces al día"), ("hi", "दिन में दो बार")]),
    ("before meals", &[("es", "antes de las comidas"), ("hi", "भोजन से पहले")]),
    ("after meals", &[("es", "después de las comidas"), ("hi", "भोजन के बाद")]),
];

static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();

fn placeholder(index: usize) -> String {
    format!("__TERM_{}__", index)
}

/// Escaped pattern for one term. Inner whitespace matches any whitespace run;
/// `\b` anchors are only added next to word characters, where they can match.
fn whole_word_pattern(term: &str) -> String {
    let body = term
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+");
    let is_word = |c: Option<char>| c.map_or(false, |c| c.is_alphanumeric() || c == '_');

    format!(
        "{}{}{}",
        if is_word(term.chars().next()) { r"\b" } else { "" },
        body,
        if is_word(term.chars().last()) { r"\b" } else { "" },
    )
}

/// Dictionary of domain terms with a precompiled matcher.
#[derive(Debug, Clone)]
pub struct TermDictionary {
    entries: Vec<TermEntry>,
    /// lowercased canonical term → index into `entries`
    index: HashMap<String, usize>,
    matcher: Option<Regex>,
}

impl TermDictionary {
    /// Build a dictionary from arbitrary entries.
    ///
    /// Fails only if the combined pattern exceeds the regex size limit.
    pub fn new(entries: Vec<TermEntry>) -> Result<Self, regex::Error> {
        let index: HashMap<String, usize> = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.canonical_term.trim().to_lowercase(), i))
            .collect();

        let mut terms: Vec<&str> = index.keys().map(String::as_str).collect();
        terms.retain(|term| !term.is_empty());
        terms.sort_by(|a, b| {
            b.chars()
                .count()
                .cmp(&a.chars().count())
                .then_with(|| a.cmp(b))
        });

        let matcher = if terms.is_empty() {
            None
        } else {
            let alternatives = terms
                .iter()
                .map(|term| whole_word_pattern(term))
                .collect::<Vec<_>>()
                .join("|");
            Some(Regex::new(&format!("(?i)(?:{})", alternatives))?)
        };

        Ok(Self {
            entries,
            index,
            matcher,
        })
    }

    /// The built-in medical dictionary.
    pub fn medical() -> Self {
        let entries = MEDICAL_TERMS
            .iter()
            .map(|(term, translations)| {
                translations
                    .iter()
                    .fold(TermEntry::new(*term), |entry, (language, translation)| {
                        entry.with_translation(language, *translation)
                    })
            })
            .collect();

        Self::new(entries).expect("built-in medical terms form a valid pattern")
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by its English term (case-insensitive exact match).
    pub fn get(&self, term: &str) -> Option<&TermEntry> {
        self.index
            .get(&term.trim().to_lowercase())
            .map(|&i| &self.entries[i])
    }

    /// Canonical translation of a term, or the term unchanged when the
    /// dictionary has no entry or no translation for `target_language`.
    pub fn translate_term(&self, term: &str, target_language: &str) -> String {
        self.get(term)
            .and_then(|entry| entry.translations.get(&target_language.trim().to_lowercase()))
            .cloned()
            .unwrap_or_else(|| term.to_string())
    }

    /// Replace every dictionary term in `text` with a placeholder token.
    ///
    /// Each distinct matched spelling gets one token; repeated mentions reuse it.
    pub fn substitute_placeholders(&self, text: &str) -> Substitution {
        let Some(matcher) = &self.matcher else {
            return Substitution {
                text: text.to_string(),
                replacements: Replacements::new(),
            };
        };

        let mut replacements = Replacements::new();
        let mut tokens: HashMap<String, String> = HashMap::new();

        let rewritten = matcher.replace_all(text, |caps: &Captures| {
            let surface = &caps[0];
            tokens
                .entry(surface.to_string())
                .or_insert_with(|| {
                    let token = placeholder(replacements.len());
                    replacements.insert(token.clone(), surface.to_string());
                    token
                })
                .clone()
        });

        Substitution {
            text: rewritten.into_owned(),
            replacements,
        }
    }

    /// Put the original terms back in place of their placeholder tokens.
    ///
    /// Token matching ignores case, since some providers change the casing of
    /// text they do not understand. Unknown tokens are left as they are.
    pub fn restore_placeholders(&self, text: &str, replacements: &Replacements) -> String {
        if replacements.is_empty() {
            return text.to_string();
        }

        let regex =
            PLACEHOLDER_REGEX.get_or_init(|| Regex::new(r"(?i)__TERM_(\d+)__").unwrap());

        regex
            .replace_all(text, |caps: &Captures| {
                let token = caps[1]
                    .parse::<usize>()
                    .ok()
                    .map(placeholder)
                    .unwrap_or_default();
                replacements
                    .get(&token)
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

impl Default for TermDictionary {
    fn default() -> Self {
        Self::medical()
    }
}

/// All placeholder tokens present in `text`, normalised to their canonical form.
pub(crate) fn placeholders_in(text: &str) -> Vec<String> {
    let regex = PLACEHOLDER_REGEX.get_or_init(|| Regex::new(r"(?i)__TERM_(\d+)__").unwrap());
    regex
        .captures_iter(text)
        .filter_map(|caps| caps[1].parse::<usize>().ok().map(placeholder))
        .collect()
}
