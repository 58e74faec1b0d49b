//! Heuristic syllable counters, one per scoring model.
//!
//! These are approximations tuned for the formulas in the parent module, not
//! linguistic analysis. Every non-empty word counts as at least one syllable.

fn vowel_groups(word: &str, is_vowel: impl Fn(char) -> bool) -> usize {
    let mut groups = 0;
    let mut in_group = false;
    for c in word.chars() {
        let vowel = is_vowel(c);
        if vowel && !in_group {
            groups += 1;
        }
        in_group = vowel;
    }
    groups
}

fn is_english_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y')
}

fn is_consonant(c: Option<char>) -> bool {
    c.is_some_and(|c| c.is_alphabetic() && !is_english_vowel(c))
}

/// English: vowel groups with silent-e, `-ed` and `-ous` corrections.
pub fn english(word: &str) -> usize {
    let word = word.to_lowercase();
    let len = word.chars().count();
    if len == 0 {
        return 0;
    }
    if len <= 3 {
        return 1;
    }

    let chars: Vec<char> = word.chars().collect();
    let before = |suffix_len: usize| chars.len().checked_sub(suffix_len + 1).map(|i| chars[i]);

    let mut count = vowel_groups(&word, is_english_vowel) as i64;

    if word.ends_with('e') {
        count -= 1;
        // "table", "simple": the final syllable is the consonant + "le"
        if word.ends_with("le") && is_consonant(before(2)) {
            count += 1;
        }
    }
    if word.ends_with("ed") && is_consonant(before(2)) {
        count -= 1;
    }
    if word.ends_with("ous") {
        count -= 1;
    }

    count.max(1) as usize
}

fn is_spanish_vowel(c: char) -> bool {
    matches!(
        c,
        'a' | 'e' | 'i' | 'o' | 'u' | 'á' | 'é' | 'í' | 'ó' | 'ú'
    )
}

/// Spanish: vowel groups over accented vowels, with a diphthong correction
/// for `-ia`/`-io`/`-ía`/`-ío` endings.
pub fn spanish(word: &str) -> usize {
    let word = word.to_lowercase();
    if word.is_empty() {
        return 0;
    }

    let mut count = vowel_groups(&word, is_spanish_vowel) as i64;
    if ["ia", "io", "ía", "ío"]
        .iter()
        .any(|ending| word.ends_with(ending))
    {
        count -= 1;
    }

    count.max(1) as usize
}

/// Devanagari independent vowels (अ .. औ, plus ॠ ॡ)
fn is_devanagari_vowel(c: char) -> bool {
    matches!(c, '\u{0904}'..='\u{0914}' | '\u{0960}'..='\u{0961}')
}

/// Hindi: independent vowels are syllable nuclei; words written only with
/// consonants and vowel signs are estimated at one syllable per two characters.
pub fn hindi(word: &str) -> usize {
    let len = word.chars().count();
    if len == 0 {
        return 0;
    }

    let vowels = word.chars().filter(|&c| is_devanagari_vowel(c)).count();
    let count = if vowels > 0 { vowels } else { len.div_ceil(2) };

    count.max(1)
}
