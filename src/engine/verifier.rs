//! Free-text answer verification: exact match after normalization, else
//! Levenshtein similarity against a per-exercise threshold. Pure functions,
//! no session state.

use icu_normalizer::ComposingNormalizer;

/// Punctuation stripped before comparison. Includes the Spanish inverted
/// marks so "¿Dónde está?" and "donde esta" normalize the same way apart
/// from accents (which NFC keeps; accents are part of spelling).
const STRIP_PUNCTUATION: &[char] = &[
    '.', ',', '!', '?', ';', ':', '"', '\'', '(', ')', '¿', '¡', '-', '…',
];

/// Lowercase, NFC-compose, strip punctuation, collapse whitespace, trim.
/// Both sides of every comparison go through this identically.
pub fn normalize(text: &str) -> String {
    let composed = ComposingNormalizer::new_nfc().normalize(text);
    let stripped: String = composed
        .to_lowercase()
        .chars()
        .filter(|c| !STRIP_PUNCTUATION.contains(c))
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Classic Levenshtein distance, unit cost for insert/delete/substitute.
/// Two-row rolling buffer; operates on chars, not bytes.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0usize; b_chars.len() + 1];

    for (i, &ca) in a_chars.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b_chars.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_chars.len()]
}

/// Similarity ratio in [0, 1]: `(max_len - distance) / max_len`.
/// Two empty strings are identical (1.0); one empty side scores 0.
pub fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    (max_len - levenshtein(a, b)) as f64 / max_len as f64
}

/// Judge a user answer. Exact (normalized) match against the canonical
/// answer or any alternate wins outright; otherwise fuzzy similarity against
/// the canonical answer must reach `threshold`.
pub fn is_correct(user: &str, canonical: &str, alternates: &[String], threshold: f64) -> bool {
    let user_n = normalize(user);
    let canonical_n = normalize(canonical);
    if user_n == canonical_n {
        return true;
    }
    if alternates.iter().any(|alt| user_n == normalize(alt)) {
        return true;
    }
    similarity(&user_n, &canonical_n) >= threshold
}
