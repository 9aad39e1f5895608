//! Name normalization for cross-source comparison.
//!
//! This module provides:
//! - Diacritic and full-width folding (NFKD + combining-mark removal)
//! - CJK transliteration to a tone-free Latin phonetic key
//! - Whole-token removal of organizational suffixes ("FC", "reserves", "II")
//! - Compaction to a lowercase alphanumeric key
//!
//! `Normalizer::normalize` is idempotent and never fails.

use crate::alias::AliasIndex;
use crate::config::NormalizerConfig;
use rustc_hash::FxHashSet;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Normalizer with a configured stop list.
#[derive(Debug, Clone)]
pub struct Normalizer {
    stop_words: FxHashSet<String>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(&NormalizerConfig::default())
    }
}

impl Normalizer {
    pub fn new(config: &NormalizerConfig) -> Self {
        Self {
            stop_words: config
                .stop_words
                .iter()
                .map(|w| compact_token(&w.to_lowercase()))
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    /// Normalize a free-text name into its comparison key.
    pub fn normalize(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return String::new();
        }

        // NFKC keeps Hangul syllables and voiced kana whole for transliteration
        let composed: String = text.nfkc().collect();
        let mut tokens: Vec<Token> = Vec::new();
        for word in composed.split_whitespace() {
            split_word(word, &mut tokens);
        }
        let tokens = merge_initials(tokens);

        let kept: Vec<&str> = tokens
            .iter()
            .filter(|t| !self.stop_words.contains(t.as_str()))
            .map(String::as_str)
            .collect();

        // A name made only of stop words keeps them all ("FC" stays "fc").
        if kept.is_empty() {
            tokens.concat()
        } else {
            kept.concat()
        }
    }

    /// Normalize an optional field; `None` yields an empty key.
    pub fn normalize_opt(&self, text: Option<&str>) -> String {
        text.map(|t| self.normalize(t)).unwrap_or_default()
    }

    pub fn is_stop_word(&self, token: &str) -> bool {
        self.stop_words.contains(token)
    }

    /// Normalized candidates for one name: the name itself plus every other
    /// spelling of the alias record it belongs to, if any.
    pub fn variants_of(&self, name: &str, index: &AliasIndex) -> Vec<String> {
        index.variants_normalized(&self.normalize(name))
    }
}

/// One token before stop-word filtering.
struct Token {
    text: String,
    /// Single Latin-script letter, e.g. the "A" of "A. C. Milan"
    initial: bool,
}

/// Compatibility-decompose and drop combining marks ("São" -> "Sao", "Ｊ２" -> "J2").
fn fold_marks(text: &str) -> String {
    text.nfkd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Split one whitespace-delimited word into tokens: each CJK character
/// becomes its Latin syllable, the text between them is folded and compacted.
fn split_word(word: &str, tokens: &mut Vec<Token>) {
    let mut pending = String::new();
    for c in word.chars() {
        if is_cjk(c) {
            push_latin(&pending, tokens);
            pending.clear();
            if let Some(syllable) = deunicode::deunicode_char(c) {
                let text = compact_token(&syllable.to_lowercase());
                if !text.is_empty() {
                    tokens.push(Token {
                        text,
                        initial: false,
                    });
                }
            }
        } else {
            pending.push(c);
        }
    }
    push_latin(&pending, tokens);
}

fn push_latin(chunk: &str, tokens: &mut Vec<Token>) {
    let text = compact_token(&fold_marks(chunk).to_lowercase());
    if text.is_empty() {
        return;
    }
    let mut chars = text.chars();
    let initial = matches!((chars.next(), chars.next()), (Some(c), None) if c.is_alphabetic());
    tokens.push(Token { text, initial });
}

/// Join runs of two or more initials, so "A. C. Milan" reads like "AC Milan".
fn merge_initials(tokens: Vec<Token>) -> Vec<String> {
    let mut merged = Vec::with_capacity(tokens.len());
    let mut run = String::new();
    for token in tokens {
        if token.initial {
            run.push_str(&token.text);
            continue;
        }
        if !run.is_empty() {
            merged.push(std::mem::take(&mut run));
        }
        merged.push(token.text);
    }
    if !run.is_empty() {
        merged.push(run);
    }
    merged
}

/// Keep only alphanumeric characters of a single token.
fn compact_token(token: &str) -> String {
    token
        .chars()
        .filter(|c| c.is_alphanumeric() && !is_combining_mark(*c))
        .collect()
}

/// Han ideographs, kana and Hangul.
///
/// Simplified and Traditional forms of a character share a syllable, so
/// "热刺" and "熱刺" transliterate identically.
pub fn is_cjk(c: char) -> bool {
    matches!(
        c as u32,
        0x1100..=0x11FF       // Hangul Jamo
            | 0x3040..=0x30FF // Hiragana, Katakana
            | 0x3130..=0x318F // Hangul Compatibility Jamo
            | 0x3400..=0x4DBF // CJK Extension A
            | 0x4E00..=0x9FFF // CJK Unified Ideographs
            | 0xAC00..=0xD7AF // Hangul syllables
            | 0xF900..=0xFAFF // CJK Compatibility Ideographs
            | 0x20000..=0x2A6DF // CJK Extension B
    )
}

pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(is_cjk)
}
