//! Bounded string similarity over normalized names.
//!
//! Four complementary signals are computed and the strongest one wins:
//! exact match, containment (abbreviation by prefix/suffix), character n-gram
//! Jaccard, and normalized Levenshtein distance. A single strong signal must
//! not be diluted by several weak ones, so signals are never averaged.

use crate::alias::AliasIndex;
use crate::config::SimilarityConfig;
use crate::normalize::Normalizer;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use strsim::normalized_levenshtein;

/// Base score awarded when one name contains the other
const CONTAINMENT_BASE: f64 = 0.85;
/// Extra score scaled by the length ratio of contained/containing names
const CONTAINMENT_SPAN: f64 = 0.15;

/// Per-signal scores for one comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimilarityBreakdown {
    pub exact: f64,
    pub containment: f64,
    pub ngram_jaccard: f64,
    pub edit: f64,
}

impl SimilarityBreakdown {
    pub fn best(&self) -> f64 {
        self.exact
            .max(self.containment)
            .max(self.ngram_jaccard)
            .max(self.edit)
            .clamp(0.0, 1.0)
    }
}

/// Similarity engine bound to a normalizer and n-gram length.
#[derive(Debug, Clone)]
pub struct SimilarityEngine {
    normalizer: Normalizer,
    ngram_size: usize,
}

impl Default for SimilarityEngine {
    fn default() -> Self {
        Self::new(Normalizer::default(), &SimilarityConfig::default())
    }
}

impl SimilarityEngine {
    pub fn new(normalizer: Normalizer, config: &SimilarityConfig) -> Self {
        Self {
            normalizer,
            ngram_size: config.ngram_size.max(1),
        }
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Similarity of two raw names in [0, 1].
    pub fn similarity(&self, a: &str, b: &str) -> f64 {
        let a = self.normalizer.normalize(a);
        let b = self.normalizer.normalize(b);
        self.score_normalized(&a, &b)
    }

    /// Similarity of two already-normalized keys.
    pub fn score_normalized(&self, a: &str, b: &str) -> f64 {
        self.breakdown_normalized(a, b).best()
    }

    /// All four signals for two already-normalized keys.
    pub fn breakdown_normalized(&self, a: &str, b: &str) -> SimilarityBreakdown {
        if a.is_empty() || b.is_empty() {
            return SimilarityBreakdown::default();
        }
        if a == b {
            return SimilarityBreakdown {
                exact: 1.0,
                containment: 1.0,
                ngram_jaccard: 1.0,
                edit: 1.0,
            };
        }

        SimilarityBreakdown {
            exact: 0.0,
            containment: containment_score(a, b),
            ngram_jaccard: ngram_jaccard(a, b, self.ngram_size),
            edit: normalized_levenshtein(a, b),
        }
    }

    /// Best similarity over the cartesian product of both names' variants.
    ///
    /// Variants come from the alias index, so "Spurs" and "Tottenham Hotspur"
    /// compare through their shared record even though their raw edit
    /// distance is large.
    pub fn similarity_across_variants(&self, name1: &str, name2: &str, index: &AliasIndex) -> f64 {
        let v1 = self.normalizer.variants_of(name1, index);
        let v2 = self.normalizer.variants_of(name2, index);
        self.best_across(&v1, &v2)
    }

    /// Maximum pairwise score between two pre-expanded variant lists.
    pub fn best_across(&self, left: &[String], right: &[String]) -> f64 {
        let mut best = 0.0_f64;
        for a in left {
            for b in right {
                let score = self.score_normalized(a, b);
                if score > best {
                    best = score;
                    if best >= 1.0 {
                        return 1.0;
                    }
                }
            }
        }
        best
    }
}

/// `0.85 + 0.15 * shorter/longer` when one key contains the other.
fn containment_score(a: &str, b: &str) -> f64 {
    let (shorter, longer) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    if !longer.contains(shorter) {
        return 0.0;
    }
    let ratio = shorter.chars().count() as f64 / longer.chars().count() as f64;
    CONTAINMENT_BASE + CONTAINMENT_SPAN * ratio
}

/// Jaccard index over overlapping character n-grams.
///
/// A key shorter than `n` contributes itself as its only gram.
pub fn ngram_jaccard(a: &str, b: &str, n: usize) -> f64 {
    let n = n.max(1);
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    if a_chars.is_empty() || b_chars.is_empty() {
        return 0.0;
    }

    let a_grams = grams(&a_chars, n);
    let b_grams = grams(&b_chars, n);

    let intersection = a_grams.intersection(&b_grams).count();
    let union = a_grams.union(&b_grams).count();
    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}

fn grams(chars: &[char], n: usize) -> FxHashSet<&[char]> {
    if chars.len() < n {
        let mut set = FxHashSet::default();
        set.insert(chars);
        return set;
    }
    chars.windows(n).collect()
}
