//! Tunable parameters for normalization, scoring and alias caching.
//!
//! Every struct carries the reference values in its `Default` impl and can be
//! overridden from the environment with `from_env_with_defaults`.

use crate::error::{LinkError, Result};
use std::env;
use std::time::Duration;

/// Organizational tokens dropped during normalization.
pub const DEFAULT_STOP_WORDS: &[&str] = &[
    "fc", "cf", "afc", "sc", "ac", "cd", "sv", "fk", "sk", "club", // club/society abbreviations
    "reserves", "reserve", "res", "youth", "u19", "u20", "u21", "u23", // reserve and youth sides
    "ii", "iii", "b", "c", // B/C squads
];

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Normalizer configuration
#[derive(Debug, Clone)]
pub struct NormalizerConfig {
    /// Lowercase whole-token stop list
    pub stop_words: Vec<String>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            stop_words: DEFAULT_STOP_WORDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl NormalizerConfig {
    pub fn from_env_with_defaults(defaults: Self) -> Self {
        let stop_words = env::var("LINK_STOP_WORDS")
            .ok()
            .map(|v| {
                v.split(',')
                    .map(|w| w.trim().to_lowercase())
                    .filter(|w| !w.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|words| !words.is_empty())
            .unwrap_or(defaults.stop_words);
        Self { stop_words }
    }
}

/// Similarity engine configuration
#[derive(Debug, Clone)]
pub struct SimilarityConfig {
    /// Character n-gram length for the Jaccard signal
    pub ngram_size: usize,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self { ngram_size: 3 }
    }
}

impl SimilarityConfig {
    pub fn from_env_with_defaults(defaults: Self) -> Self {
        Self {
            ngram_size: env_parse("LINK_NGRAM_SIZE").unwrap_or(defaults.ngram_size),
        }
    }
}

/// Weights of the composite fixture score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub time: f64,
    pub league: f64,
    pub home: f64,
    pub away: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            time: 0.2,
            league: 0.2,
            home: 0.3,
            away: 0.3,
        }
    }
}

impl ScoreWeights {
    /// Parse `"time,league,home,away"`.
    pub fn parse(value: &str) -> Option<Self> {
        let parts: Vec<f64> = value
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<std::result::Result<_, _>>()
            .ok()?;
        match parts.as_slice() {
            [time, league, home, away] => Some(Self {
                time: *time,
                league: *league,
                home: *home,
                away: *away,
            }),
            _ => None,
        }
    }

    pub fn sum(&self) -> f64 {
        self.time + self.league + self.home + self.away
    }
}

/// Match orchestrator configuration
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// Minimum composite score for a pair to be emitted as matched
    pub acceptance_threshold: f64,
    pub weights: ScoreWeights,
    /// Kickoff gap at which the time score reaches zero
    pub time_window_minutes: f64,
    /// Time score used when either side has no usable kickoff
    pub unknown_time_score: f64,
    /// Gap beyond which a yearless Crown date is moved to the adjacent year
    pub year_shift_days: i64,
    /// Fixed UTC offset of the Crown site clock
    pub crown_utc_offset_minutes: i32,
    /// Unmatched Crown fixtures listed in the mapping document
    pub unmatched_report_limit: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            acceptance_threshold: 0.55,
            weights: ScoreWeights::default(),
            time_window_minutes: 240.0,
            unknown_time_score: 0.3,
            year_shift_days: 183,
            crown_utc_offset_minutes: -240, // GMT-4
            unmatched_report_limit: 50,
        }
    }
}

impl MatcherConfig {
    /// Looser threshold used when calibrating against labelled batches
    pub fn calibration() -> Self {
        Self {
            acceptance_threshold: 0.48,
            ..Default::default()
        }
    }

    pub fn from_env_with_defaults(defaults: Self) -> Self {
        Self {
            acceptance_threshold: env_parse("LINK_ACCEPTANCE_THRESHOLD")
                .unwrap_or(defaults.acceptance_threshold),
            weights: env::var("LINK_WEIGHTS")
                .ok()
                .and_then(|v| ScoreWeights::parse(&v))
                .unwrap_or(defaults.weights),
            time_window_minutes: env_parse("LINK_TIME_WINDOW_MINUTES")
                .unwrap_or(defaults.time_window_minutes),
            unknown_time_score: env_parse("LINK_UNKNOWN_TIME_SCORE")
                .unwrap_or(defaults.unknown_time_score),
            year_shift_days: env_parse("LINK_YEAR_SHIFT_DAYS").unwrap_or(defaults.year_shift_days),
            crown_utc_offset_minutes: env_parse("LINK_CROWN_UTC_OFFSET_MINUTES")
                .unwrap_or(defaults.crown_utc_offset_minutes),
            unmatched_report_limit: env_parse("LINK_UNMATCHED_LIMIT")
                .unwrap_or(defaults.unmatched_report_limit),
        }
    }
}

/// Alias resolver configuration
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// How long a loaded alias snapshot is served before reloading
    pub cache_ttl: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(60),
        }
    }
}

impl ResolverConfig {
    pub fn from_env_with_defaults(defaults: Self) -> Self {
        Self {
            cache_ttl: env_parse("ALIAS_CACHE_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.cache_ttl),
        }
    }
}

/// Complete linker configuration
#[derive(Debug, Clone, Default)]
pub struct LinkerConfig {
    pub normalizer: NormalizerConfig,
    pub similarity: SimilarityConfig,
    pub matcher: MatcherConfig,
    pub resolver: ResolverConfig,
}

impl LinkerConfig {
    /// Load every section from the environment, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        let config = Self {
            normalizer: NormalizerConfig::from_env_with_defaults(NormalizerConfig::default()),
            similarity: SimilarityConfig::from_env_with_defaults(SimilarityConfig::default()),
            matcher: MatcherConfig::from_env_with_defaults(MatcherConfig::default()),
            resolver: ResolverConfig::from_env_with_defaults(ResolverConfig::default()),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let m = &self.matcher;
        if !(0.0..=1.0).contains(&m.acceptance_threshold) {
            return Err(LinkError::Config(format!(
                "acceptance threshold must be within [0, 1], got {}",
                m.acceptance_threshold
            )));
        }
        let w = &m.weights;
        if [w.time, w.league, w.home, w.away].iter().any(|v| *v < 0.0 || !v.is_finite()) {
            return Err(LinkError::Config(format!("weights must be non-negative: {:?}", w)));
        }
        if w.sum() <= 0.0 {
            return Err(LinkError::Config("weights must not all be zero".to_string()));
        }
        if m.time_window_minutes <= 0.0 {
            return Err(LinkError::Config(format!(
                "time window must be positive, got {}",
                m.time_window_minutes
            )));
        }
        if !(0.0..=1.0).contains(&m.unknown_time_score) {
            return Err(LinkError::Config(format!(
                "unknown time score must be within [0, 1], got {}",
                m.unknown_time_score
            )));
        }
        if self.similarity.ngram_size == 0 {
            return Err(LinkError::Config("n-gram size must be at least 1".to_string()));
        }
        Ok(())
    }
}
