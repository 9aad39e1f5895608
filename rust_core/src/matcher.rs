//! Crown ↔ API fixture linking.
//!
//! Every Crown fixture is scored against every API fixture:
//!
//! ```text
//! composite = w_time·time + w_league·league + w_home·home + w_away·away
//! time      = max(0, 1 − |Δminutes| / window)     (fixed constant if unknown)
//! name      = best similarity over alias variants of both sides
//! ```
//!
//! The best API fixture per Crown fixture is kept when its composite clears
//! the acceptance threshold. Crown fixtures are independent, so the outer
//! loop runs on the rayon pool and output order follows Crown input order.
//! An API fixture may be the best match of several Crown fixtures.

use crate::alias::{AliasIndex, AliasSnapshot};
use crate::config::MatcherConfig;
use crate::error::Result;
use crate::fixtures::{ingest_api, ingest_crown, ApiBatch, CrownBatch, SourceFixture};
use crate::kickoff::{minutes_apart, KickoffParser};
use crate::similarity::SimilarityEngine;
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Component scores of one Crown/API pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairScore {
    pub composite: f64,
    pub time_score: f64,
    pub league_score: f64,
    pub home_score: f64,
    pub away_score: f64,
    pub time_difference_minutes: Option<u32>,
}

/// Accepted link between one Crown fixture and one API fixture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchMapping {
    pub crown_id: String,
    pub api_match_id: String,
    pub similarity_score: f64,
    pub time_difference_minutes: Option<u32>,
    pub time_score: f64,
    pub league_score: f64,
    pub home_score: f64,
    pub away_score: f64,
    pub crown_league: String,
    pub crown_league_id: Option<String>,
    pub api_league: String,
    pub api_league_id: Option<String>,
    pub crown_home: String,
    pub crown_away: String,
    pub api_home: String,
    pub api_home_id: Option<String>,
    pub api_away: String,
    pub api_away_id: Option<String>,
    pub api_status: Option<String>,
}

/// Crown fixture left without an accepted link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmatchedFixture {
    pub id: String,
    pub league: String,
    pub league_id: Option<String>,
    pub home: String,
    pub away: String,
    pub datetime: Option<String>,
    pub source_show_type: Option<String>,
    /// Composite of the best candidate, 0 when there was none
    pub best_score: f64,
    pub best_candidate_id: Option<String>,
}

/// Result of matching one Crown set against one API set.
#[derive(Debug, Clone, Default)]
pub struct MatchRun {
    pub matches: Vec<MatchMapping>,
    pub unmatched: Vec<UnmatchedFixture>,
}

impl MatchRun {
    pub fn matched_count(&self) -> usize {
        self.matches.len()
    }

    pub fn unmatched_count(&self) -> usize {
        self.unmatched.len()
    }
}

/// Mapping document written for downstream consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingDocument {
    pub generated_at: DateTime<Utc>,
    pub source_generated_at: Option<DateTime<Utc>>,
    pub crown_count: usize,
    pub api_count: usize,
    pub matched_count: usize,
    pub unmatched_count: usize,
    pub matches: Vec<MatchMapping>,
    /// First unmatched Crown fixtures, capped at the report limit
    pub unmatched: Vec<UnmatchedFixture>,
}

/// Fixture with normalized variant lists computed once per run.
struct Prepared<'a> {
    fixture: &'a SourceFixture,
    league: Vec<String>,
    home: Vec<String>,
    away: Vec<String>,
}

/// Fixture matcher.
#[derive(Debug, Clone)]
pub struct FixtureMatcher {
    engine: SimilarityEngine,
    config: MatcherConfig,
    kickoff: KickoffParser,
}

impl FixtureMatcher {
    pub fn new(engine: SimilarityEngine, config: MatcherConfig) -> Result<Self> {
        let kickoff = KickoffParser::from_config(&config)?;
        Ok(Self {
            engine,
            config,
            kickoff,
        })
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    pub fn engine(&self) -> &SimilarityEngine {
        &self.engine
    }

    pub fn kickoff_parser(&self) -> &KickoffParser {
        &self.kickoff
    }

    /// Time score and absolute gap; the gap is `None` when either side is unknown.
    pub fn time_score(
        &self,
        crown: Option<DateTime<Utc>>,
        api: Option<DateTime<Utc>>,
    ) -> (f64, Option<u32>) {
        match (crown, api) {
            (Some(c), Some(a)) => {
                let minutes = minutes_apart(c, a);
                let score = (1.0 - minutes as f64 / self.config.time_window_minutes).max(0.0);
                (score, Some(minutes))
            }
            _ => (self.config.unknown_time_score, None),
        }
    }

    fn composite(&self, time: f64, league: f64, home: f64, away: f64) -> f64 {
        let w = &self.config.weights;
        let total = w.sum();
        if total <= 0.0 {
            return 0.0;
        }
        (w.time * time + w.league * league + w.home * home + w.away * away) / total
    }

    /// Normalized variants of a name plus any alternate spellings, deduplicated.
    fn side_variants(&self, name: &str, alternates: &[String], index: &AliasIndex) -> Vec<String> {
        let normalizer = self.engine.normalizer();
        let mut variants: Vec<String> = Vec::new();
        for candidate in std::iter::once(name).chain(alternates.iter().map(String::as_str)) {
            for variant in index.variants_normalized(&normalizer.normalize(candidate)) {
                if !variants.contains(&variant) {
                    variants.push(variant);
                }
            }
        }
        variants
    }

    fn prepare<'a>(&self, fixture: &'a SourceFixture, snapshot: &AliasSnapshot) -> Prepared<'a> {
        Prepared {
            fixture,
            league: self.side_variants(&fixture.league, &[], &snapshot.leagues),
            home: self.side_variants(&fixture.home, &fixture.home_alt, &snapshot.teams),
            away: self.side_variants(&fixture.away, &fixture.away_alt, &snapshot.teams),
        }
    }

    fn score_prepared(&self, crown: &Prepared<'_>, api: &Prepared<'_>) -> PairScore {
        let (time_score, time_difference_minutes) =
            self.time_score(crown.fixture.kickoff, api.fixture.kickoff);
        let league_score = self.engine.best_across(&crown.league, &api.league);
        let home_score = self.engine.best_across(&crown.home, &api.home);
        let away_score = self.engine.best_across(&crown.away, &api.away);
        PairScore {
            composite: self.composite(time_score, league_score, home_score, away_score),
            time_score,
            league_score,
            home_score,
            away_score,
            time_difference_minutes,
        }
    }

    /// Score a single pair.
    pub fn score_pair(
        &self,
        crown: &SourceFixture,
        api: &SourceFixture,
        snapshot: &AliasSnapshot,
    ) -> PairScore {
        self.score_prepared(&self.prepare(crown, snapshot), &self.prepare(api, snapshot))
    }

    /// Best candidate for one Crown fixture; ties keep the earliest API fixture.
    fn best_candidate<'a>(
        &self,
        crown: &Prepared<'_>,
        api: &'a [Prepared<'a>],
    ) -> Option<(&'a Prepared<'a>, PairScore)> {
        let mut best: Option<(&Prepared<'_>, PairScore)> = None;
        for candidate in api {
            let score = self.score_prepared(crown, candidate);
            let better = match &best {
                Some((_, current)) => score.composite > current.composite,
                None => true,
            };
            if better {
                best = Some((candidate, score));
            }
        }
        best
    }

    /// Link every Crown fixture to its best API fixture above the threshold.
    pub fn match_fixtures(
        &self,
        crown: &[SourceFixture],
        api: &[SourceFixture],
        snapshot: &AliasSnapshot,
    ) -> MatchRun {
        if api.is_empty() {
            warn!(
                "No API fixtures to match against; all {} Crown fixtures unmatched",
                crown.len()
            );
        }

        let api_prepared: Vec<Prepared<'_>> =
            api.iter().map(|f| self.prepare(f, snapshot)).collect();
        let threshold = self.config.acceptance_threshold;

        let outcomes: Vec<std::result::Result<MatchMapping, UnmatchedFixture>> = crown
            .par_iter()
            .map(|fixture| {
                let prepared = self.prepare(fixture, snapshot);
                match self.best_candidate(&prepared, &api_prepared) {
                    Some((candidate, score)) if score.composite >= threshold => {
                        debug!(
                            "Matched crown {} -> api {} ({:.3})",
                            fixture.id, candidate.fixture.id, score.composite
                        );
                        Ok(mapping(fixture, candidate.fixture, &score))
                    }
                    best => Err(UnmatchedFixture {
                        id: fixture.id.clone(),
                        league: fixture.league.clone(),
                        league_id: fixture.league_id.clone(),
                        home: fixture.home.clone(),
                        away: fixture.away.clone(),
                        datetime: fixture.kickoff_raw.clone(),
                        source_show_type: fixture.show_type.clone(),
                        best_score: best.as_ref().map(|(_, s)| s.composite).unwrap_or(0.0),
                        best_candidate_id: best.map(|(c, _)| c.fixture.id.clone()),
                    }),
                }
            })
            .collect();

        let mut run = MatchRun::default();
        for outcome in outcomes {
            match outcome {
                Ok(mapping) => run.matches.push(mapping),
                Err(unmatched) => run.unmatched.push(unmatched),
            }
        }

        info!(
            "Matched {}/{} Crown fixtures against {} API fixtures (threshold {:.2})",
            run.matched_count(),
            crown.len(),
            api.len(),
            threshold
        );
        run
    }

    /// Ingest both batches, match them and build the mapping document.
    ///
    /// `now` stamps the document and stands in for the Crown batch time when
    /// the batch has none.
    pub fn link_batches(
        &self,
        crown_batch: &CrownBatch,
        api_batch: &ApiBatch,
        snapshot: &AliasSnapshot,
        now: DateTime<Utc>,
    ) -> MappingDocument {
        let crown = ingest_crown(crown_batch, &self.kickoff, now);
        let api = ingest_api(api_batch);
        if crown.skipped > 0 || api.skipped > 0 {
            warn!(
                "Skipped invalid fixtures: {} Crown, {} API",
                crown.skipped, api.skipped
            );
        }

        let run = self.match_fixtures(&crown.fixtures, &api.fixtures, snapshot);
        MappingDocument {
            generated_at: now,
            source_generated_at: crown_batch.generated_at.or(api_batch.generated_at),
            crown_count: crown.fixtures.len(),
            api_count: api.fixtures.len(),
            matched_count: run.matched_count(),
            unmatched_count: run.unmatched_count(),
            matches: run.matches,
            unmatched: run
                .unmatched
                .into_iter()
                .take(self.config.unmatched_report_limit)
                .collect(),
        }
    }
}

fn mapping(crown: &SourceFixture, api: &SourceFixture, score: &PairScore) -> MatchMapping {
    MatchMapping {
        crown_id: crown.id.clone(),
        api_match_id: api.id.clone(),
        similarity_score: score.composite,
        time_difference_minutes: score.time_difference_minutes,
        time_score: score.time_score,
        league_score: score.league_score,
        home_score: score.home_score,
        away_score: score.away_score,
        crown_league: crown.league.clone(),
        crown_league_id: crown.league_id.clone(),
        api_league: api.league.clone(),
        api_league_id: api.league_id.clone(),
        crown_home: crown.home.clone(),
        crown_away: crown.away.clone(),
        api_home: api.home.clone(),
        api_home_id: api.home_id.clone(),
        api_away: api.away.clone(),
        api_away_id: api.away_id.clone(),
        api_status: api.status.clone(),
    }
}
