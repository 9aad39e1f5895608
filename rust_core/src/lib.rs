//! Fixture Linker Core - cross-source sports fixture record linkage.
//!
//! This module provides:
//! - Multilingual name normalization (diacritics, full-width, CJK transliteration)
//! - Bounded string similarity from four complementary signals
//! - League/team alias tables with a TTL-refreshed snapshot cache
//! - Crown ↔ odds-API fixture matching with weighted name/time fusion
//! - Alias store adapters: in-memory, JSON file, PostgreSQL
//! - Batch matching parallelized via rayon

pub mod alias;
pub mod config;
pub mod db;
pub mod error;
pub mod fixtures;
pub mod kickoff;
pub mod linker;
pub mod matcher;
pub mod normalize;
pub mod similarity;
mod types;

pub use alias::{
    AliasIndex, AliasMutation, AliasResolver, AliasSnapshot, AliasStore, CanonicalNameRecord,
    JsonFileAliasStore, MemoryAliasStore, ResolvedName,
};
pub use config::{
    LinkerConfig, MatcherConfig, NormalizerConfig, ResolverConfig, ScoreWeights, SimilarityConfig,
};
pub use db::PgAliasStore;
pub use error::{LinkError, Result};
pub use fixtures::{ApiBatch, ApiFixture, CrownBatch, CrownFixture, SourceFixture};
pub use linker::FixtureLinker;
pub use matcher::{
    FixtureMatcher, MappingDocument, MatchMapping, MatchRun, PairScore, UnmatchedFixture,
};
pub use normalize::Normalizer;
pub use similarity::{SimilarityBreakdown, SimilarityEngine};
pub use types::*;
