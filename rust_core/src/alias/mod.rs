//! League/team alias tables.
//!
//! This module provides:
//! - `CanonicalNameRecord`, the persisted multilingual name record
//! - `AliasIndex`, an immutable normalized-variant lookup per entity type
//! - `AliasStore` adapters (memory, JSON file) and the static seed table
//! - `AliasResolver`, the TTL-refreshed snapshot cache with mutations

mod index;
pub mod resolver;
pub mod seed;
pub mod store;

pub use index::{AliasIndex, AliasSnapshot};
pub use resolver::{AliasMutation, AliasResolver, ResolvedName};
pub use store::{AliasStore, JsonFileAliasStore, MemoryAliasStore};

use crate::normalize::Normalizer;
use crate::types::{EntityType, MatchSource};
use serde::{Deserialize, Serialize};

/// Canonical multilingual name record for one league or team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalNameRecord {
    pub canonical_key: String,
    #[serde(default)]
    pub name_en: Option<String>,
    #[serde(default)]
    pub name_zh_cn: Option<String>,
    #[serde(default)]
    pub name_zh_tw: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl CanonicalNameRecord {
    /// Name fields in display priority: Simplified, Traditional, English.
    pub fn name_fields(&self) -> impl Iterator<Item = &str> {
        [&self.name_zh_cn, &self.name_zh_tw, &self.name_en]
            .into_iter()
            .filter_map(non_empty)
    }

    /// First non-empty of English, Simplified, Traditional, first alias.
    pub fn primary_name(&self) -> Option<&str> {
        non_empty(&self.name_en)
            .or_else(|| non_empty(&self.name_zh_cn))
            .or_else(|| non_empty(&self.name_zh_tw))
            .or_else(|| {
                self.aliases
                    .iter()
                    .map(|a| a.trim())
                    .find(|a| !a.is_empty())
            })
    }

    pub fn has_any_name(&self) -> bool {
        self.primary_name().is_some()
    }

    /// Simplified Chinese > Traditional Chinese > English > `raw`.
    pub fn display_name(&self, raw: &str) -> String {
        self.name_fields()
            .next()
            .map(str::to_string)
            .unwrap_or_else(|| raw.to_string())
    }

    /// Key derived from the primary name, used when none was assigned.
    pub fn derived_key(&self, entity_type: EntityType, normalizer: &Normalizer) -> String {
        entity_type.canonical_key(&normalizer.normalize_opt(self.primary_name()))
    }

    /// Every normalized spelling that should resolve to this record.
    pub fn alias_set(&self, normalizer: &Normalizer) -> AliasSet {
        let mut set = AliasSet::default();
        for name in self.name_fields() {
            set.insert(normalizer.normalize(name), MatchSource::Canonical);
        }
        for alias in &self.aliases {
            set.insert(normalizer.normalize(alias), MatchSource::Alias);
        }
        set
    }
}

/// Normalized variants of one record, each tagged with where it came from.
///
/// A string present both as a name field and as an alias is tagged
/// `Canonical`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasSet {
    entries: Vec<(String, MatchSource)>,
}

impl AliasSet {
    fn insert(&mut self, normalized: String, source: MatchSource) {
        if normalized.is_empty() {
            return;
        }
        match self.entries.iter_mut().find(|(n, _)| *n == normalized) {
            Some(existing) => {
                if source == MatchSource::Canonical {
                    existing.1 = MatchSource::Canonical;
                }
            }
            None => self.entries.push((normalized, source)),
        }
    }

    pub fn contains(&self, normalized: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == normalized)
    }

    pub fn source_of(&self, normalized: &str) -> Option<MatchSource> {
        self.entries
            .iter()
            .find(|(n, _)| n == normalized)
            .map(|(_, s)| *s)
    }

    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn entries(&self) -> &[(String, MatchSource)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
