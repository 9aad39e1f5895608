use super::{AliasSet, CanonicalNameRecord};
use crate::alias::resolver::ResolvedName;
use crate::normalize::Normalizer;
use crate::types::{EntityType, MatchSource};
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

/// Immutable lookup from normalized spelling to canonical record.
///
/// When two records claim the same spelling, the record loaded first keeps
/// it. Within a record, a name-field claim beats an alias claim.
#[derive(Debug, Clone)]
pub struct AliasIndex {
    entity_type: EntityType,
    records: Vec<CanonicalNameRecord>,
    alias_sets: Vec<AliasSet>,
    /// normalized spelling -> (record position, how it matched)
    lookup: FxHashMap<String, (usize, MatchSource)>,
}

impl AliasIndex {
    pub fn empty(entity_type: EntityType) -> Self {
        Self {
            entity_type,
            records: Vec::new(),
            alias_sets: Vec::new(),
            lookup: FxHashMap::default(),
        }
    }

    /// Build the index from records in load order.
    ///
    /// Records without any name are skipped; records with a blank key get one
    /// derived from their primary name.
    pub fn build(
        entity_type: EntityType,
        records: Vec<CanonicalNameRecord>,
        normalizer: &Normalizer,
    ) -> Self {
        let mut index = Self::empty(entity_type);

        for mut record in records {
            if !record.has_any_name() {
                warn!(
                    "Skipping {} record '{}' with no name fields",
                    entity_type, record.canonical_key
                );
                continue;
            }
            if record.canonical_key.trim().is_empty() {
                record.canonical_key = record.derived_key(entity_type, normalizer);
            }

            let position = index.records.len();
            let alias_set = record.alias_set(normalizer);
            for (normalized, source) in alias_set.entries() {
                index
                    .lookup
                    .entry(normalized.clone())
                    .or_insert((position, *source));
            }
            index.records.push(record);
            index.alias_sets.push(alias_set);
        }

        debug!(
            "Built {} alias index: {} records, {} spellings",
            entity_type,
            index.records.len(),
            index.lookup.len()
        );
        index
    }

    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    pub fn records(&self) -> &[CanonicalNameRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record owning a normalized spelling, and how it matched.
    pub fn lookup(&self, normalized: &str) -> Option<(&CanonicalNameRecord, MatchSource)> {
        self.lookup
            .get(normalized)
            .map(|(pos, source)| (&self.records[*pos], *source))
    }

    pub fn alias_set_for(&self, normalized: &str) -> Option<&AliasSet> {
        self.lookup
            .get(normalized)
            .map(|(pos, _)| &self.alias_sets[*pos])
    }

    pub fn find_by_key(&self, canonical_key: &str) -> Option<&CanonicalNameRecord> {
        self.records.iter().find(|r| r.canonical_key == canonical_key)
    }

    /// The normalized key itself followed by every other spelling of the
    /// record it belongs to.
    pub fn variants_normalized(&self, normalized: &str) -> Vec<String> {
        if normalized.is_empty() {
            return Vec::new();
        }
        let mut variants = vec![normalized.to_string()];
        if let Some(set) = self.alias_set_for(normalized) {
            variants.extend(
                set.members()
                    .filter(|m| *m != normalized)
                    .map(str::to_string),
            );
        }
        variants
    }

    /// Resolve a raw name to its canonical key and display name.
    pub fn resolve(&self, raw: &str, normalizer: &Normalizer) -> ResolvedName {
        let normalized = normalizer.normalize(raw);
        match self.lookup(&normalized) {
            Some((record, source)) => ResolvedName {
                canonical_key: record.canonical_key.clone(),
                display_name: record.display_name(raw),
                match_source: source,
                raw: raw.to_string(),
            },
            None => ResolvedName {
                canonical_key: self.entity_type.canonical_key(&normalized),
                display_name: raw.to_string(),
                match_source: MatchSource::Fallback,
                raw: raw.to_string(),
            },
        }
    }
}

/// League and team indexes loaded together from one store read.
#[derive(Debug, Clone)]
pub struct AliasSnapshot {
    pub leagues: AliasIndex,
    pub teams: AliasIndex,
}

impl Default for AliasSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

impl AliasSnapshot {
    pub fn empty() -> Self {
        Self {
            leagues: AliasIndex::empty(EntityType::League),
            teams: AliasIndex::empty(EntityType::Team),
        }
    }

    pub fn build(
        leagues: Vec<CanonicalNameRecord>,
        teams: Vec<CanonicalNameRecord>,
        normalizer: &Normalizer,
    ) -> Self {
        Self {
            leagues: AliasIndex::build(EntityType::League, leagues, normalizer),
            teams: AliasIndex::build(EntityType::Team, teams, normalizer),
        }
    }

    pub fn index(&self, entity_type: EntityType) -> &AliasIndex {
        match entity_type {
            EntityType::League => &self.leagues,
            EntityType::Team => &self.teams,
        }
    }

    pub fn resolve(
        &self,
        raw: &str,
        entity_type: EntityType,
        normalizer: &Normalizer,
    ) -> ResolvedName {
        self.index(entity_type).resolve(raw, normalizer)
    }
}
