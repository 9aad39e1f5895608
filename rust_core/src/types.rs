//! Shared enums for entity kinds and resolution outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of named entity the alias tables hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    League,
    Team,
}

impl EntityType {
    pub const ALL: [EntityType; 2] = [EntityType::League, EntityType::Team];

    /// Prefix used in canonical keys (`"league:..."`, `"team:..."`).
    pub fn key_prefix(&self) -> &'static str {
        match self {
            EntityType::League => "league",
            EntityType::Team => "team",
        }
    }

    /// Backing table in the external alias store.
    pub fn table_name(&self) -> &'static str {
        match self {
            EntityType::League => "league_aliases",
            EntityType::Team => "team_aliases",
        }
    }

    /// Build a canonical key from an already-normalized name.
    pub fn canonical_key(&self, normalized: &str) -> String {
        if normalized.is_empty() {
            format!("{}:unknown", self.key_prefix())
        } else {
            format!("{}:{}", self.key_prefix(), normalized)
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key_prefix())
    }
}

/// How a raw name was resolved against the alias index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchSource {
    /// One of the record's name fields matched.
    Canonical,
    /// Only an alias string matched.
    Alias,
    /// No record matched; the key was synthesized.
    Fallback,
}

/// Which feed a fixture came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixtureSource {
    Crown,
    Api,
}
