//! Alias store boundary and the non-database adapters.
//!
//! This module provides:
//! - The `AliasStore` trait the resolver reads from and writes through
//! - `MemoryAliasStore` for tests and seeded offline runs
//! - `JsonFileAliasStore` with JSON persistence (`{"leagues": [...], "teams": [...]}`)

use super::seed;
use super::CanonicalNameRecord;
use crate::error::Result;
use crate::types::EntityType;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Persistent source of canonical name records.
///
/// Implementations return records in a stable order; the alias index gives
/// earlier records priority on spelling collisions.
#[async_trait]
pub trait AliasStore: Send + Sync {
    /// All records of one entity type.
    async fn load(&self, entity_type: EntityType) -> Result<Vec<CanonicalNameRecord>>;

    /// Insert or replace the record with the same canonical key.
    async fn upsert(&self, entity_type: EntityType, record: &CanonicalNameRecord) -> Result<()>;

    /// Remove a record. Returns whether it existed.
    async fn delete(&self, entity_type: EntityType, canonical_key: &str) -> Result<bool>;

    /// Store name for logging
    fn store_name(&self) -> &str;
}

fn upsert_in_place(records: &mut Vec<CanonicalNameRecord>, record: &CanonicalNameRecord) {
    match records
        .iter_mut()
        .find(|r| r.canonical_key == record.canonical_key)
    {
        Some(existing) => *existing = record.clone(),
        None => records.push(record.clone()),
    }
}

fn remove_by_key(records: &mut Vec<CanonicalNameRecord>, canonical_key: &str) -> bool {
    let before = records.len();
    records.retain(|r| r.canonical_key != canonical_key);
    records.len() != before
}

// ============================================================================
// In-memory store
// ============================================================================

/// In-memory alias store.
#[derive(Debug, Default)]
pub struct MemoryAliasStore {
    leagues: RwLock<Vec<CanonicalNameRecord>>,
    teams: RwLock<Vec<CanonicalNameRecord>>,
}

impl MemoryAliasStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with the built-in seed table.
    pub fn with_seed() -> Self {
        Self::with_records(
            seed::seed_records(EntityType::League),
            seed::seed_records(EntityType::Team),
        )
    }

    pub fn with_records(
        leagues: Vec<CanonicalNameRecord>,
        teams: Vec<CanonicalNameRecord>,
    ) -> Self {
        Self {
            leagues: RwLock::new(leagues),
            teams: RwLock::new(teams),
        }
    }

    fn table(&self, entity_type: EntityType) -> &RwLock<Vec<CanonicalNameRecord>> {
        match entity_type {
            EntityType::League => &self.leagues,
            EntityType::Team => &self.teams,
        }
    }

    pub fn len(&self, entity_type: EntityType) -> usize {
        self.table(entity_type).read().len()
    }
}

#[async_trait]
impl AliasStore for MemoryAliasStore {
    async fn load(&self, entity_type: EntityType) -> Result<Vec<CanonicalNameRecord>> {
        Ok(self.table(entity_type).read().clone())
    }

    async fn upsert(&self, entity_type: EntityType, record: &CanonicalNameRecord) -> Result<()> {
        upsert_in_place(&mut self.table(entity_type).write(), record);
        Ok(())
    }

    async fn delete(&self, entity_type: EntityType, canonical_key: &str) -> Result<bool> {
        Ok(remove_by_key(&mut self.table(entity_type).write(), canonical_key))
    }

    fn store_name(&self) -> &str {
        "memory"
    }
}

// ============================================================================
// JSON file store
// ============================================================================

#[derive(Debug, Default, Serialize, Deserialize)]
struct AliasFile {
    #[serde(default)]
    leagues: Vec<CanonicalNameRecord>,
    #[serde(default)]
    teams: Vec<CanonicalNameRecord>,
}

impl AliasFile {
    fn table_mut(&mut self, entity_type: EntityType) -> &mut Vec<CanonicalNameRecord> {
        match entity_type {
            EntityType::League => &mut self.leagues,
            EntityType::Team => &mut self.teams,
        }
    }
}

/// Alias store persisted as one JSON document.
///
/// A missing file reads as an empty store; a malformed file is an error so
/// the resolver keeps its last good snapshot instead of wiping it.
#[derive(Debug)]
pub struct JsonFileAliasStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles
    write_lock: Mutex<()>,
}

impl JsonFileAliasStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_file(&self) -> Result<AliasFile> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Alias file {} not found, starting empty", self.path.display());
                Ok(AliasFile::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn write_file(&self, file: &AliasFile) -> Result<()> {
        let content = serde_json::to_string_pretty(file)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Write the built-in seed table if the file does not exist yet.
    pub async fn seed_if_missing(&self) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        if tokio::fs::try_exists(&self.path).await? {
            return Ok(false);
        }
        let file = AliasFile {
            leagues: seed::seed_records(EntityType::League),
            teams: seed::seed_records(EntityType::Team),
        };
        self.write_file(&file).await?;
        info!(
            "Seeded alias file {} ({} leagues, {} teams)",
            self.path.display(),
            file.leagues.len(),
            file.teams.len()
        );
        Ok(true)
    }
}

#[async_trait]
impl AliasStore for JsonFileAliasStore {
    async fn load(&self, entity_type: EntityType) -> Result<Vec<CanonicalNameRecord>> {
        let mut file = self.read_file().await?;
        Ok(std::mem::take(file.table_mut(entity_type)))
    }

    async fn upsert(&self, entity_type: EntityType, record: &CanonicalNameRecord) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut file = self.read_file().await?;
        upsert_in_place(file.table_mut(entity_type), record);
        self.write_file(&file).await
    }

    async fn delete(&self, entity_type: EntityType, canonical_key: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut file = self.read_file().await?;
        let removed = remove_by_key(file.table_mut(entity_type), canonical_key);
        if removed {
            self.write_file(&file).await?;
        }
        Ok(removed)
    }

    fn store_name(&self) -> &str {
        "json_file"
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LinkError;

    fn record(key: &str, en: &str) -> CanonicalNameRecord {
        CanonicalNameRecord {
            canonical_key: key.to_string(),
            name_en: Some(en.to_string()),
            name_zh_cn: None,
            name_zh_tw: None,
            aliases: vec![],
        }
    }

    #[tokio::test]
    async fn test_memory_upsert_replaces_by_key() {
        let store = MemoryAliasStore::new();
        store.upsert(EntityType::Team, &record("team:a", "A")).await.unwrap();
        store.upsert(EntityType::Team, &record("team:b", "B")).await.unwrap();
        store.upsert(EntityType::Team, &record("team:a", "A2")).await.unwrap();

        let teams = store.load(EntityType::Team).await.unwrap();
        assert_eq!(teams.len(), 2);
        assert_eq!(teams[0].name_en.as_deref(), Some("A2"));
        assert!(store.load(EntityType::League).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_memory_delete() {
        let store = MemoryAliasStore::new();
        store.upsert(EntityType::League, &record("league:x", "X")).await.unwrap();
        assert!(store.delete(EntityType::League, "league:x").await.unwrap());
        assert!(!store.delete(EntityType::League, "league:x").await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_seed_not_empty() {
        let store = MemoryAliasStore::with_seed();
        assert!(store.len(EntityType::League) > 0);
        assert!(store.len(EntityType::Team) > 0);
    }

    #[tokio::test]
    async fn test_json_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileAliasStore::new(dir.path().join("aliases.json"));
        assert!(store.load(EntityType::Team).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_json_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aliases.json");

        let store = JsonFileAliasStore::new(&path);
        store.upsert(EntityType::Team, &record("team:arsenal", "Arsenal")).await.unwrap();
        store.upsert(EntityType::League, &record("league:epl", "Premier League")).await.unwrap();

        let reopened = JsonFileAliasStore::new(&path);
        let teams = reopened.load(EntityType::Team).await.unwrap();
        assert_eq!(teams.len(), 1);
        assert_eq!(teams[0].canonical_key, "team:arsenal");
        assert_eq!(reopened.load(EntityType::League).await.unwrap().len(), 1);

        assert!(reopened.delete(EntityType::Team, "team:arsenal").await.unwrap());
        assert!(store.load(EntityType::Team).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_json_malformed_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aliases.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = JsonFileAliasStore::new(&path);
        let result = store.load(EntityType::Team).await;
        assert!(matches!(result, Err(LinkError::Json(_))));
    }

    #[tokio::test]
    async fn test_json_seed_if_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileAliasStore::new(dir.path().join("aliases.json"));
        assert!(store.seed_if_missing().await.unwrap());
        assert!(!store.seed_if_missing().await.unwrap());
        assert!(!store.load(EntityType::League).await.unwrap().is_empty());
    }
}
