//! TTL-refreshed alias snapshot cache.
//!
//! This module provides:
//! - `resolve`: raw name -> canonical key + display name, never failing
//! - An immutable `AliasSnapshot` swapped atomically after each full rebuild
//! - Single-flight reloads: concurrent callers on an expired cache wait for one
//!   reload instead of each hitting the store
//! - Stale-but-available serving when the store is unreachable
//! - Validated create/update/delete that refresh the snapshot on success

use super::{AliasIndex, AliasSnapshot, AliasStore, CanonicalNameRecord};
use crate::config::ResolverConfig;
use crate::error::{LinkError, Result};
use crate::normalize::Normalizer;
use crate::types::{EntityType, MatchSource};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Outcome of resolving one raw name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedName {
    pub canonical_key: String,
    pub display_name: String,
    pub match_source: MatchSource,
    pub raw: String,
}

/// Create/update request for one record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AliasMutation {
    #[serde(default)]
    pub canonical_key: Option<String>,
    #[serde(default)]
    pub name_en: Option<String>,
    #[serde(default)]
    pub name_zh_cn: Option<String>,
    #[serde(default)]
    pub name_zh_tw: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

fn clean(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

struct CacheState {
    snapshot: Arc<AliasSnapshot>,
    /// Last reload attempt, successful or not
    refreshed_at: Option<Instant>,
    /// Whether any reload has ever succeeded
    loaded: bool,
}

/// Alias resolver over an external store.
pub struct AliasResolver {
    store: Arc<dyn AliasStore>,
    normalizer: Normalizer,
    config: ResolverConfig,
    state: RwLock<CacheState>,
    reload_lock: Mutex<()>,
    reloads: AtomicU64,
}

impl AliasResolver {
    pub fn new(store: Arc<dyn AliasStore>, normalizer: Normalizer, config: ResolverConfig) -> Self {
        Self {
            store,
            normalizer,
            config,
            state: RwLock::new(CacheState {
                snapshot: Arc::new(AliasSnapshot::empty()),
                refreshed_at: None,
                loaded: false,
            }),
            reload_lock: Mutex::new(()),
            reloads: AtomicU64::new(0),
        }
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Number of successful store reloads so far.
    pub fn reload_count(&self) -> u64 {
        self.reloads.load(Ordering::SeqCst)
    }

    /// Whether any reload has succeeded yet.
    pub fn is_loaded(&self) -> bool {
        self.state.read().loaded
    }

    fn is_fresh(&self) -> bool {
        self.state
            .read()
            .refreshed_at
            .map(|t| t.elapsed() < self.config.cache_ttl)
            .unwrap_or(false)
    }

    /// Current snapshot without triggering a reload.
    pub fn current_snapshot(&self) -> Arc<AliasSnapshot> {
        self.state.read().snapshot.clone()
    }

    /// Snapshot, reloading first if the TTL has expired.
    ///
    /// Reload failures are logged and the previous snapshot is served.
    pub async fn snapshot(&self) -> Arc<AliasSnapshot> {
        if !self.is_fresh() {
            let _guard = self.reload_lock.lock().await;
            // Another caller may have reloaded while we waited
            if !self.is_fresh() {
                if let Err(e) = self.reload_locked().await {
                    warn!(
                        "Alias reload from {} failed, serving {} snapshot: {}",
                        self.store.store_name(),
                        if self.is_loaded() { "last good" } else { "empty" },
                        e
                    );
                }
            }
        }
        self.current_snapshot()
    }

    /// Force a reload from the store, regardless of TTL.
    pub async fn refresh(&self) -> Result<Arc<AliasSnapshot>> {
        let _guard = self.reload_lock.lock().await;
        self.reload_locked().await
    }

    /// Expire the snapshot so the next read reloads.
    pub fn invalidate(&self) {
        self.state.write().refreshed_at = None;
    }

    /// Caller must hold `reload_lock`.
    async fn reload_locked(&self) -> Result<Arc<AliasSnapshot>> {
        let loaded = async {
            let leagues = self.store.load(EntityType::League).await?;
            let teams = self.store.load(EntityType::Team).await?;
            Ok::<_, LinkError>((leagues, teams))
        }
        .await;

        let (leagues, teams) = match loaded {
            Ok(records) => records,
            Err(e) => {
                // Back off for one TTL before hitting the store again
                self.state.write().refreshed_at = Some(Instant::now());
                return Err(e);
            }
        };

        let snapshot = Arc::new(AliasSnapshot::build(leagues, teams, &self.normalizer));
        {
            let mut state = self.state.write();
            state.snapshot = snapshot.clone();
            state.refreshed_at = Some(Instant::now());
            state.loaded = true;
        }
        let count = self.reloads.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(
            "Alias snapshot reloaded from {} (#{}): {} leagues, {} teams",
            self.store.store_name(),
            count,
            snapshot.leagues.len(),
            snapshot.teams.len()
        );
        Ok(snapshot)
    }

    /// Resolve a raw name to its canonical key and display name.
    pub async fn resolve(&self, raw: &str, entity_type: EntityType) -> ResolvedName {
        self.snapshot().await.resolve(raw, entity_type, &self.normalizer)
    }

    /// Resolve many names against one snapshot.
    pub async fn resolve_all<'a, I>(&self, raws: I, entity_type: EntityType) -> Vec<ResolvedName>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let snapshot = self.snapshot().await;
        raws.into_iter()
            .map(|raw| snapshot.resolve(raw, entity_type, &self.normalizer))
            .collect()
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Create or update a record.
    ///
    /// Without a key, a record already owning the primary name is updated in
    /// place; otherwise a key is derived from the primary name. Supplied name
    /// fields overwrite, absent ones are kept, and aliases are unioned.
    pub async fn upsert(
        &self,
        entity_type: EntityType,
        mutation: AliasMutation,
    ) -> Result<CanonicalNameRecord> {
        let supplied_key = match &mutation.canonical_key {
            Some(key) => {
                let trimmed = key.trim();
                if trimmed.is_empty() {
                    return Err(LinkError::Validation(
                        "canonical key must not be empty".to_string(),
                    ));
                }
                Some(trimmed.to_string())
            }
            None => None,
        };

        let incoming = CanonicalNameRecord {
            canonical_key: supplied_key.clone().unwrap_or_default(),
            name_en: clean(&mutation.name_en),
            name_zh_cn: clean(&mutation.name_zh_cn),
            name_zh_tw: clean(&mutation.name_zh_tw),
            aliases: self.dedupe_aliases(mutation.aliases.iter()),
        };

        let existing_records = self.store.load(entity_type).await?;

        let key = match supplied_key {
            Some(key) => key,
            None => {
                let primary = incoming.primary_name().ok_or_else(|| {
                    LinkError::Validation("at least one name or alias is required".to_string())
                })?;
                let normalized = self.normalizer.normalize(primary);
                let index =
                    AliasIndex::build(entity_type, existing_records.clone(), &self.normalizer);
                match index.lookup(&normalized) {
                    Some((record, _)) => record.canonical_key.clone(),
                    None => entity_type.canonical_key(&normalized),
                }
            }
        };

        let record = match existing_records.into_iter().find(|r| r.canonical_key == key) {
            Some(existing) => self.merge(existing, incoming),
            None => CanonicalNameRecord {
                canonical_key: key,
                ..incoming
            },
        };

        if !record.has_any_name() {
            return Err(LinkError::Validation(format!(
                "record '{}' needs at least one name or alias",
                record.canonical_key
            )));
        }

        self.store.upsert(entity_type, &record).await?;
        info!("Upserted {} alias record {}", entity_type, record.canonical_key);
        self.refresh_after_write().await;
        Ok(record)
    }

    /// Delete a record by canonical key (administrative cleanup).
    pub async fn delete(&self, entity_type: EntityType, canonical_key: &str) -> Result<bool> {
        let key = canonical_key.trim();
        if key.is_empty() {
            return Err(LinkError::Validation(
                "canonical key must not be empty".to_string(),
            ));
        }
        let removed = self.store.delete(entity_type, key).await?;
        if removed {
            info!("Deleted {} alias record {}", entity_type, key);
            self.refresh_after_write().await;
        }
        Ok(removed)
    }

    async fn refresh_after_write(&self) {
        if let Err(e) = self.refresh().await {
            warn!("Alias write succeeded but snapshot refresh failed: {}", e);
            self.invalidate();
        }
    }

    fn merge(
        &self,
        existing: CanonicalNameRecord,
        incoming: CanonicalNameRecord,
    ) -> CanonicalNameRecord {
        let aliases = self.dedupe_aliases(existing.aliases.iter().chain(incoming.aliases.iter()));
        CanonicalNameRecord {
            canonical_key: existing.canonical_key,
            name_en: incoming.name_en.or(existing.name_en),
            name_zh_cn: incoming.name_zh_cn.or(existing.name_zh_cn),
            name_zh_tw: incoming.name_zh_tw.or(existing.name_zh_tw),
            aliases,
        }
    }

    /// Trim, drop empties and keep the first spelling of each normalized alias.
    fn dedupe_aliases<'a, I>(&self, aliases: I) -> Vec<String>
    where
        I: Iterator<Item = &'a String>,
    {
        let mut seen = rustc_hash::FxHashSet::default();
        aliases
            .map(|a| a.trim())
            .filter(|a| {
                let normalized = self.normalizer.normalize(a);
                !normalized.is_empty() && seen.insert(normalized)
            })
            .map(str::to_string)
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::MemoryAliasStore;
    use std::time::Duration;

    fn resolver_with(store: Arc<MemoryAliasStore>, ttl: Duration) -> AliasResolver {
        AliasResolver::new(store, Normalizer::default(), ResolverConfig { cache_ttl: ttl })
    }

    fn spurs() -> CanonicalNameRecord {
        CanonicalNameRecord {
            canonical_key: "team:tottenhamhotspur".to_string(),
            name_en: Some("Tottenham Hotspur".to_string()),
            name_zh_cn: Some("托特纳姆热刺".to_string()),
            name_zh_tw: Some("托特納姆熱刺".to_string()),
            aliases: vec!["Spurs".to_string()],
        }
    }

    // -------------------------------------------------------------------------
    // Resolution
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_resolve_prefers_simplified_for_any_variant() {
        let store = Arc::new(MemoryAliasStore::with_records(vec![], vec![spurs()]));
        let resolver = resolver_with(store, Duration::from_secs(60));

        for raw in ["Tottenham Hotspur", "托特納姆熱刺", "托特纳姆热刺", "SPURS"] {
            let resolved = resolver.resolve(raw, EntityType::Team).await;
            assert_eq!(resolved.display_name, "托特纳姆热刺", "lookup via {}", raw);
            assert_eq!(resolved.canonical_key, "team:tottenhamhotspur");
            assert_eq!(resolved.raw, raw);
        }
    }

    #[tokio::test]
    async fn test_resolve_match_source() {
        let store = Arc::new(MemoryAliasStore::with_records(vec![], vec![spurs()]));
        let resolver = resolver_with(store, Duration::from_secs(60));

        let canonical = resolver.resolve("Tottenham Hotspur", EntityType::Team).await;
        assert_eq!(canonical.match_source, MatchSource::Canonical);
        let alias = resolver.resolve("Spurs", EntityType::Team).await;
        assert_eq!(alias.match_source, MatchSource::Alias);
        let fallback = resolver.resolve("Kyoto Sanga", EntityType::Team).await;
        assert_eq!(fallback.match_source, MatchSource::Fallback);
        assert_eq!(fallback.display_name, "Kyoto Sanga");
    }

    #[tokio::test]
    async fn test_fallback_key_stable_within_ttl() {
        let store = Arc::new(MemoryAliasStore::new());
        let resolver = resolver_with(store, Duration::from_secs(60));

        let first = resolver.resolve("Unknown United FC", EntityType::Team).await;
        let second = resolver.resolve("Unknown United FC", EntityType::Team).await;
        assert_eq!(first.canonical_key, second.canonical_key);
        assert_eq!(first.canonical_key, "team:unknownunited");
    }

    #[tokio::test]
    async fn test_resolve_all_uses_one_snapshot() {
        let store = Arc::new(MemoryAliasStore::with_records(vec![], vec![spurs()]));
        let resolver = resolver_with(store, Duration::from_secs(60));
        let resolved = resolver
            .resolve_all(["Spurs", "Nobody"], EntityType::Team)
            .await;
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolver.reload_count(), 1);
    }

    // -------------------------------------------------------------------------
    // Caching
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_ttl_serves_from_memory() {
        let store = Arc::new(MemoryAliasStore::new());
        let resolver = resolver_with(store.clone(), Duration::from_secs(60));

        resolver.resolve("Arsenal", EntityType::Team).await;
        // Written behind the resolver's back: invisible until the TTL lapses
        store.upsert(EntityType::Team, &spurs()).await.unwrap();
        let resolved = resolver.resolve("Spurs", EntityType::Team).await;

        assert_eq!(resolved.match_source, MatchSource::Fallback);
        assert_eq!(resolver.reload_count(), 1);
    }

    #[tokio::test]
    async fn test_expired_ttl_reloads() {
        let store = Arc::new(MemoryAliasStore::new());
        let resolver = resolver_with(store.clone(), Duration::ZERO);

        resolver.resolve("Spurs", EntityType::Team).await;
        store.upsert(EntityType::Team, &spurs()).await.unwrap();
        let resolved = resolver.resolve("Spurs", EntityType::Team).await;

        assert_eq!(resolved.match_source, MatchSource::Alias);
        assert_eq!(resolver.reload_count(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_reload() {
        let store = Arc::new(MemoryAliasStore::new());
        let resolver = resolver_with(store, Duration::from_secs(60));
        resolver.resolve("x", EntityType::League).await;
        resolver.invalidate();
        resolver.resolve("x", EntityType::League).await;
        assert_eq!(resolver.reload_count(), 2);
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_upsert_rejects_blank_key() {
        let store = Arc::new(MemoryAliasStore::new());
        let resolver = resolver_with(store.clone(), Duration::from_secs(60));

        let result = resolver
            .upsert(
                EntityType::Team,
                AliasMutation {
                    canonical_key: Some("   ".to_string()),
                    name_en: Some("Arsenal".to_string()),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(LinkError::Validation(_))));
        assert_eq!(store.len(EntityType::Team), 0);
    }

    #[tokio::test]
    async fn test_upsert_rejects_nameless() {
        let store = Arc::new(MemoryAliasStore::new());
        let resolver = resolver_with(store.clone(), Duration::from_secs(60));

        let result = resolver
            .upsert(
                EntityType::League,
                AliasMutation {
                    aliases: vec!["  ".to_string()],
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(LinkError::Validation(_))));

        let keyed = resolver
            .upsert(
                EntityType::League,
                AliasMutation {
                    canonical_key: Some("league:empty".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(keyed, Err(LinkError::Validation(_))));
        assert_eq!(store.len(EntityType::League), 0);
    }

    #[tokio::test]
    async fn test_upsert_trims_key_and_dedupes_aliases() {
        let store = Arc::new(MemoryAliasStore::new());
        let resolver = resolver_with(store, Duration::from_secs(60));

        let record = resolver
            .upsert(
                EntityType::Team,
                AliasMutation {
                    canonical_key: Some("  team:kyotosanga ".to_string()),
                    name_en: Some("Kyoto Sanga".to_string()),
                    aliases: vec![
                        "Kyoto".to_string(),
                        "KYOTO".to_string(),
                        " kyoto fc ".to_string(),
                        "".to_string(),
                        "京都不死鸟".to_string(),
                    ],
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(record.canonical_key, "team:kyotosanga");
        assert_eq!(record.aliases, vec!["Kyoto".to_string(), "京都不死鸟".to_string()]);
    }

    #[tokio::test]
    async fn test_upsert_visible_immediately() {
        let store = Arc::new(MemoryAliasStore::new());
        let resolver = resolver_with(store, Duration::from_secs(3600));

        let before = resolver.resolve("Kyoto", EntityType::Team).await;
        assert_eq!(before.match_source, MatchSource::Fallback);

        resolver
            .upsert(
                EntityType::Team,
                AliasMutation {
                    name_en: Some("Kyoto Sanga".to_string()),
                    name_zh_cn: Some("京都不死鸟".to_string()),
                    aliases: vec!["Kyoto".to_string()],
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let after = resolver.resolve("Kyoto", EntityType::Team).await;
        assert_eq!(after.match_source, MatchSource::Alias);
        assert_eq!(after.canonical_key, "team:kyotosanga");
        assert_eq!(after.display_name, "京都不死鸟");
    }

    #[tokio::test]
    async fn test_upsert_without_key_updates_existing_record() {
        let store = Arc::new(MemoryAliasStore::with_records(vec![], vec![spurs()]));
        let resolver = resolver_with(store.clone(), Duration::from_secs(60));

        // Supplying only the alias as English name plus a new alias
        let record = resolver
            .upsert(
                EntityType::Team,
                AliasMutation {
                    name_en: Some("Spurs".to_string()),
                    aliases: vec!["THFC".to_string()],
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(record.canonical_key, "team:tottenhamhotspur");
        assert_eq!(record.name_en.as_deref(), Some("Spurs"));
        assert_eq!(record.name_zh_cn.as_deref(), Some("托特纳姆热刺"));
        assert_eq!(record.aliases, vec!["Spurs".to_string(), "THFC".to_string()]);
        assert_eq!(store.len(EntityType::Team), 1);
    }

    #[tokio::test]
    async fn test_delete_invalidates_entries() {
        let store = Arc::new(MemoryAliasStore::with_records(vec![], vec![spurs()]));
        let resolver = resolver_with(store, Duration::from_secs(3600));

        assert_eq!(
            resolver.resolve("Spurs", EntityType::Team).await.match_source,
            MatchSource::Alias
        );
        assert!(resolver.delete(EntityType::Team, "team:tottenhamhotspur").await.unwrap());
        assert_eq!(
            resolver.resolve("Spurs", EntityType::Team).await.match_source,
            MatchSource::Fallback
        );
        assert!(matches!(
            resolver.delete(EntityType::Team, " ").await,
            Err(LinkError::Validation(_))
        ));
    }
}
