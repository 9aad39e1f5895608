//! PostgreSQL alias store.
//!
//! Tables `league_aliases` and `team_aliases` share one layout. `aliases` is
//! a JSON-serialized string list; rows are returned in insertion order so the
//! alias index sees the same collision winner on every reload.

use super::retry::{execute_with_retry, RetryPolicy};
use crate::alias::{AliasStore, CanonicalNameRecord};
use crate::error::Result;
use crate::types::EntityType;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, warn};

#[derive(Debug, Clone, sqlx::FromRow)]
struct AliasRow {
    canonical_key: String,
    name_en: Option<String>,
    name_zh_cn: Option<String>,
    name_zh_tw: Option<String>,
    aliases: Option<String>,
}

impl AliasRow {
    fn into_record(self, entity_type: EntityType) -> CanonicalNameRecord {
        let aliases = match self.aliases.as_deref().map(str::trim) {
            None | Some("") => Vec::new(),
            Some(raw) => serde_json::from_str::<Vec<String>>(raw).unwrap_or_else(|e| {
                warn!(
                    "Unreadable aliases for {} {}: {}",
                    entity_type, self.canonical_key, e
                );
                Vec::new()
            }),
        };
        CanonicalNameRecord {
            canonical_key: self.canonical_key,
            name_en: self.name_en,
            name_zh_cn: self.name_zh_cn,
            name_zh_tw: self.name_zh_tw,
            aliases,
        }
    }
}

/// Alias store backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgAliasStore {
    pool: PgPool,
    retry: RetryPolicy,
}

impl PgAliasStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create both alias tables if they do not exist.
    pub async fn ensure_schema(&self) -> Result<()> {
        for entity_type in EntityType::ALL {
            let ddl = format!(
                r#"
                CREATE TABLE IF NOT EXISTS {table} (
                    id BIGSERIAL PRIMARY KEY,
                    canonical_key TEXT NOT NULL UNIQUE,
                    name_en TEXT,
                    name_zh_cn TEXT,
                    name_zh_tw TEXT,
                    aliases TEXT NOT NULL DEFAULT '[]',
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                )
                "#,
                table = entity_type.table_name()
            );
            sqlx::query(&ddl).execute(&self.pool).await?;
        }
        debug!("Alias tables ready");
        Ok(())
    }
}

#[async_trait]
impl AliasStore for PgAliasStore {
    async fn load(&self, entity_type: EntityType) -> Result<Vec<CanonicalNameRecord>> {
        let sql = format!(
            "SELECT canonical_key, name_en, name_zh_cn, name_zh_tw, aliases FROM {} ORDER BY id",
            entity_type.table_name()
        );
        let operation = format!("load {}", entity_type.table_name());
        let rows = execute_with_retry(&self.retry, &operation, || {
            sqlx::query_as::<_, AliasRow>(&sql).fetch_all(&self.pool)
        })
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| row.into_record(entity_type))
            .collect())
    }

    async fn upsert(&self, entity_type: EntityType, record: &CanonicalNameRecord) -> Result<()> {
        let sql = format!(
            r#"
            INSERT INTO {} (canonical_key, name_en, name_zh_cn, name_zh_tw, aliases, updated_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            ON CONFLICT (canonical_key) DO UPDATE SET
                name_en = EXCLUDED.name_en,
                name_zh_cn = EXCLUDED.name_zh_cn,
                name_zh_tw = EXCLUDED.name_zh_tw,
                aliases = EXCLUDED.aliases,
                updated_at = NOW()
            "#,
            entity_type.table_name()
        );
        let aliases = serde_json::to_string(&record.aliases)?;
        let operation = format!("upsert {} {}", entity_type, record.canonical_key);

        execute_with_retry(&self.retry, &operation, || {
            sqlx::query(&sql)
                .bind(&record.canonical_key)
                .bind(&record.name_en)
                .bind(&record.name_zh_cn)
                .bind(&record.name_zh_tw)
                .bind(&aliases)
                .execute(&self.pool)
        })
        .await?;
        Ok(())
    }

    async fn delete(&self, entity_type: EntityType, canonical_key: &str) -> Result<bool> {
        let sql = format!(
            "DELETE FROM {} WHERE canonical_key = $1",
            entity_type.table_name()
        );
        let operation = format!("delete {} {}", entity_type, canonical_key);
        let result = execute_with_retry(&self.retry, &operation, || {
            sqlx::query(&sql).bind(canonical_key).execute(&self.pool)
        })
        .await?;
        Ok(result.rows_affected() > 0)
    }

    fn store_name(&self) -> &str {
        "postgres"
    }
}
