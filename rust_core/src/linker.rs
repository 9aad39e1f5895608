//! One-stop wiring of resolver and matcher for a configured process.

use crate::alias::{AliasResolver, AliasStore, ResolvedName};
use crate::config::LinkerConfig;
use crate::error::{LinkError, Result};
use crate::fixtures::{ApiBatch, CrownBatch};
use crate::matcher::{FixtureMatcher, MappingDocument};
use crate::normalize::Normalizer;
use crate::similarity::SimilarityEngine;
use crate::types::EntityType;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Resolver and matcher sharing one normalizer configuration.
pub struct FixtureLinker {
    resolver: Arc<AliasResolver>,
    matcher: FixtureMatcher,
}

impl FixtureLinker {
    pub fn new(config: &LinkerConfig, store: Arc<dyn AliasStore>) -> Result<Self> {
        config.validate()?;
        let normalizer = Normalizer::new(&config.normalizer);
        let engine = SimilarityEngine::new(normalizer.clone(), &config.similarity);
        Ok(Self {
            resolver: Arc::new(AliasResolver::new(store, normalizer, config.resolver.clone())),
            matcher: FixtureMatcher::new(engine, config.matcher.clone())?,
        })
    }

    pub fn resolver(&self) -> &Arc<AliasResolver> {
        &self.resolver
    }

    pub fn matcher(&self) -> &FixtureMatcher {
        &self.matcher
    }

    pub async fn resolve(&self, raw: &str, entity_type: EntityType) -> ResolvedName {
        self.resolver.resolve(raw, entity_type).await
    }

    /// Match two batches against the current alias snapshot.
    ///
    /// Scoring is CPU-bound and runs on the blocking pool so the async
    /// runtime stays responsive.
    pub async fn link(
        &self,
        crown: CrownBatch,
        api: ApiBatch,
        now: DateTime<Utc>,
    ) -> Result<MappingDocument> {
        let snapshot = self.resolver.snapshot().await;
        let matcher = self.matcher.clone();
        tokio::task::spawn_blocking(move || matcher.link_batches(&crown, &api, &snapshot, now))
            .await
            .map_err(|e| LinkError::Task(format!("matching: {}", e)))
    }
}
