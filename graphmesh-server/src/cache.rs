// Copyright 2025 Graphmesh (https://github.com/graphmesh)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Derived-Metrics Cache.
//!
//! Memoizes the analytics aggregations per artifact generation. Every key
//! embeds the generation number, so an entry computed against an older
//! generation can never answer a newer one; the supervisor additionally calls
//! [`MetricsCache::invalidate`] on every successful reload to drop the dead
//! entries eagerly. Concurrent misses for the same key collapse into one
//! computation through moka's `get_with`.

use std::sync::Arc;

use moka::future::Cache;

use graphmesh_core::GenerationSnapshot;

use crate::metrics::{
    self, EntityAnalysis, RankedRelationship, Statistics, TypeCount,
};

const MAX_ENTRIES_PER_FAMILY: u64 = 1024;

pub struct MetricsCache {
    statistics: Cache<u64, Arc<Statistics>>,
    histogram: Cache<u64, Arc<Vec<TypeCount>>>,
    top_relationships: Cache<(u64, usize), Arc<Vec<RankedRelationship>>>,
    entity_analysis: Cache<(u64, String), Arc<EntityAnalysis>>,
}

impl MetricsCache {
    pub fn new() -> Self {
        Self {
            statistics: Cache::new(MAX_ENTRIES_PER_FAMILY),
            histogram: Cache::new(MAX_ENTRIES_PER_FAMILY),
            top_relationships: Cache::new(MAX_ENTRIES_PER_FAMILY),
            entity_analysis: Cache::new(MAX_ENTRIES_PER_FAMILY),
        }
    }

    pub async fn statistics(&self, snapshot: &Arc<GenerationSnapshot>) -> Arc<Statistics> {
        let snapshot = snapshot.clone();
        self.statistics
            .get_with(snapshot.generation, async move {
                Arc::new(metrics::statistics(&snapshot))
            })
            .await
    }

    pub async fn entity_type_histogram(
        &self,
        snapshot: &Arc<GenerationSnapshot>,
    ) -> Arc<Vec<TypeCount>> {
        let snapshot = snapshot.clone();
        self.histogram
            .get_with(snapshot.generation, async move {
                Arc::new(metrics::entity_type_histogram(&snapshot))
            })
            .await
    }

    pub async fn top_relationships(
        &self,
        snapshot: &Arc<GenerationSnapshot>,
        k: usize,
    ) -> Arc<Vec<RankedRelationship>> {
        let snapshot = snapshot.clone();
        self.top_relationships
            .get_with((snapshot.generation, k), async move {
                Arc::new(metrics::top_relationships(&snapshot, k))
            })
            .await
    }

    /// `None` when the entity does not exist in this generation; absent
    /// results are not cached.
    pub async fn entity_analysis(
        &self,
        snapshot: &Arc<GenerationSnapshot>,
        entity_id: &str,
    ) -> Option<Arc<EntityAnalysis>> {
        let key = (snapshot.generation, entity_id.to_string());
        let snapshot = snapshot.clone();
        let entity_id = entity_id.to_string();
        self.entity_analysis
            .optionally_get_with(key, async move {
                metrics::entity_analysis(&snapshot, &entity_id).map(Arc::new)
            })
            .await
    }

    /// Drop every memoized entry across all families.
    pub fn invalidate(&self) {
        self.statistics.invalidate_all();
        self.histogram.invalidate_all();
        self.top_relationships.invalidate_all();
        self.entity_analysis.invalidate_all();
    }
}

impl Default for MetricsCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphmesh_core::Entity;
    use std::collections::HashMap;

    fn snapshot(generation: u64, entity_count: usize) -> Arc<GenerationSnapshot> {
        let entities = (0..entity_count)
            .map(|i| Entity {
                id: format!("e{i}"),
                human_readable_id: String::new(),
                title: format!("Entity {i}"),
                entity_type: "PERSON".to_string(),
                description: String::new(),
                degree: i as u64,
            })
            .collect();
        Arc::new(GenerationSnapshot::build(
            generation,
            entities,
            Vec::new(),
            Vec::new(),
            Vec::new(),
            HashMap::new(),
        ))
    }

    #[tokio::test]
    async fn identical_generations_share_one_computation() {
        let cache = MetricsCache::new();
        let snapshot = snapshot(1, 3);

        let first = cache.statistics(&snapshot).await;
        let second = cache.statistics(&snapshot).await;
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn generations_do_not_bleed_into_each_other() {
        let cache = MetricsCache::new();
        let old = snapshot(1, 3);
        let new = snapshot(2, 5);

        assert_eq!(cache.statistics(&old).await.entities.total, 3);
        assert_eq!(cache.statistics(&new).await.entities.total, 5);
    }

    #[tokio::test]
    async fn invalidate_drops_all_families() {
        let cache = MetricsCache::new();
        let snapshot = snapshot(1, 3);

        let before = cache.statistics(&snapshot).await;
        cache.invalidate();
        cache.statistics.run_pending_tasks().await;
        let after = cache.statistics(&snapshot).await;
        assert!(!Arc::ptr_eq(&before, &after));
    }

    #[tokio::test]
    async fn missing_entity_analysis_is_not_cached() {
        let cache = MetricsCache::new();
        let snapshot = snapshot(1, 2);

        assert!(cache.entity_analysis(&snapshot, "missing").await.is_none());
        assert!(cache.entity_analysis(&snapshot, "e1").await.is_some());
    }
}
