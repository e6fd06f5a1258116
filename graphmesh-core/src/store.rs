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

//! The artifact store: a single atomically-swapped pointer to the current
//! [`GenerationSnapshot`].
//!
//! Readers clone the `Arc` under a short read lock and then work entirely on
//! the immutable snapshot; `reload` builds the next generation off to the
//! side and swaps the pointer in one write. The index job supervisor is the
//! only caller of `reload` after startup.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::artifacts::{
    self, artifacts_present, COMMUNITY_REPORTS_FILE, ENTITIES_FILE, NODES_FILE,
    RELATIONSHIPS_FILE, TEXT_UNITS_FILE,
};
use crate::error::StoreError;
use crate::records::{Community, Entity, NodeRow, Relationship, TextUnit};
use crate::snapshot::GenerationSnapshot;

pub struct ArtifactStore {
    data_dir: PathBuf,
    snapshot: RwLock<Option<Arc<GenerationSnapshot>>>,
    generation: AtomicU64,
}

impl ArtifactStore {
    /// Creates a store over `data_dir` and attempts an initial load. A fresh
    /// deployment legitimately has no artifacts yet; that case is logged and
    /// the store starts empty.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let store = Self {
            data_dir: data_dir.into(),
            snapshot: RwLock::new(None),
            generation: AtomicU64::new(0),
        };

        match store.reload() {
            Ok(generation) => {
                tracing::info!(generation, "loaded existing artifact generation");
            }
            Err(e) if e.is_missing() => {
                tracing::info!("no artifacts available yet; store starts empty");
            }
            Err(e) => {
                tracing::error!("failed to load artifacts at startup: {e}");
            }
        }

        store
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Discovers and loads the next generation, then swaps it in. All
    /// required files must be present; partial output is reported as
    /// `ArtifactsMissing` and the previous generation stays visible.
    pub fn reload(&self) -> Result<u64, StoreError> {
        let next = self.generation.load(Ordering::Acquire) + 1;
        let snapshot = Arc::new(load_generation(&self.data_dir, next)?);

        *self.snapshot.write().expect("snapshot lock poisoned") = Some(snapshot);
        self.generation.store(next, Ordering::Release);
        Ok(next)
    }

    /// The current snapshot, if any generation has been published.
    pub fn snapshot(&self) -> Option<Arc<GenerationSnapshot>> {
        self.snapshot.read().expect("snapshot lock poisoned").clone()
    }

    pub fn current_generation(&self) -> Option<u64> {
        self.snapshot().map(|snapshot| snapshot.generation)
    }

    fn require(&self) -> Result<Arc<GenerationSnapshot>, StoreError> {
        self.snapshot().ok_or_else(|| StoreError::ArtifactsMissing {
            dir: self.data_dir.display().to_string(),
        })
    }

    pub fn load_entities(&self, min_degree: Option<u64>) -> Result<Vec<Entity>, StoreError> {
        let snapshot = self.require()?;
        let min_degree = min_degree.unwrap_or(0);
        Ok(snapshot
            .entities
            .iter()
            .filter(|entity| entity.degree >= min_degree)
            .cloned()
            .collect())
    }

    pub fn load_relationships(&self) -> Result<Vec<Relationship>, StoreError> {
        Ok(self.require()?.relationships.clone())
    }

    /// Communities ordered by rank descending, optionally restricted to
    /// hierarchy levels at or below `max_level`.
    pub fn load_communities(&self, max_level: Option<u64>) -> Result<Vec<Community>, StoreError> {
        let snapshot = self.require()?;
        Ok(snapshot
            .communities
            .iter()
            .filter(|community| max_level.map_or(true, |level| community.level <= level))
            .cloned()
            .collect())
    }

    pub fn load_text_units(&self) -> Result<Vec<TextUnit>, StoreError> {
        Ok(self.require()?.text_units.clone())
    }

    pub fn get_entity_by_id(&self, id: &str) -> Result<Option<Entity>, StoreError> {
        Ok(self.require()?.entity_by_id(id).cloned())
    }

    pub fn get_related_entities(
        &self,
        entity_id: &str,
    ) -> Result<Vec<(Entity, Relationship)>, StoreError> {
        let snapshot = self.require()?;
        Ok(snapshot
            .neighbors(entity_id)
            .into_iter()
            .map(|(entity, relationship)| (entity.clone(), relationship.clone()))
            .collect())
    }
}

fn load_generation(dir: &Path, generation: u64) -> Result<GenerationSnapshot, StoreError> {
    if !artifacts_present(dir) {
        return Err(StoreError::ArtifactsMissing {
            dir: dir.display().to_string(),
        });
    }

    let entities: Vec<Entity> = artifacts::read_rows(dir, ENTITIES_FILE)?;
    let relationships: Vec<Relationship> = artifacts::read_rows(dir, RELATIONSHIPS_FILE)?;
    let communities: Vec<Community> = artifacts::read_rows(dir, COMMUNITY_REPORTS_FILE)?;
    let text_units: Vec<TextUnit> = artifacts::read_rows(dir, TEXT_UNITS_FILE)?;
    let nodes: Vec<NodeRow> = artifacts::read_rows(dir, NODES_FILE)?;

    let mut degree_by_title: HashMap<String, u64> = HashMap::with_capacity(nodes.len());
    for node in nodes {
        let entry = degree_by_title.entry(node.title).or_insert(0);
        *entry = (*entry).max(node.degree);
    }

    Ok(GenerationSnapshot::build(
        generation,
        entities,
        relationships,
        communities,
        text_units,
        degree_by_title,
    ))
}
