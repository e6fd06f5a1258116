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

//! Derived-metric computations over one generation snapshot.
//!
//! Everything here is a pure function of the snapshot, so results are
//! identical for identical generations and safe to memoize keyed by the
//! generation number alone.

use std::collections::BTreeMap;

use serde::Serialize;

use graphmesh_core::{GenerationSnapshot, Relationship};

pub const DEFAULT_TOP_RELATIONSHIPS: usize = 10;
const MAX_INFLUENCE_FACTORS: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct Statistics {
    pub entities: EntityStatistics,
    pub relationships: RelationshipStatistics,
    pub communities: CollectionTotal,
    pub text_units: CollectionTotal,
    pub graph_density: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntityStatistics {
    pub total: usize,
    pub types: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RelationshipStatistics {
    pub total: usize,
    pub weight_stats: WeightStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionTotal {
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeightStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeCount {
    #[serde(rename = "type")]
    pub entity_type: String,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedRelationship {
    pub rank: usize,
    #[serde(flatten)]
    pub relationship: Relationship,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntityAnalysis {
    pub id: String,
    pub title: String,
    pub entity_type: String,
    pub centrality_score: u64,
    pub normalized_centrality: f64,
    pub semantic_description: String,
    pub influence_factors: Vec<InfluenceFactor>,
    pub analysis: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InfluenceFactor {
    pub related_entity: String,
    pub description: String,
}

pub fn statistics(snapshot: &GenerationSnapshot) -> Statistics {
    let mut types: BTreeMap<String, usize> = BTreeMap::new();
    for entity in &snapshot.entities {
        *types.entry(display_type(&entity.entity_type)).or_insert(0) += 1;
    }

    let weights: Vec<f64> = snapshot
        .relationships
        .iter()
        .map(|relationship| relationship.weight)
        .collect();

    Statistics {
        entities: EntityStatistics {
            total: snapshot.entities.len(),
            types,
        },
        relationships: RelationshipStatistics {
            total: snapshot.relationships.len(),
            weight_stats: weight_stats(&weights),
        },
        communities: CollectionTotal {
            total: snapshot.communities.len(),
        },
        text_units: CollectionTotal {
            total: snapshot.text_units.len(),
        },
        graph_density: graph_density(snapshot.entities.len(), snapshot.relationships.len()),
    }
}

/// Density of an undirected simple graph, clamped into `[0, 1]`; zero for
/// fewer than two entities.
pub fn graph_density(entity_count: usize, relationship_count: usize) -> f64 {
    if entity_count < 2 {
        return 0.0;
    }
    let n = entity_count as f64;
    let density = 2.0 * relationship_count as f64 / (n * (n - 1.0));
    density.min(1.0)
}

/// Weight summary with the lower-median convention for even-sized sets.
pub fn weight_stats(weights: &[f64]) -> WeightStats {
    if weights.is_empty() {
        return WeightStats {
            min: 0.0,
            max: 0.0,
            mean: 0.0,
            median: 0.0,
        };
    }

    let mut sorted = weights.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let sum: f64 = sorted.iter().sum();
    WeightStats {
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        mean: sum / sorted.len() as f64,
        median: sorted[(sorted.len() - 1) / 2],
    }
}

/// Entity type distribution, count descending with a stable type-name
/// tie-break. Percentages are rounded to two decimals.
pub fn entity_type_histogram(snapshot: &GenerationSnapshot) -> Vec<TypeCount> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for entity in &snapshot.entities {
        *counts.entry(display_type(&entity.entity_type)).or_insert(0) += 1;
    }

    let total = snapshot.entities.len();
    let mut histogram: Vec<TypeCount> = counts
        .into_iter()
        .map(|(entity_type, count)| TypeCount {
            entity_type,
            count,
            percentage: if total == 0 {
                0.0
            } else {
                round2(count as f64 * 100.0 / total as f64)
            },
        })
        .collect();

    histogram.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.entity_type.cmp(&b.entity_type))
    });
    histogram
}

/// Top `k` relationships by weight descending; ties break toward the
/// lexicographically smaller source title, then target, then id.
pub fn top_relationships(snapshot: &GenerationSnapshot, k: usize) -> Vec<RankedRelationship> {
    let mut relationships: Vec<&Relationship> = snapshot.relationships.iter().collect();
    relationships.sort_by(|a, b| {
        b.weight
            .partial_cmp(&a.weight)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.source.cmp(&b.source))
            .then_with(|| a.target.cmp(&b.target))
            .then_with(|| a.id.cmp(&b.id))
    });

    relationships
        .into_iter()
        .take(k)
        .enumerate()
        .map(|(index, relationship)| RankedRelationship {
            rank: index + 1,
            relationship: relationship.clone(),
        })
        .collect()
}

/// Structural analysis of one entity. Both prose fields are templated from
/// graph facts; no model call is involved.
pub fn entity_analysis(snapshot: &GenerationSnapshot, entity_id: &str) -> Option<EntityAnalysis> {
    let entity = snapshot.entity_by_id(entity_id)?;

    let max_degree = snapshot.max_degree();
    let normalized = if max_degree == 0 {
        0.0
    } else {
        entity.degree as f64 / max_degree as f64
    };

    let mut neighbors = snapshot.neighbors(entity_id);
    neighbors.sort_by(|a, b| {
        b.1.weight
            .partial_cmp(&a.1.weight)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.title.cmp(&b.0.title))
    });

    let influence_factors: Vec<InfluenceFactor> = neighbors
        .iter()
        .take(MAX_INFLUENCE_FACTORS)
        .map(|(neighbor, relationship)| InfluenceFactor {
            related_entity: neighbor.title.clone(),
            description: relationship.description.clone(),
        })
        .collect();

    let entity_type = display_type(&entity.entity_type);
    let semantic_description = if entity.description.trim().is_empty() {
        format!(
            "{} is a {} entity with {} direct connections in the knowledge graph.",
            entity.title,
            entity_type.to_lowercase(),
            entity.degree
        )
    } else {
        entity.description.clone()
    };

    let standing = if normalized >= 0.75 {
        "one of the most connected entities in the graph"
    } else if normalized >= 0.4 {
        "a well-connected entity"
    } else {
        "a peripheral entity"
    };
    let analysis = format!(
        "{} has {} direct relationships (normalized centrality {:.2}), making it {}.",
        entity.title, entity.degree, normalized, standing
    );

    Some(EntityAnalysis {
        id: entity.id.clone(),
        title: entity.title.clone(),
        entity_type,
        centrality_score: entity.degree,
        normalized_centrality: normalized,
        semantic_description,
        influence_factors,
        analysis,
    })
}

fn display_type(entity_type: &str) -> String {
    if entity_type.trim().is_empty() {
        "UNKNOWN".to_string()
    } else {
        entity_type.to_string()
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
