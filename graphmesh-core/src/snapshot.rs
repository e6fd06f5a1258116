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

//! One fully-loaded artifact generation.
//!
//! A snapshot is immutable after construction and shared behind an `Arc`, so
//! a reader that obtained it keeps a mutually consistent view of entities,
//! relationships, communities, and text units even while the store swaps in
//! a newer generation.

use std::collections::HashMap;

use crate::records::{Community, Entity, Relationship, TextUnit};

#[derive(Debug)]
pub struct GenerationSnapshot {
    pub generation: u64,
    pub entities: Vec<Entity>,
    pub relationships: Vec<Relationship>,
    pub communities: Vec<Community>,
    pub text_units: Vec<TextUnit>,
    by_id: HashMap<String, usize>,
    by_title: HashMap<String, usize>,
}

impl GenerationSnapshot {
    /// Assembles a snapshot from freshly decoded tables.
    ///
    /// `degree_by_title` carries the per-entity degree published in the nodes
    /// table; entity records take the larger of their own value and the
    /// joined one. Relationship endpoint degrees are filled in the same way
    /// when the relationships table omits them. Communities are ordered by
    /// rank descending (id ascending on ties) once, here, so every consumer
    /// sees the same ordering.
    pub fn build(
        generation: u64,
        mut entities: Vec<Entity>,
        mut relationships: Vec<Relationship>,
        mut communities: Vec<Community>,
        text_units: Vec<TextUnit>,
        degree_by_title: HashMap<String, u64>,
    ) -> Self {
        for entity in &mut entities {
            if let Some(degree) = degree_by_title.get(&entity.title) {
                entity.degree = entity.degree.max(*degree);
            }
        }

        let mut by_id = HashMap::with_capacity(entities.len());
        let mut by_title: HashMap<String, usize> = HashMap::with_capacity(entities.len());
        for (index, entity) in entities.iter().enumerate() {
            by_id.entry(entity.id.clone()).or_insert(index);
            match by_title.get(&entity.title) {
                Some(&existing) if !prefer(entity, &entities[existing]) => {}
                _ => {
                    by_title.insert(entity.title.clone(), index);
                }
            }
        }

        for relationship in &mut relationships {
            if relationship.source_degree == 0 {
                if let Some(&index) = by_title.get(&relationship.source) {
                    relationship.source_degree = entities[index].degree;
                }
            }
            if relationship.target_degree == 0 {
                if let Some(&index) = by_title.get(&relationship.target) {
                    relationship.target_degree = entities[index].degree;
                }
            }
        }

        communities.sort_by(|a, b| {
            b.rank
                .partial_cmp(&a.rank)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });

        Self {
            generation,
            entities,
            relationships,
            communities,
            text_units,
            by_id,
            by_title,
        }
    }

    pub fn entity_by_id(&self, id: &str) -> Option<&Entity> {
        self.by_id.get(id).map(|&index| &self.entities[index])
    }

    pub fn entity_by_title(&self, title: &str) -> Option<&Entity> {
        self.by_title.get(title).map(|&index| &self.entities[index])
    }

    /// Entities deduplicated by title, each the preferred record for its
    /// title (largest degree, then smallest id).
    pub fn unique_titled_entities(&self) -> Vec<&Entity> {
        self.by_title
            .values()
            .map(|&index| &self.entities[index])
            .collect()
    }

    /// The 1-hop neighborhood of an entity: every neighbor entity together
    /// with the relationship connecting it. Relationships whose far endpoint
    /// does not resolve in this generation are skipped.
    pub fn neighbors(&self, entity_id: &str) -> Vec<(&Entity, &Relationship)> {
        let Some(entity) = self.entity_by_id(entity_id) else {
            return Vec::new();
        };

        self.relationships
            .iter()
            .filter_map(|relationship| {
                let other_title = if relationship.source == entity.title {
                    &relationship.target
                } else if relationship.target == entity.title {
                    &relationship.source
                } else {
                    return None;
                };
                self.entity_by_title(other_title)
                    .map(|neighbor| (neighbor, relationship))
            })
            .collect()
    }

    /// Text units that cite the given entity.
    pub fn text_units_citing(&self, entity_id: &str) -> Vec<&TextUnit> {
        self.text_units
            .iter()
            .filter(|unit| unit.entity_ids.iter().any(|id| id == entity_id))
            .collect()
    }

    pub fn max_degree(&self) -> u64 {
        self.entities
            .iter()
            .map(|entity| entity.degree)
            .max()
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Title collision rule: keep the entity with the larger degree, breaking
/// ties toward the lexicographically smaller id.
fn prefer(candidate: &Entity, current: &Entity) -> bool {
    candidate.degree > current.degree
        || (candidate.degree == current.degree && candidate.id < current.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(id: &str, title: &str, entity_type: &str, degree: u64) -> Entity {
        Entity {
            id: id.to_string(),
            human_readable_id: String::new(),
            title: title.to_string(),
            entity_type: entity_type.to_string(),
            description: String::new(),
            degree,
        }
    }

    fn relationship(id: &str, source: &str, target: &str, weight: f64) -> Relationship {
        Relationship {
            id: id.to_string(),
            human_readable_id: String::new(),
            source: source.to_string(),
            target: target.to_string(),
            description: String::new(),
            weight,
            source_degree: 0,
            target_degree: 0,
        }
    }

    fn community(id: &str, rank: f64) -> Community {
        Community {
            id: id.to_string(),
            title: format!("Community {id}"),
            level: 0,
            rank,
            rating: 0.0,
            summary: String::new(),
            full_content: String::new(),
            rank_explanation: String::new(),
            findings: Vec::new(),
        }
    }

    fn snapshot(entities: Vec<Entity>, relationships: Vec<Relationship>) -> GenerationSnapshot {
        GenerationSnapshot::build(1, entities, relationships, Vec::new(), Vec::new(), HashMap::new())
    }

    #[test]
    fn degree_joins_from_nodes_table() {
        let mut degrees = HashMap::new();
        degrees.insert("ACME".to_string(), 5);

        let snapshot = GenerationSnapshot::build(
            1,
            vec![entity("e1", "ACME", "ORGANIZATION", 0)],
            Vec::new(),
            Vec::new(),
            Vec::new(),
            degrees,
        );

        assert_eq!(snapshot.entity_by_id("e1").unwrap().degree, 5);
    }

    #[test]
    fn title_collision_prefers_largest_degree_then_smallest_id() {
        let snapshot = snapshot(
            vec![
                entity("e2", "ACME", "ORGANIZATION", 3),
                entity("e1", "ACME", "ORGANIZATION", 7),
                entity("e0", "ACME", "ORGANIZATION", 7),
            ],
            Vec::new(),
        );

        assert_eq!(snapshot.entity_by_title("ACME").unwrap().id, "e0");
    }

    #[test]
    fn neighbors_join_relationships_in_both_directions() {
        let snapshot = snapshot(
            vec![
                entity("e1", "ACME", "ORGANIZATION", 2),
                entity("e2", "EXPO", "EVENT", 1),
                entity("e3", "OTHER", "PERSON", 1),
            ],
            vec![
                relationship("r1", "ACME", "EXPO", 2.0),
                relationship("r2", "OTHER", "ACME", 1.0),
                relationship("r3", "EXPO", "OTHER", 1.0),
            ],
        );

        let neighbors = snapshot.neighbors("e1");
        let titles: Vec<&str> = neighbors
            .iter()
            .map(|(entity, _)| entity.title.as_str())
            .collect();
        assert_eq!(titles, vec!["EXPO", "OTHER"]);
    }

    #[test]
    fn endpoint_degrees_fill_from_entities() {
        let snapshot = snapshot(
            vec![
                entity("e1", "ACME", "ORGANIZATION", 4),
                entity("e2", "EXPO", "EVENT", 2),
            ],
            vec![relationship("r1", "ACME", "EXPO", 2.0)],
        );

        let relationship = &snapshot.relationships[0];
        assert_eq!(relationship.source_degree, 4);
        assert_eq!(relationship.target_degree, 2);
    }

    #[test]
    fn communities_sort_by_rank_descending() {
        let snapshot = GenerationSnapshot::build(
            1,
            Vec::new(),
            Vec::new(),
            vec![community("1", 4.0), community("2", 8.5), community("3", 8.5)],
            Vec::new(),
            HashMap::new(),
        );

        let ids: Vec<&str> = snapshot
            .communities
            .iter()
            .map(|community| community.id.as_str())
            .collect();
        assert_eq!(ids, vec!["2", "3", "1"]);
    }

    #[test]
    fn text_units_citing_filters_by_entity_id() {
        let unit = TextUnit {
            id: "t1".to_string(),
            text: "chunk".to_string(),
            n_tokens: 2,
            entity_ids: vec!["e1".to_string()],
        };
        let other = TextUnit {
            id: "t2".to_string(),
            entity_ids: vec!["e9".to_string()],
            ..unit.clone()
        };

        let snapshot = GenerationSnapshot::build(
            1,
            vec![entity("e1", "ACME", "ORGANIZATION", 1)],
            Vec::new(),
            Vec::new(),
            vec![unit, other],
            HashMap::new(),
        );

        let citing = snapshot.text_units_citing("e1");
        assert_eq!(citing.len(), 1);
        assert_eq!(citing[0].id, "t1");
    }
}
