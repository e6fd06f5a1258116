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

//! Graph topology projector: reduces a generation to the bounded node/link
//! view the force-directed renderer consumes. Node ids are entity titles so
//! link endpoints key directly into the node set.

use std::collections::HashSet;

use serde::Serialize;

use graphmesh_core::{Entity, GenerationSnapshot};

pub const DEFAULT_NODE_LIMIT: usize = 30;

const MIN_NODE_VAL: u64 = 8;
const MAX_NODE_VAL: u64 = 40;
const GROUP_BUCKETS: u32 = 5;

#[derive(Debug, Clone, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub group: u32,
    pub val: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphLink {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopologyStats {
    pub total_entities: usize,
    pub total_relationships: usize,
    pub total_communities: usize,
    pub displayed_nodes: usize,
    pub displayed_links: usize,
    #[serde(rename = "isEmpty")]
    pub is_empty: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopologyView {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
    pub stats: TopologyStats,
}

/// The empty-state view served while no generation exists.
pub fn empty_view() -> TopologyView {
    TopologyView {
        nodes: Vec::new(),
        links: Vec::new(),
        stats: TopologyStats {
            total_entities: 0,
            total_relationships: 0,
            total_communities: 0,
            displayed_nodes: 0,
            displayed_links: 0,
            is_empty: true,
        },
    }
}

/// Projects the top `limit` entities by degree (ties toward the smaller id)
/// plus every relationship whose endpoints both survive the cut.
pub fn project(snapshot: &GenerationSnapshot, limit: usize) -> TopologyView {
    if snapshot.is_empty() {
        return empty_view();
    }

    let mut candidates: Vec<&Entity> = snapshot.unique_titled_entities();
    candidates.sort_by(|a, b| b.degree.cmp(&a.degree).then_with(|| a.id.cmp(&b.id)));
    candidates.truncate(limit);

    let nodes: Vec<GraphNode> = candidates
        .iter()
        .map(|entity| GraphNode {
            id: entity.title.clone(),
            group: type_group(&entity.entity_type),
            val: entity.degree.clamp(MIN_NODE_VAL, MAX_NODE_VAL),
        })
        .collect();

    let selected: HashSet<&str> = nodes.iter().map(|node| node.id.as_str()).collect();

    let links: Vec<GraphLink> = snapshot
        .relationships
        .iter()
        .filter(|relationship| {
            selected.contains(relationship.source.as_str())
                && selected.contains(relationship.target.as_str())
        })
        .map(|relationship| GraphLink {
            source: relationship.source.clone(),
            target: relationship.target.clone(),
        })
        .collect();

    let stats = TopologyStats {
        total_entities: snapshot.entities.len(),
        total_relationships: snapshot.relationships.len(),
        total_communities: snapshot.communities.len(),
        displayed_nodes: nodes.len(),
        displayed_links: links.len(),
        is_empty: false,
    };

    TopologyView {
        nodes,
        links,
        stats,
    }
}

/// Stable bucket for an entity type. FNV-1a keeps the assignment identical
/// across processes and runs.
fn type_group(entity_type: &str) -> u32 {
    let mut hash: u32 = 0x811c_9dc5;
    for byte in entity_type.to_uppercase().bytes() {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash % GROUP_BUCKETS + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphmesh_core::Relationship;
    use std::collections::HashMap;

    fn entity(id: &str, title: &str, degree: u64) -> Entity {
        Entity {
            id: id.to_string(),
            human_readable_id: String::new(),
            title: title.to_string(),
            entity_type: "PERSON".to_string(),
            description: String::new(),
            degree,
        }
    }

    fn relationship(source: &str, target: &str) -> Relationship {
        Relationship {
            id: format!("{source}-{target}"),
            human_readable_id: String::new(),
            source: source.to_string(),
            target: target.to_string(),
            description: String::new(),
            weight: 1.0,
            source_degree: 0,
            target_degree: 0,
        }
    }

    fn snapshot(entities: Vec<Entity>, relationships: Vec<Relationship>) -> GenerationSnapshot {
        GenerationSnapshot::build(1, entities, relationships, Vec::new(), Vec::new(), HashMap::new())
    }

    #[test]
    fn empty_generation_projects_the_empty_view() {
        let view = project(&snapshot(Vec::new(), Vec::new()), DEFAULT_NODE_LIMIT);
        assert!(view.nodes.is_empty());
        assert!(view.links.is_empty());
        assert!(view.stats.is_empty);
    }

    #[test]
    fn projection_is_bounded_and_links_stay_inside_the_node_set() {
        let entities: Vec<Entity> = (0..45)
            .map(|i| entity(&format!("e{i:02}"), &format!("Entity {i:02}"), i as u64))
            .collect();
        let relationships: Vec<Relationship> = (0..44)
            .map(|i| relationship(&format!("Entity {i:02}"), &format!("Entity {:02}", i + 1)))
            .collect();

        let view = project(&snapshot(entities, relationships), DEFAULT_NODE_LIMIT);
        assert_eq!(view.nodes.len(), 30);
        assert_eq!(view.stats.total_entities, 45);
        assert_eq!(view.stats.displayed_nodes, 30);
        assert!(!view.stats.is_empty);

        let ids: HashSet<&str> = view.nodes.iter().map(|node| node.id.as_str()).collect();
        for link in &view.links {
            assert!(ids.contains(link.source.as_str()));
            assert!(ids.contains(link.target.as_str()));
        }
    }

    #[test]
    fn selection_prefers_degree_then_smaller_id() {
        let view = project(
            &snapshot(
                vec![
                    entity("e3", "C", 1),
                    entity("e1", "A", 5),
                    entity("e2", "B", 5),
                ],
                Vec::new(),
            ),
            2,
        );

        let ids: Vec<&str> = view.nodes.iter().map(|node| node.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);
    }

    #[test]
    fn node_size_is_floored_and_capped() {
        let view = project(
            &snapshot(
                vec![entity("e1", "SMALL", 0), entity("e2", "HUGE", 120)],
                Vec::new(),
            ),
            10,
        );

        let by_id: HashMap<&str, u64> = view
            .nodes
            .iter()
            .map(|node| (node.id.as_str(), node.val))
            .collect();
        assert_eq!(by_id["SMALL"], 8);
        assert_eq!(by_id["HUGE"], 40);
    }

    #[test]
    fn type_groups_are_stable_and_in_range() {
        let first = type_group("ORGANIZATION");
        assert_eq!(first, type_group("organization"));
        for entity_type in ["PERSON", "EVENT", "GEO", "ORGANIZATION", ""] {
            let group = type_group(entity_type);
            assert!((1..=GROUP_BUCKETS).contains(&group));
        }
    }
}
