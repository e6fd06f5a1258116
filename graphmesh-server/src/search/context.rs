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

//! Context assembly for the two retrieval modes.
//!
//! Global search reasons over community reports; local search reasons over
//! one entity's neighborhood and the text units citing it. Both produce a
//! prompt-ready context string plus a small structured summary the API can
//! return alongside the answer.

use serde_json::{json, Value};

use graphmesh_core::{Entity, GenerationSnapshot};

const MAX_GLOBAL_REPORTS: usize = 8;
const MAX_LOCAL_RELATIONSHIPS: usize = 10;
const MAX_LOCAL_TEXT_UNITS: usize = 3;
const MAX_TEXT_UNIT_CHARS: usize = 600;

pub struct AssembledContext {
    pub text: String,
    pub data: Value,
}

/// Community-level context: the highest-ranked reports at or below the
/// requested hierarchy level.
pub fn global_context(snapshot: &GenerationSnapshot, community_level: u64) -> AssembledContext {
    let reports: Vec<_> = snapshot
        .communities
        .iter()
        .filter(|community| community.level <= community_level)
        .take(MAX_GLOBAL_REPORTS)
        .collect();

    let mut text = String::new();
    for community in &reports {
        let body = if community.summary.is_empty() {
            &community.full_content
        } else {
            &community.summary
        };
        text.push_str(&format!(
            "## {} (rank {:.1})\n{}\n\n",
            community.title, community.rank, body
        ));
        for finding in community.findings.iter().take(3) {
            text.push_str(&format!("- {}\n", finding.summary));
        }
        text.push('\n');
    }

    let titles: Vec<&str> = reports
        .iter()
        .map(|community| community.title.as_str())
        .collect();

    AssembledContext {
        text,
        data: json!({ "communities": titles }),
    }
}

/// Entity-neighborhood context anchored on the best query match, falling
/// back to the most connected entity so a vague query still gets grounded
/// context.
pub fn local_context(snapshot: &GenerationSnapshot, query: &str) -> Option<AssembledContext> {
    let anchor = match_entity(snapshot, query)?;

    let mut neighbors = snapshot.neighbors(&anchor.id);
    neighbors.sort_by(|a, b| {
        b.1.weight
            .partial_cmp(&a.1.weight)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.title.cmp(&b.0.title))
    });

    let mut text = format!(
        "# {} ({})\n{}\n\n## Relationships\n",
        anchor.title, anchor.entity_type, anchor.description
    );
    for (_, relationship) in neighbors.iter().take(MAX_LOCAL_RELATIONSHIPS) {
        text.push_str(&format!(
            "- {} -> {}: {} (weight {:.1})\n",
            relationship.source, relationship.target, relationship.description, relationship.weight
        ));
    }

    let citing = snapshot.text_units_citing(&anchor.id);
    if !citing.is_empty() {
        text.push_str("\n## Source excerpts\n");
        for unit in citing.iter().take(MAX_LOCAL_TEXT_UNITS) {
            let excerpt: String = unit.text.chars().take(MAX_TEXT_UNIT_CHARS).collect();
            text.push_str(&format!("> {excerpt}\n\n"));
        }
    }

    let related: Vec<&str> = neighbors
        .iter()
        .take(MAX_LOCAL_RELATIONSHIPS)
        .map(|(neighbor, _)| neighbor.title.as_str())
        .collect();

    Some(AssembledContext {
        text,
        data: json!({ "entity": anchor.title, "related": related }),
    })
}

/// Picks the entity a query is about: the highest-degree entity whose title
/// occurs in the query (or vice versa for multi-word titles), else the
/// highest-degree entity overall.
fn match_entity<'a>(snapshot: &'a GenerationSnapshot, query: &str) -> Option<&'a Entity> {
    let query_lower = query.to_lowercase();

    let mut entities = snapshot.unique_titled_entities();
    entities.sort_by(|a, b| b.degree.cmp(&a.degree).then_with(|| a.id.cmp(&b.id)));

    entities
        .iter()
        .find(|entity| {
            let title_lower = entity.title.to_lowercase();
            !title_lower.is_empty()
                && (query_lower.contains(&title_lower)
                    || title_lower
                        .split_whitespace()
                        .any(|word| word.len() > 2 && query_lower.contains(word)))
        })
        .copied()
        .or_else(|| entities.first().copied())
}
