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

//! Analytics endpoints over the current generation. All of them render a
//! zero-valued empty state when no generation exists, so a fresh deployment
//! gets a usable dashboard rather than errors.

use std::collections::BTreeMap;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use graphmesh_core::Community;

use crate::api::{ApiError, AppState};
use crate::metrics::{
    CollectionTotal, EntityStatistics, RankedRelationship, RelationshipStatistics, Statistics,
    TypeCount, WeightStats, DEFAULT_TOP_RELATIONSHIPS,
};

const EMPTY_STATE_MESSAGE: &str = "no artifacts available; upload a document and start indexing";

#[derive(Debug, Serialize)]
pub struct StatisticsResponse {
    #[serde(flatten)]
    pub statistics: Statistics,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct EntityTypesResponse {
    pub types: Vec<TypeCount>,
    pub total_entities: usize,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct TopRelationshipsResponse {
    pub relationships: Vec<RankedRelationship>,
    pub total: usize,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct CommunitiesResponse {
    pub communities: Vec<Community>,
    pub total: usize,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct CommunitiesQuery {
    pub max_level: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct TopRelationshipsQuery {
    pub limit: Option<usize>,
}

/// GET /api/statistics
pub async fn statistics(State(state): State<AppState>) -> Result<Json<StatisticsResponse>, ApiError> {
    let Some(snapshot) = state.store.snapshot() else {
        return Ok(Json(StatisticsResponse {
            statistics: empty_statistics(),
            message: EMPTY_STATE_MESSAGE.to_string(),
        }));
    };

    let statistics = state.cache.statistics(&snapshot).await;
    Ok(Json(StatisticsResponse {
        statistics: (*statistics).clone(),
        message: format!("statistics for generation {}", snapshot.generation),
    }))
}

/// GET /api/entity-types
pub async fn entity_types(
    State(state): State<AppState>,
) -> Result<Json<EntityTypesResponse>, ApiError> {
    let Some(snapshot) = state.store.snapshot() else {
        return Ok(Json(EntityTypesResponse {
            types: Vec::new(),
            total_entities: 0,
            message: EMPTY_STATE_MESSAGE.to_string(),
        }));
    };

    let histogram = state.cache.entity_type_histogram(&snapshot).await;
    Ok(Json(EntityTypesResponse {
        types: (*histogram).clone(),
        total_entities: snapshot.entities.len(),
        message: format!("{} entity types", histogram.len()),
    }))
}

/// GET /api/relationships/top
pub async fn top_relationships(
    State(state): State<AppState>,
    Query(query): Query<TopRelationshipsQuery>,
) -> Result<Json<TopRelationshipsResponse>, ApiError> {
    let Some(snapshot) = state.store.snapshot() else {
        return Ok(Json(TopRelationshipsResponse {
            relationships: Vec::new(),
            total: 0,
            message: EMPTY_STATE_MESSAGE.to_string(),
        }));
    };

    let limit = query.limit.unwrap_or(DEFAULT_TOP_RELATIONSHIPS);
    let ranked = state.cache.top_relationships(&snapshot, limit).await;
    Ok(Json(TopRelationshipsResponse {
        relationships: (*ranked).clone(),
        total: snapshot.relationships.len(),
        message: format!("top {} relationships by weight", ranked.len()),
    }))
}

/// GET /api/communities
pub async fn communities(
    State(state): State<AppState>,
    Query(query): Query<CommunitiesQuery>,
) -> Result<Json<CommunitiesResponse>, ApiError> {
    let Some(snapshot) = state.store.snapshot() else {
        return Ok(Json(CommunitiesResponse {
            communities: Vec::new(),
            total: 0,
            message: EMPTY_STATE_MESSAGE.to_string(),
        }));
    };

    let communities: Vec<Community> = snapshot
        .communities
        .iter()
        .filter(|community| query.max_level.map_or(true, |level| community.level <= level))
        .cloned()
        .collect();
    let total = communities.len();

    Ok(Json(CommunitiesResponse {
        communities,
        total,
        message: format!("{total} communities"),
    }))
}

fn empty_statistics() -> Statistics {
    Statistics {
        entities: EntityStatistics {
            total: 0,
            types: BTreeMap::new(),
        },
        relationships: RelationshipStatistics {
            total: 0,
            weight_stats: WeightStats {
                min: 0.0,
                max: 0.0,
                mean: 0.0,
                median: 0.0,
            },
        },
        communities: CollectionTotal { total: 0 },
        text_units: CollectionTotal { total: 0 },
        graph_density: 0.0,
    }
}
