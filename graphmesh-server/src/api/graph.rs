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

use axum::extract::{Path, State};
use axum::Json;

use crate::api::{ApiError, AppState};
use crate::metrics::EntityAnalysis;
use crate::topology::{self, TopologyView, DEFAULT_NODE_LIMIT};

/// GET /api/graph/topology - the bounded node/link view for rendering.
pub async fn graph_topology(State(state): State<AppState>) -> Json<TopologyView> {
    match state.store.snapshot() {
        Some(snapshot) => Json(topology::project(&snapshot, DEFAULT_NODE_LIMIT)),
        None => Json(topology::empty_view()),
    }
}

/// GET /api/graph/entity/{id} - structural analysis of one entity.
pub async fn entity_analysis(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EntityAnalysis>, ApiError> {
    let snapshot = state.store.snapshot().ok_or_else(|| {
        ApiError::NotReady(
            "knowledge graph index is not ready yet; upload a document and start indexing"
                .to_string(),
        )
    })?;

    let analysis = state
        .cache
        .entity_analysis(&snapshot, &id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("entity '{id}' not found")))?;

    Ok(Json((*analysis).clone()))
}
