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

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::{ApiError, AppState};
use crate::search::{SearchRequest, SearchResponse};

#[derive(Debug, Serialize)]
pub struct SuggestionsBody {
    pub suggestions: Vec<String>,
}

/// POST /api/search/global - community-level retrieval.
pub async fn global_search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    state.search.global(request).await.map(Json)
}

/// POST /api/search/local - entity-neighborhood retrieval.
pub async fn local_search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    state.search.local(request).await.map(Json)
}

/// GET /api/search/suggestions
pub async fn search_suggestions(State(state): State<AppState>) -> Json<SuggestionsBody> {
    Json(SuggestionsBody {
        suggestions: state.search.suggestions(),
    })
}
