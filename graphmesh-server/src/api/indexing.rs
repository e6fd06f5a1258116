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
use crate::supervisor::JobStatus;

#[derive(Debug, Serialize)]
pub struct IndexingStatusBody {
    pub is_indexing: bool,
    pub progress: u8,
    pub message: String,
}

impl From<JobStatus> for IndexingStatusBody {
    fn from(status: JobStatus) -> Self {
        Self {
            is_indexing: status.is_running,
            progress: status.progress,
            message: status.message,
        }
    }
}

/// POST /api/indexing/start - accepts unless a job is already running.
pub async fn start_indexing(
    State(state): State<AppState>,
) -> Result<Json<IndexingStatusBody>, ApiError> {
    let status = state
        .supervisor
        .start()
        .map_err(|rejection| ApiError::Conflict(rejection.to_string()))?;
    Ok(Json(status.into()))
}

/// GET /api/indexing/status
pub async fn indexing_status(State(state): State<AppState>) -> Json<IndexingStatusBody> {
    Json(state.supervisor.status().into())
}
