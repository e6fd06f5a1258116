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

//! HTTP edge: shared application state, the error taxonomy, and its mapping
//! to status codes. Handlers live in the sibling modules; components below
//! this layer return typed errors and never see HTTP.

pub mod analytics;
pub mod files;
pub mod graph;
pub mod health;
pub mod indexing;
pub mod search;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use graphmesh_core::{ArtifactStore, StoreError};

use crate::cache::MetricsCache;
use crate::config::ServerConfig;
use crate::search::SearchGateway;
use crate::supervisor::IndexSupervisor;
use crate::uploads::UploadIntake;

/// Shared application state. Each mutable sub-state has a single owner: the
/// supervisor owns the job record, the store owns the generation pointer, and
/// the intake owns the upload registry.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub store: Arc<ArtifactStore>,
    pub cache: Arc<MetricsCache>,
    pub supervisor: Arc<IndexSupervisor>,
    pub uploads: Arc<UploadIntake>,
    pub search: Arc<SearchGateway>,
}

/// API error taxonomy. Components return these (or errors convertible into
/// them); this is the only layer that knows which HTTP status each kind maps
/// to.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotReady(String),

    #[error("{0}")]
    Timeout(String),

    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotReady(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::NotReady(_) => "not_ready",
            ApiError::Timeout(_) => "timeout",
            ApiError::Upstream(_) => "upstream",
            ApiError::Internal(_) => "internal",
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
    kind: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(kind = self.kind(), "{self}");
        }
        let body = ErrorBody {
            detail: self.to_string(),
            kind: self.kind(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::ArtifactsMissing { .. } => ApiError::NotReady(
                "knowledge graph index is not ready yet; upload a document and start indexing"
                    .to_string(),
            ),
            other => ApiError::Internal(other.to_string()),
        }
    }
}
