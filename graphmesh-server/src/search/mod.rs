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

//! Search Gateway: the bounded, cancellable front of the retrieval engine.
//!
//! The gateway owns the request policy (non-empty query, an index must
//! exist, a hard per-call deadline) and wraps engine failures with their
//! original message preserved. The engine itself sits behind the
//! [`SearchEngine`] trait so tests run against a stub and the production
//! build talks to the local inference server.

pub mod context;
pub mod engine;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use graphmesh_core::{ArtifactStore, GenerationSnapshot};

use crate::api::ApiError;

pub const DEFAULT_COMMUNITY_LEVEL: u64 = 2;
pub const DEFAULT_RESPONSE_TYPE: &str = "Multiple Paragraphs";
const SUGGESTION_COUNT: usize = 4;

#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default = "default_community_level")]
    pub community_level: u64,
    #[serde(default = "default_response_type")]
    pub response_type: String,
}

fn default_community_level() -> u64 {
    DEFAULT_COMMUNITY_LEVEL
}

fn default_response_type() -> String {
    DEFAULT_RESPONSE_TYPE.to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    Global,
    Local,
}

/// The retrieval engine seam. Implementations receive the snapshot the
/// gateway resolved, so one request never mixes generations.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    async fn search(
        &self,
        mode: SearchMode,
        snapshot: Arc<GenerationSnapshot>,
        request: &SearchRequest,
    ) -> anyhow::Result<SearchResponse>;
}

pub struct SearchGateway {
    engine: Arc<dyn SearchEngine>,
    store: Arc<ArtifactStore>,
    deadline: Duration,
}

impl SearchGateway {
    pub fn new(engine: Arc<dyn SearchEngine>, store: Arc<ArtifactStore>, deadline: Duration) -> Self {
        Self {
            engine,
            store,
            deadline,
        }
    }

    pub async fn global(&self, request: SearchRequest) -> Result<SearchResponse, ApiError> {
        self.run(SearchMode::Global, request).await
    }

    pub async fn local(&self, request: SearchRequest) -> Result<SearchResponse, ApiError> {
        self.run(SearchMode::Local, request).await
    }

    async fn run(
        &self,
        mode: SearchMode,
        request: SearchRequest,
    ) -> Result<SearchResponse, ApiError> {
        if request.query.trim().is_empty() {
            return Err(ApiError::Validation("query cannot be empty".to_string()));
        }

        let snapshot = self.store.snapshot().ok_or_else(|| {
            ApiError::NotReady(
                "knowledge graph index is not ready yet; upload a document and start indexing"
                    .to_string(),
            )
        })?;

        match tokio::time::timeout(self.deadline, self.engine.search(mode, snapshot, &request))
            .await
        {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(ApiError::Upstream(format!("search failed: {e}"))),
            Err(_) => Err(ApiError::Timeout(format!(
                "search did not complete within {} seconds",
                self.deadline.as_secs()
            ))),
        }
    }

    /// Up to four query prompts for the UI, derived from the most connected
    /// entities when a generation exists, padded with generic prompts
    /// otherwise.
    pub fn suggestions(&self) -> Vec<String> {
        let mut suggestions = Vec::with_capacity(SUGGESTION_COUNT);

        if let Some(snapshot) = self.store.snapshot() {
            let mut entities = snapshot.unique_titled_entities();
            entities.sort_by(|a, b| b.degree.cmp(&a.degree).then_with(|| a.id.cmp(&b.id)));
            for entity in entities {
                if entity.title.len() > 2 {
                    suggestions.push(format!(
                        "Tell me about {} and its closest connections",
                        entity.title
                    ));
                }
                if suggestions.len() >= SUGGESTION_COUNT {
                    break;
                }
            }
        }

        for generic in [
            "Summarize the core concepts in the indexed documents",
            "Describe how the key entities relate to each other",
            "Outline the main communities in the knowledge graph",
            "Explore the dominant themes across the corpus",
        ] {
            if suggestions.len() >= SUGGESTION_COUNT {
                break;
            }
            suggestions.push(generic.to_string());
        }

        suggestions
    }
}
