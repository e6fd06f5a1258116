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

//! Model of the indexer's `settings.yaml`.
//!
//! The file belongs to the indexer; this backend only needs the inference
//! endpoint and model names out of it, so unknown keys are ignored and every
//! block falls back to local-server defaults.

use std::path::Path;

use serde::Deserialize;

use crate::error::StoreError;

#[derive(Debug, Clone, Deserialize)]
pub struct IndexerSettings {
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub embeddings: EmbeddingsSettings,
    #[serde(default)]
    pub chunks: ChunkSettings,
}

/// Chat model block. `api_base` points at an OpenAI-compatible server.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSettings {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_chat_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct EmbeddingsSettings {
    #[serde(default)]
    pub llm: EmbeddingModelSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingModelSettings {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChunkSettings {
    #[serde(default = "default_chunk_size")]
    pub size: u32,
    #[serde(default = "default_chunk_overlap")]
    pub overlap: u32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            model: default_chat_model(),
            api_key: None,
        }
    }
}

impl Default for EmbeddingModelSettings {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            model: default_embedding_model(),
        }
    }
}

impl Default for ChunkSettings {
    fn default() -> Self {
        Self {
            size: default_chunk_size(),
            overlap: default_chunk_overlap(),
        }
    }
}

impl Default for IndexerSettings {
    fn default() -> Self {
        Self {
            llm: LlmSettings::default(),
            embeddings: EmbeddingsSettings::default(),
            chunks: ChunkSettings::default(),
        }
    }
}

fn default_api_base() -> String {
    "http://localhost:1234/v1".to_string()
}

fn default_chat_model() -> String {
    "local-model".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-local".to_string()
}

fn default_chunk_size() -> u32 {
    1200
}

fn default_chunk_overlap() -> u32 {
    100
}

impl IndexerSettings {
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let contents = std::fs::read_to_string(path).map_err(|e| StoreError::Settings {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        serde_yaml::from_str(&contents).map_err(|e| StoreError::Settings {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}
