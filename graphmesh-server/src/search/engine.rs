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

//! The production [`SearchEngine`]: context assembly plus one chat
//! completion against the local OpenAI-compatible inference server.
//!
//! The indexer's settings.yaml names the endpoint and model. It is re-read
//! on every call, so a settings change published together with a new
//! artifact generation takes effect without a restart.

use std::path::PathBuf;
use std::sync::Arc;

use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use tracing::info;

use graphmesh_core::{GenerationSnapshot, IndexerSettings};

use super::context::{global_context, local_context, AssembledContext};
use super::{SearchEngine, SearchMode, SearchRequest, SearchResponse};

pub struct LlmSearchEngine {
    settings_path: PathBuf,
}

impl LlmSearchEngine {
    /// Verifies the settings file is loadable up front; later calls re-read
    /// it so edits are picked up on the next search.
    pub fn new(settings_path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let settings_path = settings_path.into();
        let settings = IndexerSettings::load(&settings_path)?;
        info!(
            api_base = %settings.llm.api_base,
            model = %settings.llm.model,
            "search engine configured"
        );
        Ok(Self { settings_path })
    }

    fn client(settings: &IndexerSettings) -> Client<OpenAIConfig> {
        let mut config = OpenAIConfig::new().with_api_base(settings.llm.api_base.clone());
        if let Some(api_key) = &settings.llm.api_key {
            config = config.with_api_key(api_key.clone());
        }
        Client::with_config(config)
    }

    async fn complete(
        &self,
        context: AssembledContext,
        request: &SearchRequest,
        mode: SearchMode,
    ) -> anyhow::Result<SearchResponse> {
        let settings = IndexerSettings::load(&self.settings_path)?;
        let client = Self::client(&settings);

        let scope = match mode {
            SearchMode::Global => "community reports from a knowledge graph",
            SearchMode::Local => "an entity neighborhood from a knowledge graph",
        };
        let system = format!(
            "You are a knowledge-graph analyst. Answer the question using only the provided \
             context ({scope}). If the context does not contain the answer, say so. \
             Respond as: {}.",
            request.response_type
        );
        let user = format!("Context:\n{}\n\nQuestion: {}", context.text, request.query);

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system)
                .build()?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user)
                .build()?
                .into(),
        ];

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&settings.llm.model)
            .messages(messages)
            .build()?;

        let completion = client.chat().create(chat_request).await?;
        let response = completion
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .unwrap_or_default();

        Ok(SearchResponse {
            response,
            context: Some(context.data),
        })
    }
}

#[async_trait]
impl SearchEngine for LlmSearchEngine {
    async fn search(
        &self,
        mode: SearchMode,
        snapshot: Arc<GenerationSnapshot>,
        request: &SearchRequest,
    ) -> anyhow::Result<SearchResponse> {
        let context = match mode {
            SearchMode::Global => global_context(&snapshot, request.community_level),
            SearchMode::Local => local_context(&snapshot, &request.query)
                .unwrap_or_else(|| global_context(&snapshot, request.community_level)),
        };
        self.complete(context, request, mode).await
    }
}
