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

use thiserror::Error;

/// Errors produced by the artifact store and settings loader.
///
/// `ArtifactsMissing` is the expected state of a fresh deployment and callers
/// are expected to render it as an empty-state result rather than a failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no artifacts available in {dir}")]
    ArtifactsMissing { dir: String },

    #[error("failed to read {file}: {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {file}: {message}")]
    Decode { file: String, message: String },

    #[error("failed to load settings from {path}: {message}")]
    Settings { path: String, message: String },
}

impl StoreError {
    pub fn is_missing(&self) -> bool {
        matches!(self, StoreError::ArtifactsMissing { .. })
    }
}
