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

//! Read side of the Graphmesh knowledge graph.
//!
//! The indexer subprocess publishes its output as a set of parquet files.
//! This crate decodes those files into typed records, assembles them into an
//! immutable [`GenerationSnapshot`], and exposes the snapshot through the
//! [`ArtifactStore`] so many concurrent readers can share one generation
//! while the next one is being produced.

pub mod artifacts;
pub mod error;
pub mod records;
pub mod settings;
pub mod snapshot;
pub mod store;

pub use error::StoreError;
pub use records::{Community, Entity, Finding, Relationship, TextUnit};
pub use settings::IndexerSettings;
pub use snapshot::GenerationSnapshot;
pub use store::ArtifactStore;
