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

//! Artifact file inventory and parquet row decoding.
//!
//! Rows are decoded by streaming each record batch through the arrow JSON
//! writer and deserializing the resulting objects with serde. That keeps
//! list- and struct-typed columns (findings, entity id lists) on the same
//! path as scalar columns instead of hand-written per-type readers.

use std::fs::File;
use std::path::Path;

use arrow::json::ArrayWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::de::DeserializeOwned;

use crate::error::StoreError;

pub const ENTITIES_FILE: &str = "create_final_entities.parquet";
pub const RELATIONSHIPS_FILE: &str = "create_final_relationships.parquet";
pub const COMMUNITIES_FILE: &str = "create_final_communities.parquet";
pub const COMMUNITY_REPORTS_FILE: &str = "create_final_community_reports.parquet";
pub const TEXT_UNITS_FILE: &str = "create_final_text_units.parquet";
pub const NODES_FILE: &str = "create_final_nodes.parquet";

/// Every file one successful indexing run is expected to publish. A directory
/// missing any of them holds no usable generation; a partial set is never
/// surfaced as a partial generation.
pub const REQUIRED_FILES: [&str; 6] = [
    ENTITIES_FILE,
    RELATIONSHIPS_FILE,
    COMMUNITIES_FILE,
    COMMUNITY_REPORTS_FILE,
    TEXT_UNITS_FILE,
    NODES_FILE,
];

/// Whether `dir` holds a complete artifact set.
pub fn artifacts_present(dir: &Path) -> bool {
    REQUIRED_FILES.iter().all(|name| dir.join(name).is_file())
}

/// Reads every row of one parquet artifact into `T`.
pub fn read_rows<T: DeserializeOwned>(dir: &Path, name: &str) -> Result<Vec<T>, StoreError> {
    let path = dir.join(name);
    let file = File::open(&path).map_err(|source| StoreError::Io {
        file: name.to_string(),
        source,
    })?;

    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .and_then(|builder| builder.build())
        .map_err(|e| StoreError::Decode {
            file: name.to_string(),
            message: e.to_string(),
        })?;

    let mut writer = ArrayWriter::new(Vec::new());
    for batch in reader {
        let batch = batch.map_err(|e| StoreError::Decode {
            file: name.to_string(),
            message: e.to_string(),
        })?;
        writer.write(&batch).map_err(|e| StoreError::Decode {
            file: name.to_string(),
            message: e.to_string(),
        })?;
    }
    writer.finish().map_err(|e| StoreError::Decode {
        file: name.to_string(),
        message: e.to_string(),
    })?;

    let buffer = writer.into_inner();
    if buffer.is_empty() {
        return Ok(Vec::new());
    }

    serde_json::from_slice(&buffer).map_err(|e| StoreError::Decode {
        file: name.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Entity;
    use arrow::array::{ArrayRef, Float64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn write_entity_fixture(dir: &Path) {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("title", DataType::Utf8, false),
            Field::new("type", DataType::Utf8, true),
            Field::new("degree", DataType::Float64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["e1", "e2"])) as ArrayRef,
                Arc::new(StringArray::from(vec!["ACME", "EXPO"])),
                Arc::new(StringArray::from(vec![Some("ORGANIZATION"), None])),
                Arc::new(Float64Array::from(vec![Some(3.0), None])),
            ],
        )
        .unwrap();

        let file = File::create(dir.join(ENTITIES_FILE)).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
    }

    #[test]
    fn reads_typed_rows_with_null_tolerance() {
        let dir = TempDir::new().unwrap();
        write_entity_fixture(dir.path());

        let entities: Vec<Entity> = read_rows(dir.path(), ENTITIES_FILE).unwrap();
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].title, "ACME");
        assert_eq!(entities[0].entity_type, "ORGANIZATION");
        assert_eq!(entities[0].degree, 3);
        assert_eq!(entities[1].entity_type, "");
        assert_eq!(entities[1].degree, 0);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = TempDir::new().unwrap();
        let result: Result<Vec<Entity>, _> = read_rows(dir.path(), ENTITIES_FILE);
        assert!(matches!(result, Err(StoreError::Io { .. })));
    }

    #[test]
    fn partial_directory_is_not_present() {
        let dir = TempDir::new().unwrap();
        write_entity_fixture(dir.path());
        assert!(!artifacts_present(dir.path()));
    }
}
