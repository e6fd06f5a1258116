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

//! Writes complete artifact generations for the end-to-end scenarios.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

fn write_batch(dir: &Path, name: &str, batch: RecordBatch) {
    let file = File::create(dir.join(name)).unwrap();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
}

fn string_field(name: &str) -> Field {
    Field::new(name, DataType::Utf8, true)
}

fn string_column(values: Vec<String>) -> ArrayRef {
    Arc::new(StringArray::from(values)) as ArrayRef
}

/// Writes a full artifact set into `dir`: the given entities
/// `(id, title, type, degree)` and relationships
/// `(id, source, target, weight)`, plus one community report and one text
/// unit so every required file exists.
pub fn write_generation(
    dir: &Path,
    entities: &[(&str, &str, &str, u64)],
    relationships: &[(&str, &str, &str, f64)],
) {
    std::fs::create_dir_all(dir).unwrap();

    let entity_schema = Arc::new(Schema::new(vec![
        string_field("id"),
        string_field("title"),
        string_field("type"),
        string_field("description"),
    ]));
    write_batch(
        dir,
        "create_final_entities.parquet",
        RecordBatch::try_new(
            entity_schema,
            vec![
                string_column(entities.iter().map(|e| e.0.to_string()).collect()),
                string_column(entities.iter().map(|e| e.1.to_string()).collect()),
                string_column(entities.iter().map(|e| e.2.to_string()).collect()),
                string_column(
                    entities
                        .iter()
                        .map(|e| format!("{} description", e.1))
                        .collect(),
                ),
            ],
        )
        .unwrap(),
    );

    let node_schema = Arc::new(Schema::new(vec![
        string_field("title"),
        Field::new("degree", DataType::Float64, true),
    ]));
    write_batch(
        dir,
        "create_final_nodes.parquet",
        RecordBatch::try_new(
            node_schema,
            vec![
                string_column(entities.iter().map(|e| e.1.to_string()).collect()),
                Arc::new(Float64Array::from(
                    entities.iter().map(|e| e.3 as f64).collect::<Vec<f64>>(),
                )) as ArrayRef,
            ],
        )
        .unwrap(),
    );

    let relationship_schema = Arc::new(Schema::new(vec![
        string_field("id"),
        string_field("source"),
        string_field("target"),
        string_field("description"),
        Field::new("weight", DataType::Float64, true),
    ]));
    write_batch(
        dir,
        "create_final_relationships.parquet",
        RecordBatch::try_new(
            relationship_schema,
            vec![
                string_column(relationships.iter().map(|r| r.0.to_string()).collect()),
                string_column(relationships.iter().map(|r| r.1.to_string()).collect()),
                string_column(relationships.iter().map(|r| r.2.to_string()).collect()),
                string_column(
                    relationships
                        .iter()
                        .map(|r| format!("{} to {}", r.1, r.2))
                        .collect(),
                ),
                Arc::new(Float64Array::from(
                    relationships.iter().map(|r| r.3).collect::<Vec<f64>>(),
                )) as ArrayRef,
            ],
        )
        .unwrap(),
    );

    let report_schema = Arc::new(Schema::new(vec![
        string_field("id"),
        string_field("title"),
        Field::new("level", DataType::Float64, true),
        Field::new("rank", DataType::Float64, true),
        string_field("summary"),
    ]));
    write_batch(
        dir,
        "create_final_community_reports.parquet",
        RecordBatch::try_new(
            report_schema,
            vec![
                string_column(vec!["0".to_string()]),
                string_column(vec!["Trade events".to_string()]),
                Arc::new(Float64Array::from(vec![0.0])) as ArrayRef,
                Arc::new(Float64Array::from(vec![7.5])) as ArrayRef,
                string_column(vec!["a cluster of related entities".to_string()]),
            ],
        )
        .unwrap(),
    );

    let community_schema = Arc::new(Schema::new(vec![string_field("id"), string_field("title")]));
    write_batch(
        dir,
        "create_final_communities.parquet",
        RecordBatch::try_new(
            community_schema,
            vec![
                string_column(vec!["0".to_string()]),
                string_column(vec!["Community 0".to_string()]),
            ],
        )
        .unwrap(),
    );

    let unit_schema = Arc::new(Schema::new(vec![string_field("id"), string_field("text")]));
    write_batch(
        dir,
        "create_final_text_units.parquet",
        RecordBatch::try_new(
            unit_schema,
            vec![
                string_column(vec!["t1".to_string()]),
                string_column(vec!["a small chunk of source text".to_string()]),
            ],
        )
        .unwrap(),
    );
}
