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

//! Parquet fixtures shared by unit tests that need a real generation on
//! disk.

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

/// Writes a two-entity, one-relationship generation (ACME and EXPO) into
/// `dir`, complete enough for the store to load it.
pub(crate) fn write_minimal_generation(dir: &Path) {
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
                Arc::new(StringArray::from(vec!["e1", "e2"])) as ArrayRef,
                Arc::new(StringArray::from(vec!["ACME", "EXPO"])),
                Arc::new(StringArray::from(vec!["ORGANIZATION", "EVENT"])),
                Arc::new(StringArray::from(vec!["a company", "a trade fair"])),
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
                Arc::new(StringArray::from(vec!["ACME", "EXPO"])) as ArrayRef,
                Arc::new(Float64Array::from(vec![2.0, 1.0])),
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
                Arc::new(StringArray::from(vec!["r1"])) as ArrayRef,
                Arc::new(StringArray::from(vec!["ACME"])),
                Arc::new(StringArray::from(vec!["EXPO"])),
                Arc::new(StringArray::from(vec!["exhibits at"])),
                Arc::new(Float64Array::from(vec![4.0])),
            ],
        )
        .unwrap(),
    );

    let report_schema = Arc::new(Schema::new(vec![
        string_field("id"),
        string_field("title"),
        Field::new("rank", DataType::Float64, true),
        string_field("summary"),
    ]));
    write_batch(
        dir,
        "create_final_community_reports.parquet",
        RecordBatch::try_new(
            report_schema,
            vec![
                Arc::new(StringArray::from(vec!["0"])) as ArrayRef,
                Arc::new(StringArray::from(vec!["Trade events"])),
                Arc::new(Float64Array::from(vec![7.5])),
                Arc::new(StringArray::from(vec!["companies and their fairs"])),
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
                Arc::new(StringArray::from(vec!["0"])) as ArrayRef,
                Arc::new(StringArray::from(vec!["Community 0"])),
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
                Arc::new(StringArray::from(vec!["t1"])) as ArrayRef,
                Arc::new(StringArray::from(vec!["ACME exhibited at EXPO."])),
            ],
        )
        .unwrap(),
    );
}
