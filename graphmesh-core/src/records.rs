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

//! Typed records for the graph rows the indexer emits.
//!
//! The parquet output is schema-loose: numeric columns show up as int64,
//! float64, or strings depending on the indexer version, and nullable columns
//! are common. Every numeric field here tolerates all of those shapes and
//! collapses null / non-finite values to zero, so no `"nan"` ever leaks into
//! an API response.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A named unit (organization, person, event, concept) extracted from the
/// source text. `degree` is the relationship count used as a cheap centrality
/// measure; it is joined in from the nodes table during snapshot assembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    #[serde(default)]
    pub id: String,
    #[serde(default, deserialize_with = "de_string_lossy")]
    pub human_readable_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "type")]
    pub entity_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "de_u64_lossy")]
    pub degree: u64,
}

/// A weighted edge between two entities, keyed by entity title on both ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(default)]
    pub id: String,
    #[serde(default, deserialize_with = "de_string_lossy")]
    pub human_readable_id: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "de_f64_lossy")]
    pub weight: f64,
    #[serde(default, deserialize_with = "de_u64_lossy")]
    pub source_degree: u64,
    #[serde(default, deserialize_with = "de_u64_lossy")]
    pub target_degree: u64,
}

/// One community report: a cluster of entities with a generated summary and
/// importance rank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Community {
    #[serde(default, deserialize_with = "de_string_lossy")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "de_u64_lossy")]
    pub level: u64,
    #[serde(default, deserialize_with = "de_f64_lossy")]
    pub rank: f64,
    #[serde(default, deserialize_with = "de_f64_lossy")]
    pub rating: f64,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub full_content: String,
    #[serde(default)]
    pub rank_explanation: String,
    #[serde(default, deserialize_with = "de_findings")]
    pub findings: Vec<Finding>,
}

/// A single community finding. The indexer emits these either as bare strings
/// or as `{summary, explanation}` records; bare strings normalize to a record
/// with an empty explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub explanation: String,
}

/// A token-bounded chunk of source text retained for citation and
/// local-search context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextUnit {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, deserialize_with = "de_u64_lossy")]
    pub n_tokens: u64,
    #[serde(default, deserialize_with = "de_string_list")]
    pub entity_ids: Vec<String>,
}

/// Row of the nodes table. Only consumed during loading, to join per-entity
/// attributes (degree) onto the entity records.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct NodeRow {
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "de_u64_lossy")]
    pub degree: u64,
}

fn de_f64_lossy<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(lossy_f64(&value))
}

fn de_u64_lossy<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(lossy_f64(&value).max(0.0) as u64)
}

fn lossy_f64(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|f| f.is_finite()).unwrap_or(0.0)
}

fn de_string_lossy<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

fn de_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

fn de_findings<'de, D>(deserializer: D) -> Result<Vec<Finding>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(items) = value else {
        return Ok(Vec::new());
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(Finding {
                summary: s,
                explanation: String::new(),
            }),
            Value::Object(map) => {
                let field = |key: &str| {
                    map.get(key)
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string()
                };
                Some(Finding {
                    summary: field("summary"),
                    explanation: field("explanation"),
                })
            }
            _ => None,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_decodes_with_missing_and_null_fields() {
        let entity: Entity = serde_json::from_str(
            r#"{"id": "e1", "title": "ACME", "type": null, "degree": null}"#,
        )
        .unwrap();
        assert_eq!(entity.id, "e1");
        assert_eq!(entity.title, "ACME");
        assert_eq!(entity.entity_type, "");
        assert_eq!(entity.description, "");
        assert_eq!(entity.degree, 0);
    }

    #[test]
    fn numeric_fields_accept_int_float_and_string() {
        let a: Relationship =
            serde_json::from_str(r#"{"id": "r", "weight": 3, "source_degree": "7"}"#).unwrap();
        assert_eq!(a.weight, 3.0);
        assert_eq!(a.source_degree, 7);

        let b: Relationship = serde_json::from_str(r#"{"id": "r", "weight": 2.5}"#).unwrap();
        assert_eq!(b.weight, 2.5);
    }

    #[test]
    fn human_readable_id_accepts_string_or_integer() {
        let a: Entity = serde_json::from_str(r#"{"human_readable_id": 12}"#).unwrap();
        assert_eq!(a.human_readable_id, "12");

        let b: Entity = serde_json::from_str(r#"{"human_readable_id": "E-12"}"#).unwrap();
        assert_eq!(b.human_readable_id, "E-12");
    }

    #[test]
    fn findings_accept_strings_and_records() {
        let community: Community = serde_json::from_str(
            r#"{
                "id": 4,
                "title": "Community 4",
                "findings": [
                    "plain observation",
                    {"summary": "structured", "explanation": "with detail"},
                    null
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(community.id, "4");
        assert_eq!(
            community.findings,
            vec![
                Finding {
                    summary: "plain observation".into(),
                    explanation: String::new()
                },
                Finding {
                    summary: "structured".into(),
                    explanation: "with detail".into()
                },
            ]
        );
    }

    #[test]
    fn text_unit_entity_ids_default_to_empty() {
        let unit: TextUnit =
            serde_json::from_str(r#"{"id": "t1", "text": "hello", "n_tokens": 3}"#).unwrap();
        assert!(unit.entity_ids.is_empty());

        let unit: TextUnit =
            serde_json::from_str(r#"{"id": "t1", "entity_ids": ["e1", "e2"]}"#).unwrap();
        assert_eq!(unit.entity_ids, vec!["e1", "e2"]);
    }

    #[test]
    fn non_finite_strings_collapse_to_zero() {
        let rel: Relationship = serde_json::from_str(r#"{"id": "r", "weight": "NaN"}"#).unwrap();
        assert_eq!(rel.weight, 0.0);
    }
}
