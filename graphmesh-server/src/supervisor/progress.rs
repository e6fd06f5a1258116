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

//! Progress extraction from the indexer's log lines.
//!
//! The indexer speaks human-readable text, not a protocol; the token table
//! below is the whole contract. Case-insensitive substring matches map a line
//! to a pipeline stage, and the caller applies the monotonic clamp so a stage
//! token seen late never moves progress backwards.

use std::collections::VecDeque;

/// Progress reported the moment the first output line is observed.
pub const STARTING_PROGRESS: u8 = 10;

/// Pipeline stage tokens and the progress value each maps to.
const PROGRESS_TOKENS: [(&str, u8); 10] = [
    ("chunk", 20),
    ("split", 20),
    ("entity", 40),
    ("extract", 40),
    ("relationship", 60),
    ("graph", 60),
    ("community", 80),
    ("cluster", 80),
    ("embed", 90),
    ("vector", 90),
];

/// Progress value for one log line, if any token matches. A line matching
/// several tokens reports the furthest stage.
pub fn progress_for_line(line: &str) -> Option<u8> {
    let lower = line.to_lowercase();
    PROGRESS_TOKENS
        .iter()
        .filter(|(token, _)| lower.contains(token))
        .map(|(_, value)| *value)
        .max()
}

/// Bounded ring of recent subprocess output, plus the first line that looked
/// like an error. Populates the job message on failure without ever buffering
/// the whole stream.
#[derive(Debug)]
pub struct LineLog {
    recent: VecDeque<String>,
    capacity: usize,
    first_error: Option<String>,
}

impl LineLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            recent: VecDeque::with_capacity(capacity),
            capacity,
            first_error: None,
        }
    }

    pub fn push(&mut self, line: &str) {
        if self.first_error.is_none() && line.to_lowercase().contains("error") {
            self.first_error = Some(line.to_string());
        }
        if self.recent.len() == self.capacity {
            self.recent.pop_front();
        }
        self.recent.push_back(line.to_string());
    }

    /// Message for a failed run: the first error line, or a generic marker.
    pub fn failure_message(&self) -> String {
        self.first_error
            .clone()
            .unwrap_or_else(|| "failed".to_string())
    }

    pub fn recent_lines(&self) -> impl Iterator<Item = &str> {
        self.recent.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_token_maps_to_20() {
        assert_eq!(progress_for_line("Chunking documents into units"), Some(20));
    }

    #[test]
    fn split_token_maps_to_20() {
        assert_eq!(progress_for_line("running text SPLIT step"), Some(20));
    }

    #[test]
    fn entity_token_maps_to_40() {
        assert_eq!(progress_for_line("starting Entity resolution"), Some(40));
    }

    #[test]
    fn extract_token_maps_to_40() {
        assert_eq!(progress_for_line("extracting from documents"), Some(40));
    }

    #[test]
    fn relationship_token_maps_to_60() {
        assert_eq!(progress_for_line("relationship merge pass"), Some(60));
    }

    #[test]
    fn graph_token_maps_to_60() {
        assert_eq!(progress_for_line("building the graph"), Some(60));
    }

    #[test]
    fn community_token_maps_to_80() {
        assert_eq!(progress_for_line("community detection"), Some(80));
    }

    #[test]
    fn cluster_token_maps_to_80() {
        assert_eq!(progress_for_line("CLUSTERING nodes"), Some(80));
    }

    #[test]
    fn embed_token_maps_to_90() {
        assert_eq!(progress_for_line("embedding text units"), Some(90));
    }

    #[test]
    fn vector_token_maps_to_90() {
        assert_eq!(progress_for_line("writing vector store"), Some(90));
    }

    #[test]
    fn unrecognized_lines_report_nothing() {
        assert_eq!(progress_for_line("reading configuration"), None);
        assert_eq!(progress_for_line(""), None);
    }

    #[test]
    fn line_with_several_tokens_reports_the_furthest_stage() {
        assert_eq!(
            progress_for_line("extracting entities from chunked graph"),
            Some(60)
        );
    }

    #[test]
    fn line_log_is_bounded() {
        let mut log = LineLog::new(3);
        for i in 0..10 {
            log.push(&format!("line {i}"));
        }
        let lines: Vec<&str> = log.recent_lines().collect();
        assert_eq!(lines, vec!["line 7", "line 8", "line 9"]);
    }

    #[test]
    fn first_error_line_survives_ring_eviction() {
        let mut log = LineLog::new(2);
        log.push("Error: model server unreachable");
        for i in 0..5 {
            log.push(&format!("retrying {i}"));
        }
        assert_eq!(log.failure_message(), "Error: model server unreachable");
    }

    #[test]
    fn failure_message_falls_back_when_no_error_line_was_seen() {
        let mut log = LineLog::new(4);
        log.push("all quiet");
        assert_eq!(log.failure_message(), "failed");
    }
}
