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

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

/// Graphmesh server configuration.
///
/// Everything is environment-driven; the only configuration file in play is
/// the indexer's own `settings.yaml`, which this backend reads but does not
/// own.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port.
    pub port: u16,
    /// The single allowed CORS origin (the front-end dev server by default).
    pub cors_origin: String,
    /// Path to the indexer's settings.yaml.
    pub settings_path: PathBuf,
    /// Output directory the indexer publishes artifacts into.
    pub data_dir: PathBuf,
    /// Input directory uploads are persisted into.
    pub input_dir: PathBuf,
    /// Root directory handed to the indexer via `--root`.
    pub backend_root: PathBuf,
    /// The indexer executable and leading arguments.
    pub indexer_command: Vec<String>,
    /// Per-call search deadline in seconds.
    pub search_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let settings_path = PathBuf::from("./settings.yaml");
        Self {
            port: 8000,
            cors_origin: "http://localhost:5173".to_string(),
            backend_root: backend_root_for(&settings_path),
            settings_path,
            data_dir: PathBuf::from("./output"),
            input_dir: PathBuf::from("./input"),
            indexer_command: default_indexer_command(),
            search_timeout_secs: 300,
        }
    }
}

fn default_indexer_command() -> Vec<String> {
    vec![
        "python".to_string(),
        "-m".to_string(),
        "graphrag.index".to_string(),
    ]
}

/// The indexer's `--root` defaults to the directory holding settings.yaml,
/// which is where the indexer expects its input/ and output/ to live.
fn backend_root_for(settings_path: &std::path::Path) -> PathBuf {
    settings_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Supported environment variables:
    /// - GRAPHRAG_SETTINGS_PATH: path to settings.yaml (default: ./settings.yaml)
    /// - GRAPHRAG_DATA_DIR: indexer output directory (default: ./output)
    /// - PORT: HTTP listen port (default: 8000)
    /// - CORS_ORIGIN: allowed origin (default: http://localhost:5173)
    /// - GRAPHMESH_INPUT_DIR: upload directory (default: ./input)
    /// - GRAPHMESH_BACKEND_ROOT: indexer --root (default: settings.yaml directory)
    /// - GRAPHMESH_INDEXER_CMD: indexer executable and args, whitespace separated
    /// - GRAPHMESH_SEARCH_TIMEOUT_SECS: per-call search deadline (default: 300)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("GRAPHRAG_SETTINGS_PATH") {
            config.set_settings_path(PathBuf::from(path));
        }

        if let Ok(dir) = std::env::var("GRAPHRAG_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }

        if let Ok(port) = std::env::var("PORT") {
            if let Ok(value) = port.parse() {
                config.port = value;
            }
        }

        if let Ok(origin) = std::env::var("CORS_ORIGIN") {
            config.cors_origin = origin;
        }

        if let Ok(dir) = std::env::var("GRAPHMESH_INPUT_DIR") {
            config.input_dir = PathBuf::from(dir);
        }

        if let Ok(root) = std::env::var("GRAPHMESH_BACKEND_ROOT") {
            config.backend_root = PathBuf::from(root);
        }

        if let Ok(command) = std::env::var("GRAPHMESH_INDEXER_CMD") {
            let parts: Vec<String> = command.split_whitespace().map(String::from).collect();
            if !parts.is_empty() {
                config.indexer_command = parts;
            }
        }

        if let Ok(timeout) = std::env::var("GRAPHMESH_SEARCH_TIMEOUT_SECS") {
            if let Ok(value) = timeout.parse() {
                config.search_timeout_secs = value;
            }
        }

        config
    }

    /// Points at a different settings.yaml and moves the indexer root with
    /// it, matching where the indexer expects to run.
    pub fn set_settings_path(&mut self, path: PathBuf) {
        self.backend_root = backend_root_for(&path);
        self.settings_path = path;
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }

    /// Validate configuration and create the working directories.
    pub fn validate(&self) -> Result<()> {
        if self.indexer_command.is_empty() {
            anyhow::bail!("indexer command must not be empty");
        }

        if self.cors_origin.trim().is_empty() {
            anyhow::bail!("CORS origin must not be empty");
        }

        if self.search_timeout_secs == 0 {
            anyhow::bail!("search timeout must be positive");
        }

        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(&self.input_dir)?;

        Ok(())
    }
}
