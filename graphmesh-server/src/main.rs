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

use anyhow::Result;
use clap::Parser;
use graphmesh_server::{config::ServerConfig, run_server};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// HTTP listen port (overrides environment)
    #[arg(long)]
    port: Option<u16>,

    /// Path to the indexer's settings.yaml
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Indexer output directory
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Upload input directory
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// Allowed CORS origin
    #[arg(long)]
    cors_origin: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration from the environment, then apply CLI overrides.
    let mut config = ServerConfig::from_env();

    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(settings) = args.settings {
        config.set_settings_path(settings);
    }
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(input_dir) = args.input_dir {
        config.input_dir = input_dir;
    }
    if let Some(origin) = args.cors_origin {
        config.cors_origin = origin;
    }

    run_server(config).await
}
