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

//! Graphmesh backend: the orchestration service between the browser UI, the
//! indexer subprocess, and the local inference server.

pub mod api;
pub mod cache;
pub mod config;
pub mod metrics;
pub mod search;
pub mod supervisor;
pub mod topology;
pub mod uploads;

#[cfg(test)]
pub(crate) mod test_fixtures;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use graphmesh_core::ArtifactStore;

use api::AppState;
use cache::MetricsCache;
use config::ServerConfig;
use search::engine::LlmSearchEngine;
use search::SearchGateway;
use supervisor::IndexSupervisor;
use uploads::UploadIntake;

/// Multipart bodies carry some framing overhead on top of the 10 MiB file
/// limit; oversized files must reach the intake so it can answer 400 instead
/// of the transport cutting the request off with 413.
const BODY_LIMIT_BYTES: usize = 32 * 1024 * 1024;

pub async fn run_server(config: ServerConfig) -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "graphmesh_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("starting graphmesh server");
    config.validate()?;

    let config = Arc::new(config);
    let state = build_state(config.clone())?;
    let supervisor = state.supervisor.clone();

    let cors_origin: HeaderValue = config
        .cors_origin
        .parse()
        .with_context(|| format!("invalid CORS origin '{}'", config.cors_origin))?;
    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = config.socket_addr();
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(supervisor))
        .await?;

    Ok(())
}

/// Wires the component graph. Separated from `run_server` so tests build the
/// same state against temporary directories.
pub fn build_state(config: Arc<ServerConfig>) -> Result<AppState> {
    let store = Arc::new(ArtifactStore::new(config.data_dir.clone()));
    let cache = Arc::new(MetricsCache::new());
    let uploads = Arc::new(UploadIntake::new(config.input_dir.clone())?);

    let engine = Arc::new(
        LlmSearchEngine::new(config.settings_path.clone())
            .with_context(|| "failed to configure the search engine")?,
    );
    let search = Arc::new(SearchGateway::new(
        engine,
        store.clone(),
        config.search_timeout(),
    ));

    let supervisor = Arc::new(IndexSupervisor::new(
        config.clone(),
        store.clone(),
        cache.clone(),
        uploads.clone(),
    ));

    Ok(AppState {
        config,
        store,
        cache,
        supervisor,
        uploads,
        search,
    })
}

/// The full route table. Kept separate so integration tests drive the exact
/// production router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(api::health::root))
        .route("/api/files/upload", post(api::files::upload_file))
        .route("/api/files", get(api::files::list_files))
        .route("/api/files/:id", delete(api::files::delete_file))
        .route("/api/indexing/start", post(api::indexing::start_indexing))
        .route("/api/indexing/status", get(api::indexing::indexing_status))
        .route("/api/search/global", post(api::search::global_search))
        .route("/api/search/local", post(api::search::local_search))
        .route(
            "/api/search/suggestions",
            get(api::search::search_suggestions),
        )
        .route("/api/communities", get(api::analytics::communities))
        .route("/api/statistics", get(api::analytics::statistics))
        .route("/api/entity-types", get(api::analytics::entity_types))
        .route(
            "/api/relationships/top",
            get(api::analytics::top_relationships),
        )
        .route("/api/graph/topology", get(api::graph::graph_topology))
        .route("/api/graph/entity/:id", get(api::graph::entity_analysis))
        .fallback(unknown_route)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .with_state(state)
}

async fn unknown_route() -> api::ApiError {
    api::ApiError::NotFound("route not found".to_string())
}

/// Ctrl-C handler: cancel any running indexing job deterministically before
/// the listener goes away.
async fn shutdown_signal(supervisor: Arc<IndexSupervisor>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
    supervisor.shutdown().await;
}
