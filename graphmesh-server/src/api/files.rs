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

//! Upload endpoints. A successful upload schedules an indexing run in the
//! background; the response never waits for it.

use axum::extract::{Multipart, Path, State};
use axum::Json;
use serde::Serialize;
use tracing::{info, warn};

use crate::api::{ApiError, AppState};
use crate::uploads::{DeleteError, UploadedFile};

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub file: UploadedFile,
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// POST /api/files/upload - multipart upload with field `file`.
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::Validation(format!("failed to read upload: {e}")))?;
        upload = Some((filename, data.to_vec()));
        break;
    }

    let (filename, content) =
        upload.ok_or_else(|| ApiError::Validation("missing multipart field 'file'".to_string()))?;

    let uploads = state.uploads.clone();
    let stored = tokio::task::spawn_blocking(move || uploads.store_upload(&filename, &content))
        .await
        .map_err(|e| ApiError::Internal(format!("upload task failed: {e}")))?;

    let (record, path) = stored.map_err(|e| {
        if e.is_rejection() {
            ApiError::Validation(e.to_string())
        } else {
            ApiError::Internal(e.to_string())
        }
    })?;

    // Kick off indexing; an already-running job keeps running and picks the
    // new file up on the next explicit start.
    match state.supervisor.start() {
        Ok(_) => info!(file = %record.name, "upload accepted; indexing started"),
        Err(rejection) => {
            warn!(file = %record.name, "upload accepted; indexing not started: {rejection}")
        }
    }

    Ok(Json(UploadResponse {
        message: "file uploaded; indexing started".to_string(),
        file: record,
        path: path.display().to_string(),
    }))
}

/// GET /api/files - input directory listing with indexing status.
pub async fn list_files(
    State(state): State<AppState>,
) -> Result<Json<Vec<UploadedFile>>, ApiError> {
    let uploads = state.uploads.clone();
    let files = tokio::task::spawn_blocking(move || uploads.list())
        .await
        .map_err(|e| ApiError::Internal(format!("listing task failed: {e}")))?
        .map_err(|e| ApiError::Internal(format!("failed to list uploads: {e}")))?;
    Ok(Json(files))
}

/// DELETE /api/files/{id}
pub async fn delete_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let uploads = state.uploads.clone();
    tokio::task::spawn_blocking(move || uploads.delete(&id))
        .await
        .map_err(|e| ApiError::Internal(format!("delete task failed: {e}")))?
        .map_err(|e| match e {
            DeleteError::NotFound => ApiError::NotFound("file not found".to_string()),
            DeleteError::Io(e) => ApiError::Internal(e.to_string()),
        })?;

    Ok(Json(MessageResponse {
        message: "file deleted".to_string(),
    }))
}
