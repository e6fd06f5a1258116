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

//! Upload Intake: admission control for corpus files.
//!
//! Validated files land verbatim in the input directory (with a timestamp
//! suffix on name collisions) and are tracked in a small JSON registry kept
//! next to the directory. The registry carries the server-assigned ids and
//! each file's indexing status; `list` reconciles it against the directory
//! so files dropped in out-of-band are adopted and deletions are noticed.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
const ALLOWED_EXTENSIONS: [&str; 2] = ["txt", "csv"];
const REGISTRY_FILE_NAME: &str = "graphmesh-uploads.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Pending,
    Indexed,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedFile {
    pub id: String,
    pub name: String,
    pub size: u64,
    pub upload_date: String,
    pub status: UploadStatus,
}

/// Rejections from the validation rules, in the order they are applied.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("filename must not be empty")]
    EmptyFilename,

    #[error("invalid filename: {0}")]
    InvalidFilename(String),

    #[error("unsupported file type; allowed: .txt, .csv")]
    UnsupportedExtension,

    #[error("file content must not be empty")]
    EmptyFile,

    #[error("file exceeds the {MAX_UPLOAD_BYTES} byte limit (got {0} bytes)")]
    TooLarge(u64),

    #[error("failed to persist upload: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    /// Whether this is a client-side rejection rather than a server failure.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, UploadError::Io(_))
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryData {
    next_id: u64,
    files: Vec<UploadedFile>,
}

pub struct UploadIntake {
    input_dir: PathBuf,
    registry_path: PathBuf,
    registry: RwLock<RegistryData>,
}

impl UploadIntake {
    pub fn new(input_dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let input_dir = input_dir.into();
        fs::create_dir_all(&input_dir)?;
        let registry_path = input_dir.join(REGISTRY_FILE_NAME);

        let registry = match load_registry(&registry_path) {
            Ok(Some(data)) => data,
            Ok(None) => RegistryData {
                next_id: 1,
                ..RegistryData::default()
            },
            Err(e) => {
                warn!("failed to load upload registry: {e}; starting fresh");
                RegistryData {
                    next_id: 1,
                    ..RegistryData::default()
                }
            }
        };

        Ok(Self {
            input_dir,
            registry_path,
            registry: RwLock::new(registry),
        })
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    /// Validates and persists one upload. Returns the registry record and
    /// the on-disk path; the stored name differs from the requested one only
    /// when a collision forced a timestamp suffix.
    pub fn store_upload(
        &self,
        filename: &str,
        content: &[u8],
    ) -> Result<(UploadedFile, PathBuf), UploadError> {
        validate_filename(filename)?;
        validate_size(content.len() as u64)?;

        let mut target = self.input_dir.join(filename);
        if target.exists() {
            let renamed = collision_name(filename, Utc::now().timestamp());
            target = self.input_dir.join(renamed);
        }
        fs::write(&target, content)?;

        let stored_name = target
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| filename.to_string());

        let record = {
            let mut registry = self.registry.write().expect("registry lock poisoned");
            let record = UploadedFile {
                id: registry.next_id.to_string(),
                name: stored_name,
                size: content.len() as u64,
                upload_date: Utc::now().to_rfc3339(),
                status: UploadStatus::Pending,
            };
            registry.next_id += 1;
            registry.files.push(record.clone());
            record
        };
        self.persist();

        info!(name = %record.name, size = record.size, "stored upload");
        Ok((record, target))
    }

    /// Files currently in the input directory, with indexing status joined
    /// from the registry. Unknown on-disk files are adopted as pending;
    /// registry entries whose file is gone are dropped.
    pub fn list(&self) -> std::io::Result<Vec<UploadedFile>> {
        let on_disk = self.scan_input_dir()?;

        let mut changed = false;
        let mut files = {
            let mut registry = self.registry.write().expect("registry lock poisoned");

            let before = registry.files.len();
            registry
                .files
                .retain(|file| on_disk.iter().any(|(name, _)| *name == file.name));
            changed |= registry.files.len() != before;

            for (name, size) in &on_disk {
                if !registry.files.iter().any(|file| file.name == *name) {
                    let record = UploadedFile {
                        id: registry.next_id.to_string(),
                        name: name.clone(),
                        size: *size,
                        upload_date: Utc::now().to_rfc3339(),
                        status: UploadStatus::Pending,
                    };
                    registry.next_id += 1;
                    registry.files.push(record);
                    changed = true;
                }
            }

            registry.files.clone()
        };
        if changed {
            self.persist();
        }

        files.sort_by_key(|file| file.id.parse::<u64>().unwrap_or(u64::MAX));
        Ok(files)
    }

    /// Removes the file from the input directory and the registry. Existing
    /// artifacts are not rolled back.
    pub fn delete(&self, id: &str) -> Result<(), DeleteError> {
        let record = {
            let mut registry = self.registry.write().expect("registry lock poisoned");
            let index = registry
                .files
                .iter()
                .position(|file| file.id == id)
                .ok_or(DeleteError::NotFound)?;
            registry.files.remove(index)
        };
        self.persist();

        let path = self.input_dir.join(&record.name);
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(DeleteError::Io(e)),
        }

        info!(name = %record.name, "deleted upload");
        Ok(())
    }

    /// Applies the latest indexing outcome: success marks every non-indexed
    /// file indexed, failure marks pending files as errored.
    pub fn mark_indexing_outcome(&self, success: bool) {
        {
            let mut registry = self.registry.write().expect("registry lock poisoned");
            for file in &mut registry.files {
                match (success, file.status) {
                    (true, UploadStatus::Pending) | (true, UploadStatus::Error) => {
                        file.status = UploadStatus::Indexed;
                    }
                    (false, UploadStatus::Pending) => {
                        file.status = UploadStatus::Error;
                    }
                    _ => {}
                }
            }
        }
        self.persist();
    }

    fn scan_input_dir(&self) -> std::io::Result<Vec<(String, u64)>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.input_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name == REGISTRY_FILE_NAME || name.starts_with('.') {
                continue;
            }
            let size = entry.metadata()?.len();
            entries.push((name, size));
        }
        Ok(entries)
    }

    fn persist(&self) {
        let registry = self.registry.read().expect("registry lock poisoned");
        if let Err(e) = save_registry(&self.registry_path, &registry) {
            error!("failed to persist upload registry: {e}");
        }
    }
}

#[derive(Debug, Error)]
pub enum DeleteError {
    #[error("file not found")]
    NotFound,

    #[error("failed to delete file: {0}")]
    Io(#[from] std::io::Error),
}

fn validate_filename(filename: &str) -> Result<(), UploadError> {
    if filename.is_empty() {
        return Err(UploadError::EmptyFilename);
    }
    if filename.contains('/') || filename.contains('\\') || filename.contains('\0') {
        return Err(UploadError::InvalidFilename(
            "path separators and null bytes are not allowed".to_string(),
        ));
    }

    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase);
    match extension {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(UploadError::UnsupportedExtension),
    }
}

fn validate_size(size: u64) -> Result<(), UploadError> {
    if size == 0 {
        return Err(UploadError::EmptyFile);
    }
    if size > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge(size));
    }
    Ok(())
}

/// `doc.txt` taken: the replacement is `doc_<unix_timestamp>.txt`.
fn collision_name(filename: &str, timestamp: i64) -> String {
    let path = Path::new(filename);
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_string());
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => format!("{stem}_{timestamp}.{ext}"),
        None => format!("{stem}_{timestamp}"),
    }
}

fn load_registry(path: &Path) -> std::io::Result<Option<RegistryData>> {
    if !path.exists() {
        return Ok(None);
    }
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader)
        .map(Some)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

/// Atomic write: temp file then rename, so a crash never truncates the
/// registry.
fn save_registry(path: &Path, data: &RegistryData) -> std::io::Result<()> {
    let temp_path = path.with_extension("json.tmp");
    {
        let file = File::create(&temp_path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, data)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    }
    fs::rename(&temp_path, path)
}
