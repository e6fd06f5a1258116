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

//! Index Job Supervisor.
//!
//! Owns the singleton indexing job: admission (one job at a time, one backend
//! per output directory), subprocess supervision with line-oriented progress
//! capture, and the completion handshake that reloads the artifact store and
//! invalidates the metrics cache before the job is reported finished.
//!
//! The supervisor is the only writer of the job record; the status endpoint
//! and concurrent handlers read coherent snapshots through an `RwLock`.

pub mod progress;

use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tracing::{error, info, warn};

use graphmesh_core::ArtifactStore;

use crate::cache::MetricsCache;
use crate::config::ServerConfig;
use crate::uploads::UploadIntake;

use progress::{progress_for_line, LineLog, STARTING_PROGRESS};

const LOCK_FILE_NAME: &str = ".graphmesh.lock";
const RECENT_LINES_CAPACITY: usize = 64;
const TERMINATE_GRACE: Duration = Duration::from_secs(5);
const SHUTDOWN_WAIT: Duration = Duration::from_secs(10);

/// Snapshot of the singleton job record.
#[derive(Debug, Clone, Serialize)]
pub struct JobStatus {
    pub is_running: bool,
    pub progress: u8,
    pub message: String,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub exit_status: Option<i32>,
}

impl Default for JobStatus {
    fn default() -> Self {
        Self {
            is_running: false,
            progress: 0,
            message: "idle".to_string(),
            started_at: None,
            finished_at: None,
            exit_status: None,
        }
    }
}

/// Why a start request was not accepted.
#[derive(Debug, thiserror::Error)]
pub enum StartRejection {
    #[error("indexing already running")]
    AlreadyRunning,

    #[error("output directory is locked by another indexing process")]
    OutputLocked,
}

/// Exclusive advisory lock over the output directory. Held for the duration
/// of a run; the OS releases it if the process dies, so a crash cannot wedge
/// the directory for the next backend instance.
struct OutputLock {
    file: std::fs::File,
}

impl OutputLock {
    fn acquire(dir: &Path) -> std::io::Result<Option<Self>> {
        std::fs::create_dir_all(dir)?;
        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(dir.join(LOCK_FILE_NAME))?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self { file })),
            Err(_) => Ok(None),
        }
    }
}

impl Drop for OutputLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            warn!("failed to release output directory lock: {e}");
        }
    }
}

pub struct IndexSupervisor {
    config: Arc<ServerConfig>,
    store: Arc<ArtifactStore>,
    cache: Arc<MetricsCache>,
    uploads: Arc<UploadIntake>,
    status: Arc<RwLock<JobStatus>>,
    running: Arc<AtomicBool>,
    cancel_tx: watch::Sender<bool>,
}

impl IndexSupervisor {
    pub fn new(
        config: Arc<ServerConfig>,
        store: Arc<ArtifactStore>,
        cache: Arc<MetricsCache>,
        uploads: Arc<UploadIntake>,
    ) -> Self {
        let (cancel_tx, _) = watch::channel(false);
        Self {
            config,
            store,
            cache,
            uploads,
            status: Arc::new(RwLock::new(JobStatus::default())),
            running: Arc::new(AtomicBool::new(false)),
            cancel_tx,
        }
    }

    /// Accepts the job unless one is already running (here or in another
    /// backend instance sharing the output directory) and spawns the
    /// supervision task. Returns the seeded status on acceptance.
    pub fn start(&self) -> Result<JobStatus, StartRejection> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(StartRejection::AlreadyRunning);
        }

        let lock = match OutputLock::acquire(&self.config.data_dir) {
            Ok(Some(lock)) => lock,
            Ok(None) => {
                self.running.store(false, Ordering::SeqCst);
                return Err(StartRejection::OutputLocked);
            }
            Err(e) => {
                warn!("failed to acquire output directory lock: {e}");
                self.running.store(false, Ordering::SeqCst);
                return Err(StartRejection::OutputLocked);
            }
        };

        let seeded = JobStatus {
            is_running: true,
            progress: 0,
            message: "starting".to_string(),
            started_at: Some(Utc::now()),
            finished_at: None,
            exit_status: None,
        };
        *self.status.write().expect("status lock poisoned") = seeded.clone();

        let worker = JobWorker {
            config: self.config.clone(),
            store: self.store.clone(),
            cache: self.cache.clone(),
            uploads: self.uploads.clone(),
            status: self.status.clone(),
            running: self.running.clone(),
            cancel: self.cancel_tx.subscribe(),
        };
        tokio::spawn(async move {
            worker.run(lock).await;
        });

        Ok(seeded)
    }

    pub fn status(&self) -> JobStatus {
        self.status.read().expect("status lock poisoned").clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Aborts any running job and waits for the supervision task to settle.
    /// Called on process shutdown.
    pub async fn shutdown(&self) {
        if !self.is_running() {
            return;
        }
        info!("cancelling running indexing job for shutdown");
        let _ = self.cancel_tx.send(true);

        let deadline = tokio::time::Instant::now() + SHUTDOWN_WAIT;
        while self.is_running() && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        if self.is_running() {
            warn!("indexing job did not settle before shutdown deadline");
        }
    }
}

enum RunOutcome {
    Finished(i32),
    Cancelled,
    SpawnFailed(String),
}

struct JobWorker {
    config: Arc<ServerConfig>,
    store: Arc<ArtifactStore>,
    cache: Arc<MetricsCache>,
    uploads: Arc<UploadIntake>,
    status: Arc<RwLock<JobStatus>>,
    running: Arc<AtomicBool>,
    cancel: watch::Receiver<bool>,
}

impl JobWorker {
    async fn run(mut self, lock: OutputLock) {
        let log = Arc::new(Mutex::new(LineLog::new(RECENT_LINES_CAPACITY)));
        let outcome = self.supervise(log.clone()).await;

        match outcome {
            RunOutcome::Finished(0) => self.complete_success().await,
            RunOutcome::Finished(code) => {
                let message = log.lock().expect("log lock poisoned").failure_message();
                self.complete_failure(message, Some(code));
            }
            RunOutcome::Cancelled => {
                self.complete_failure("cancelled".to_string(), None);
            }
            RunOutcome::SpawnFailed(message) => {
                self.complete_failure(message, None);
            }
        }

        drop(lock);
        self.running.store(false, Ordering::SeqCst);
    }

    async fn supervise(&mut self, log: Arc<Mutex<LineLog>>) -> RunOutcome {
        let mut command = Command::new(&self.config.indexer_command[0]);
        command
            .args(&self.config.indexer_command[1..])
            .arg("--root")
            .arg(&self.config.backend_root)
            .arg("--verbose")
            .current_dir(&self.config.backend_root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        info!(command = ?self.config.indexer_command, "spawning indexer subprocess");
        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => return RunOutcome::SpawnFailed(format!("failed to spawn indexer: {e}")),
        };

        let stdout_task = child.stdout.take().map(|stream| {
            tokio::spawn(pump_lines(
                stream,
                "stdout",
                self.status.clone(),
                log.clone(),
            ))
        });
        let stderr_task = child.stderr.take().map(|stream| {
            tokio::spawn(pump_lines(
                stream,
                "stderr",
                self.status.clone(),
                log.clone(),
            ))
        });

        let outcome = tokio::select! {
            result = child.wait() => match result {
                Ok(status) => RunOutcome::Finished(status.code().unwrap_or(-1)),
                Err(e) => RunOutcome::SpawnFailed(format!("failed to wait for indexer: {e}")),
            },
            _ = self.cancel.changed() => {
                terminate(&mut child).await;
                RunOutcome::Cancelled
            }
        };

        // Streams hit EOF once the child is gone; drain the pumps so the
        // failure message sees every line.
        if let Some(task) = stdout_task {
            let _ = task.await;
        }
        if let Some(task) = stderr_task {
            let _ = task.await;
        }

        outcome
    }

    /// Success handshake. The store reload happens before `is_running` flips
    /// back, so any request ordered after the flip observes the new
    /// generation. A reload failure is reported through the status message
    /// and does not roll the run back.
    async fn complete_success(&self) {
        let store = self.store.clone();
        let reload = tokio::task::spawn_blocking(move || store.reload()).await;

        let message = match reload {
            Ok(Ok(generation)) => {
                info!(generation, "indexing completed; artifacts reloaded");
                "completed".to_string()
            }
            Ok(Err(e)) => {
                error!("indexing succeeded but artifact reload failed: {e}");
                format!("completed; artifact reload failed: {e}")
            }
            Err(e) => {
                error!("artifact reload task failed: {e}");
                format!("completed; artifact reload failed: {e}")
            }
        };

        self.cache.invalidate();
        self.uploads.mark_indexing_outcome(true);

        let mut status = self.status.write().expect("status lock poisoned");
        status.progress = 100;
        status.message = message;
        status.finished_at = Some(Utc::now());
        status.exit_status = Some(0);
        status.is_running = false;
    }

    fn complete_failure(&self, message: String, exit_status: Option<i32>) {
        error!(?exit_status, "indexing failed: {message}");
        self.uploads.mark_indexing_outcome(false);

        let mut status = self.status.write().expect("status lock poisoned");
        status.progress = 0;
        status.message = message;
        status.finished_at = Some(Utc::now());
        status.exit_status = exit_status;
        status.is_running = false;
    }
}

/// SIGTERM first, then a hard kill after the grace period.
async fn terminate(child: &mut Child) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        unsafe {
            libc::kill(pid as i32, libc::SIGTERM);
        }
        if tokio::time::timeout(TERMINATE_GRACE, child.wait())
            .await
            .is_ok()
        {
            return;
        }
        warn!("indexer ignored SIGTERM; killing");
    }

    if let Err(e) = child.kill().await {
        warn!("failed to kill indexer subprocess: {e}");
    }
}

async fn pump_lines<R>(
    stream: R,
    name: &'static str,
    status: Arc<RwLock<JobStatus>>,
    log: Arc<Mutex<LineLog>>,
) where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(stream).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => observe_line(&line, name, &status, &log),
            Ok(None) => break,
            Err(e) => {
                warn!("indexer {name} read error: {e}");
                break;
            }
        }
    }
}

fn observe_line(
    line: &str,
    name: &'static str,
    status: &RwLock<JobStatus>,
    log: &Mutex<LineLog>,
) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }

    if name == "stderr" {
        warn!("indexer stderr: {line}");
    } else {
        info!("indexer stdout: {line}");
    }
    log.lock().expect("log lock poisoned").push(line);

    let mut status = status.write().expect("status lock poisoned");
    if !status.is_running {
        return;
    }

    if status.progress < STARTING_PROGRESS {
        status.progress = STARTING_PROGRESS;
        status.message = "indexing".to_string();
    }
    if let Some(value) = progress_for_line(line) {
        let clamped = value.min(99);
        if clamped > status.progress {
            status.progress = clamped;
        }
    }
}
