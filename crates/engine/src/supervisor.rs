// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker supervisor: owns the lifecycle of compute-worker processes.
//!
//! Each started job gets exactly one worker. A driver task acquires a FIFO
//! admission permit (the job stays `queued` while waiting), spawns the child
//! with piped stdio, and runs three concurrent activities: a stdout line
//! parser, a stderr capturer, and a waiter racing process exit against the
//! deadline and the cancellation token. The first trigger classifies the
//! outcome; the handle is deregistered before `await_outcome` resolves.

use crate::command::WorkerCommand;
use crate::error::{SupervisorError, WorkerOutcome};
use crate::registry::JobRegistry;
use joule_core::{
    parse_worker_line, Clock, EventKind, JobEvent, JobId, JobKind, JobStatus, ProgressSink,
    ProgressUpdate, SystemClock, WorkerLine,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::process::ExitStatus;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout};
use tokio::sync::{watch, Semaphore};
use tokio_util::sync::CancellationToken;

/// Upper bound on captured worker stderr.
const STDERR_CAP: u64 = 64 * 1024;

fn epoch_ms_now() -> u64 {
    SystemClock.epoch_ms()
}

/// Persists a completed job's payload to the artifact store.
///
/// A write failure becomes the job's error: the submission ran, but its
/// result could not be recorded.
pub trait ResultWriter: Send + Sync {
    fn write(&self, job_id: &JobId, payload: &serde_json::Value) -> Result<(), String>;
}

/// Supervisor-wide settings.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Concurrent worker cap; over-cap starts wait FIFO while `queued`.
    pub max_workers: usize,
    /// Grace between the terminate signal and the hard kill.
    pub kill_grace: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self { max_workers: 4, kill_grace: Duration::from_secs(3) }
    }
}

/// Per-start options.
pub struct StartOptions {
    pub deadline: Duration,
    pub result_writer: Option<Arc<dyn ResultWriter>>,
}

impl StartOptions {
    pub fn new(deadline: Duration) -> Self {
        Self { deadline, result_writer: None }
    }

    pub fn with_result_writer(mut self, writer: Arc<dyn ResultWriter>) -> Self {
        self.result_writer = Some(writer);
        self
    }
}

struct WorkerHandle {
    cancel: CancellationToken,
    done: watch::Receiver<Option<WorkerOutcome>>,
}

type HandleMap = Arc<Mutex<HashMap<JobId, WorkerHandle>>>;

/// Spawns, monitors, cancels, and multiplexes compute workers.
pub struct WorkerSupervisor {
    registry: Arc<JobRegistry>,
    sink: Arc<dyn ProgressSink>,
    admission: Arc<Semaphore>,
    handles: HandleMap,
    max_workers: usize,
    kill_grace: Duration,
}

impl WorkerSupervisor {
    pub fn new(
        registry: Arc<JobRegistry>,
        sink: Arc<dyn ProgressSink>,
        config: SupervisorConfig,
    ) -> Self {
        Self {
            registry,
            sink,
            admission: Arc::new(Semaphore::new(config.max_workers)),
            handles: Arc::new(Mutex::new(HashMap::new())),
            max_workers: config.max_workers,
            kill_grace: config.kill_grace,
        }
    }

    /// Register a handle and launch the driver task. Returns immediately.
    ///
    /// At most one live handle may exist per job id.
    pub fn start(
        &self,
        job_id: &JobId,
        kind: JobKind,
        command: WorkerCommand,
        opts: StartOptions,
    ) -> Result<(), SupervisorError> {
        let (done_tx, done_rx) = watch::channel(None);
        let cancel = CancellationToken::new();
        {
            let mut handles = self.handles.lock();
            if handles.contains_key(job_id.as_str()) {
                return Err(SupervisorError::AlreadyRunning(job_id.to_string()));
            }
            handles.insert(
                job_id.clone(),
                WorkerHandle { cancel: cancel.clone(), done: done_rx },
            );
        }

        let driver = Driver {
            job_id: job_id.clone(),
            kind,
            command,
            deadline: opts.deadline,
            result_writer: opts.result_writer,
            registry: Arc::clone(&self.registry),
            sink: Arc::clone(&self.sink),
            admission: Arc::clone(&self.admission),
            handles: Arc::clone(&self.handles),
            cancel,
            kill_grace: self.kill_grace,
        };
        tokio::spawn(driver.run(done_tx));
        Ok(())
    }

    /// Signal a running worker to terminate and wait until the supervisor
    /// has confirmed the child is gone.
    ///
    /// Idempotent; unknown or already-terminated jobs return false.
    pub async fn cancel(&self, job_id: &str) -> bool {
        let handle = {
            let handles = self.handles.lock();
            handles.get(job_id).map(|h| (h.cancel.clone(), h.done.clone()))
        };
        let Some((cancel, mut done)) = handle else {
            return false;
        };
        cancel.cancel();
        loop {
            if done.borrow_and_update().is_some() {
                return true;
            }
            if done.changed().await.is_err() {
                return true;
            }
        }
    }

    /// Block until the job reaches a terminal state.
    pub async fn await_outcome(&self, job_id: &str) -> Result<WorkerOutcome, SupervisorError> {
        let rx = self.handles.lock().get(job_id).map(|h| h.done.clone());
        if let Some(mut rx) = rx {
            loop {
                let current = rx.borrow_and_update().as_ref().cloned();
                if let Some(outcome) = current {
                    return Ok(outcome);
                }
                if rx.changed().await.is_err() {
                    break;
                }
            }
        }
        // No live handle: the job finished earlier (or never started);
        // reconstruct the outcome from the registry.
        match self.registry.get(job_id) {
            Some(job) => match job.status {
                JobStatus::Completed => {
                    Ok(WorkerOutcome::Completed(job.result.unwrap_or(serde_json::Value::Null)))
                }
                JobStatus::Failed => Ok(WorkerOutcome::Failed(job.error.unwrap_or_default())),
                JobStatus::Cancelled => Ok(WorkerOutcome::Cancelled),
                JobStatus::Queued | JobStatus::Running => {
                    Err(SupervisorError::UnknownJob(job_id.to_string()))
                }
            },
            None => Err(SupervisorError::UnknownJob(job_id.to_string())),
        }
    }

    /// Signal every live worker to terminate (daemon shutdown). Does not
    /// wait for confirmation.
    pub fn cancel_all(&self) {
        for handle in self.handles.lock().values() {
            handle.cancel.cancel();
        }
    }

    /// Whether a live worker handle exists for this job.
    pub fn has_handle(&self, job_id: &str) -> bool {
        self.handles.lock().contains_key(job_id)
    }

    /// Workers currently holding an admission permit.
    pub fn in_flight(&self) -> usize {
        self.max_workers - self.admission.available_permits()
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }
}

struct Driver {
    job_id: JobId,
    kind: JobKind,
    command: WorkerCommand,
    deadline: Duration,
    result_writer: Option<Arc<dyn ResultWriter>>,
    registry: Arc<JobRegistry>,
    sink: Arc<dyn ProgressSink>,
    admission: Arc<Semaphore>,
    handles: HandleMap,
    cancel: CancellationToken,
    kill_grace: Duration,
}

enum Trigger {
    Exit(std::io::Result<ExitStatus>),
    Deadline,
    Cancel,
}

impl Driver {
    async fn run(self, done_tx: watch::Sender<Option<WorkerOutcome>>) {
        let room = self.kind.room(&self.job_id);
        let mut outcome = self.drive(&room).await;

        if let WorkerOutcome::Completed(payload) = &outcome {
            if let Some(writer) = &self.result_writer {
                if let Err(e) = writer.write(&self.job_id, payload) {
                    tracing::error!(job_id = %self.job_id, error = %e, "result writer failed");
                    outcome = WorkerOutcome::Failed(format!("failed to persist result: {e}"));
                }
            }
        }

        match &outcome {
            WorkerOutcome::Completed(payload) => {
                if !self.registry.complete(self.job_id.as_str(), payload.clone()) {
                    tracing::warn!(job_id = %self.job_id, "completed transition rejected");
                }
                self.publish(&room, EventKind::Completed, payload.clone());
            }
            WorkerOutcome::Failed(error) => {
                self.registry.fail(self.job_id.as_str(), error);
                self.publish(&room, EventKind::Error, serde_json::json!({ "error": error }));
            }
            WorkerOutcome::Cancelled => {
                self.registry.mark_cancelled(self.job_id.as_str());
                self.publish(&room, EventKind::Cancelled, serde_json::json!({}));
            }
        }

        // Handle goes away before the outcome becomes observable.
        self.handles.lock().remove(self.job_id.as_str());
        let _ = done_tx.send(Some(outcome));
    }

    async fn drive(&self, room: &str) -> WorkerOutcome {
        // Admission gate: FIFO wait while still queued.
        let _permit = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return WorkerOutcome::Cancelled,
            permit = Arc::clone(&self.admission).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => return WorkerOutcome::Failed("admission gate closed".to_string()),
            },
        };

        let mut child = match self.command.to_tokio().spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::error!(job_id = %self.job_id, program = %self.command.program.display(), error = %e, "worker spawn failed");
                return WorkerOutcome::Failed(format!("failed to spawn worker: {e}"));
            }
        };

        self.registry.transition_running(self.job_id.as_str());
        self.publish(room, EventKind::Status, serde_json::json!({ "status": "running" }));
        tracing::info!(job_id = %self.job_id, kind = %self.kind, pid = child.id(), "worker started");

        let stdout_task = tokio::spawn(read_stdout(
            child.stdout.take(),
            Arc::clone(&self.registry),
            Arc::clone(&self.sink),
            self.job_id.clone(),
            room.to_string(),
        ));
        let stderr_task = tokio::spawn(read_stderr(child.stderr.take()));

        let deadline = tokio::time::sleep(self.deadline);
        tokio::pin!(deadline);

        let trigger = tokio::select! {
            status = child.wait() => Trigger::Exit(status),
            _ = &mut deadline => Trigger::Deadline,
            _ = self.cancel.cancelled() => Trigger::Cancel,
        };

        match trigger {
            Trigger::Exit(Ok(status)) => {
                let (result, read_error) = stdout_task.await.ok().unwrap_or((None, None));
                let stderr = stderr_task.await.ok().unwrap_or_default();
                classify_exit(status, result, read_error, stderr)
            }
            Trigger::Exit(Err(e)) => {
                let _ = stdout_task.await;
                let _ = stderr_task.await;
                WorkerOutcome::Failed(format!("failed waiting for worker: {e}"))
            }
            Trigger::Deadline => {
                tracing::warn!(job_id = %self.job_id, deadline_ms = self.deadline.as_millis() as u64, "worker deadline elapsed");
                self.terminate(&mut child).await;
                reap_reader(stdout_task).await;
                reap_reader(stderr_task).await;
                WorkerOutcome::Failed("timeout".to_string())
            }
            Trigger::Cancel => {
                self.terminate(&mut child).await;
                reap_reader(stdout_task).await;
                reap_reader(stderr_task).await;
                WorkerOutcome::Cancelled
            }
        }
    }

    /// Graceful stop, then hard kill after the grace period.
    async fn terminate(&self, child: &mut Child) {
        if let Some(pid) = child.id() {
            let pid = nix::unistd::Pid::from_raw(pid as i32);
            if let Err(e) = nix::sys::signal::kill(pid, nix::sys::signal::Signal::SIGTERM) {
                tracing::debug!(job_id = %self.job_id, error = %e, "SIGTERM failed; worker already gone?");
            }
            if tokio::time::timeout(self.kill_grace, child.wait()).await.is_ok() {
                return;
            }
            tracing::warn!(job_id = %self.job_id, "worker ignored SIGTERM; escalating to SIGKILL");
        }
        if let Err(e) = child.kill().await {
            tracing::debug!(job_id = %self.job_id, error = %e, "kill failed; worker already gone?");
        }
    }

    fn publish(&self, room: &str, kind: EventKind, payload: serde_json::Value) {
        self.sink.publish(
            room,
            JobEvent::new(self.job_id.clone(), kind, payload, epoch_ms_now()),
        );
    }
}

/// Join a reader task after a kill. Bounded: an orphaned grandchild can keep
/// the pipe open past the worker's death, and the reader must not pin the
/// driver forever.
async fn reap_reader<T>(task: tokio::task::JoinHandle<T>) {
    if tokio::time::timeout(Duration::from_secs(2), task).await.is_err() {
        tracing::debug!("reader still blocked on an inherited pipe; detaching");
    }
}

fn classify_exit(
    status: ExitStatus,
    result: Option<serde_json::Value>,
    read_error: Option<String>,
    stderr: String,
) -> WorkerOutcome {
    if status.success() {
        return match (result, read_error) {
            (Some(payload), _) => WorkerOutcome::Completed(payload),
            (None, Some(e)) => WorkerOutcome::Failed(e),
            (None, None) => WorkerOutcome::Failed("worker produced no result".to_string()),
        };
    }
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        return WorkerOutcome::Failed(stderr.to_string());
    }
    match status.code() {
        Some(code) => WorkerOutcome::Failed(format!("worker exited with status {code}")),
        None => WorkerOutcome::Failed("worker terminated by signal".to_string()),
    }
}

/// Parse the stdout line stream. Progress lines update the registry and the
/// sink as they arrive; the last result line is retained. Corrupt lines are
/// logged and skipped, never fatal.
async fn read_stdout(
    stdout: Option<ChildStdout>,
    registry: Arc<JobRegistry>,
    sink: Arc<dyn ProgressSink>,
    job_id: JobId,
    room: String,
) -> (Option<serde_json::Value>, Option<String>) {
    let Some(stdout) = stdout else {
        return (None, None);
    };
    let mut lines = BufReader::new(stdout).lines();
    let mut result = None;
    let mut read_error = None;
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match parse_worker_line(line) {
                    Ok(WorkerLine::Progress { progress, step, status, sector }) => {
                        let mut payload = serde_json::Map::new();
                        payload.insert("progress".to_string(), progress.min(100).into());
                        if let Some(v) = &step {
                            payload.insert("step".to_string(), v.as_str().into());
                        }
                        if let Some(v) = &status {
                            payload.insert("status".to_string(), v.as_str().into());
                        }
                        if let Some(v) = &sector {
                            payload.insert("sector".to_string(), v.as_str().into());
                        }
                        registry.update_progress(
                            job_id.as_str(),
                            ProgressUpdate { progress: Some(progress), step, status, sector },
                        );
                        sink.publish(
                            &room,
                            JobEvent::new(
                                job_id.clone(),
                                EventKind::Progress,
                                serde_json::Value::Object(payload),
                                epoch_ms_now(),
                            ),
                        );
                    }
                    // The contract says at most one; if a worker misbehaves,
                    // the last one wins.
                    Ok(WorkerLine::Result { payload }) => result = Some(payload),
                    Ok(WorkerLine::Unknown) => {
                        tracing::debug!(%job_id, line, "ignoring unknown worker event");
                    }
                    Err(e) => {
                        tracing::warn!(%job_id, line, error = %e, "unparseable worker line");
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                read_error = Some(format!("stdout read error: {e}"));
                break;
            }
        }
    }
    (result, read_error)
}

/// Capture stderr, bounded.
async fn read_stderr(stderr: Option<ChildStderr>) -> String {
    let Some(stderr) = stderr else {
        return String::new();
    };
    let mut buf = String::new();
    if let Err(e) = stderr.take(STDERR_CAP).read_to_string(&mut buf).await {
        tracing::debug!(error = %e, "stderr capture failed");
    }
    buf
}

/// Run a worker synchronously for a bounded extraction action (no registry
/// entry, no admission permit) and return its result payload.
pub async fn run_oneshot(
    command: &WorkerCommand,
    timeout: Duration,
) -> Result<serde_json::Value, SupervisorError> {
    let mut cmd = command.to_tokio();
    cmd.kill_on_drop(true);
    let child = cmd.spawn()?;

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => return Err(SupervisorError::Spawn(e)),
        Err(_) => return Err(SupervisorError::Timeout),
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        return Err(SupervisorError::Worker(if stderr.is_empty() {
            format!("worker exited with status {}", output.status.code().unwrap_or(-1))
        } else {
            stderr.to_string()
        }));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut result = None;
    for line in stdout.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match parse_worker_line(line) {
            Ok(WorkerLine::Result { payload }) => result = Some(payload),
            Ok(_) => {}
            Err(e) => tracing::warn!(line, error = %e, "unparseable worker line"),
        }
    }
    result.ok_or_else(|| SupervisorError::Worker("worker produced no result".to_string()))
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
