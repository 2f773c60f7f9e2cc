use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::{future::BoxFuture, stream::BoxStream, FutureExt, StreamExt};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, info, warn};

use super::LogSink;
use crate::{
    domain::{AppError, DownloadJob, DownloadRequest, JobSnapshot, JobStatus},
    loader::{self, LoaderError, PostLoader},
};

#[derive(Debug, Clone)]
pub enum JobEvent {
    /// A line was appended to the log
    Log(String),
    /// Terminal outcome; always the last event of a job
    Finished(Result<PathBuf, AppError>),
}

/// Runs at most one download at a time and owns its log.
///
/// Clones share the same job slot and log, so the UI and the worker stream
/// each hold one.
#[derive(Clone)]
pub struct JobRunner {
    loader: Arc<dyn PostLoader>,
    handle: JobHandle,
}

impl JobRunner {
    pub fn new(loader: Arc<dyn PostLoader>) -> Self {
        Self {
            loader,
            handle: JobHandle::default(),
        }
    }

    pub fn loader_name(&self) -> &'static str {
        self.loader.name()
    }

    pub async fn check_dependency(&self) -> Result<String, AppError> {
        self.loader.check_available().await.map_err(|e| match e {
            LoaderError::NotInstalled { .. } => AppError::MissingDependency(e.to_string()),
            other => AppError::MissingDependency(format!(
                "{} is not usable ({}). Install it via `pip install instaloader`.",
                self.loader.name(),
                other
            )),
        })
    }

    pub fn status(&self) -> JobStatus {
        self.handle
            .slot()
            .as_ref()
            .map_or(JobStatus::Idle, |job| job.status)
    }

    pub fn is_running(&self) -> bool {
        self.status() == JobStatus::Running
    }

    #[cfg(test)]
    pub fn log(&self) -> &LogSink {
        &self.handle.log
    }

    pub fn snapshot(&self) -> JobSnapshot {
        let (target, status) = match self.handle.slot().as_ref() {
            Some(job) => (Some(job.target.clone()), job.status),
            None => (None, JobStatus::Idle),
        };
        JobSnapshot {
            target,
            status,
            log_lines: self.handle.log.lines(),
        }
    }

    /// Empty the log. A running job is left alone and keeps appending.
    pub fn clear_log(&self) {
        self.handle.log.clear();
    }

    /// Discard a finished job and its log.
    pub fn reset(&self) -> Result<(), AppError> {
        let mut slot = self.handle.slot();
        if slot.as_ref().is_some_and(|job| job.status == JobStatus::Running) {
            return Err(AppError::ConcurrentJob);
        }
        *slot = None;
        self.handle.log.clear();
        Ok(())
    }

    /// Claim the job slot and return the event stream that drives the download.
    ///
    /// The loader only makes progress while the stream is polled. A finished
    /// job is replaced; a running one makes this fail with `ConcurrentJob`.
    pub fn start(&self, request: DownloadRequest) -> Result<BoxStream<'static, JobEvent>, AppError> {
        {
            let mut slot = self.handle.slot();
            if slot.as_ref().is_some_and(|job| job.status == JobStatus::Running) {
                warn!("Rejected download of {}: a job is already running", request.target);
                return Err(AppError::ConcurrentJob);
            }
            let job = DownloadJob::start(request.clone());
            info!(
                "Starting {} job for shortcode {} ({})",
                self.loader.name(),
                job.target,
                if job.credentials.is_some() {
                    "logged in"
                } else {
                    "anonymous"
                }
            );
            *slot = Some(job);
            self.handle.log.clear();
        }

        Ok(futures::stream::unfold(
            JobRuntimeState::Start {
                loader: self.loader.clone(),
                request,
                job: ActiveJob {
                    handle: self.handle.clone(),
                },
            },
            |state| async move {
                match state {
                    JobRuntimeState::Start {
                        loader,
                        request,
                        job,
                    } => {
                        let (tx, progress) = mpsc::unbounded_channel();
                        let _ = tx.send(format!("Detected shortcode: {}", request.target));
                        let _ = tx.send(match &request.credentials {
                            Some(credentials) => format!("Logging in as {}...", credentials.username),
                            None => {
                                "Downloading without login. Only public posts are accessible."
                                    .to_string()
                            }
                        });

                        let outcome = async move { loader.fetch(request, tx).await }.boxed();
                        advance_running(progress, outcome, job).await
                    }
                    JobRuntimeState::Running {
                        progress,
                        outcome,
                        job,
                    } => advance_running(progress, outcome, job).await,
                    JobRuntimeState::Draining {
                        pending,
                        result,
                        job,
                    } => advance_draining(pending, result, job),
                    JobRuntimeState::Finished => None,
                }
            },
        )
        .boxed())
    }
}

/// Shared state written by the worker stream and read by the UI.
#[derive(Clone, Default)]
struct JobHandle {
    job: Arc<Mutex<Option<DownloadJob>>>,
    log: LogSink,
}

impl JobHandle {
    fn slot(&self) -> MutexGuard<'_, Option<DownloadJob>> {
        self.job.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The in-flight job as carried by its event stream.
///
/// Dropping it while the job is still Running, e.g. when the stream is
/// dropped before `Finished`, fails the job so the slot can be reused.
struct ActiveJob {
    handle: JobHandle,
}

impl ActiveJob {
    fn emit(&self, line: String) -> JobEvent {
        self.handle.log.append(line.clone());
        JobEvent::Log(line)
    }

    fn finish(&self, result: &Result<PathBuf, AppError>) {
        let status = if result.is_ok() {
            JobStatus::Succeeded
        } else {
            JobStatus::Failed
        };
        if let Some(job) = self.handle.slot().as_mut() {
            job.status = status;
            match result {
                Ok(path) => info!("Job for {} saved to {}", job.target, path.display()),
                Err(e) => warn!("Job for {} failed: {}", job.target, e),
            }
        }
    }
}

impl Drop for ActiveJob {
    fn drop(&mut self) {
        let mut slot = self.handle.slot();
        if let Some(job) = slot.as_mut() {
            if job.status == JobStatus::Running {
                warn!("Job for {} was dropped before finishing", job.target);
                job.status = JobStatus::Failed;
                self.handle.log.append("Error: download cancelled");
            }
        }
    }
}

enum JobRuntimeState {
    Start {
        loader: Arc<dyn PostLoader>,
        request: DownloadRequest,
        job: ActiveJob,
    },
    Running {
        progress: UnboundedReceiver<String>,
        outcome: BoxFuture<'static, loader::Result<PathBuf>>,
        job: ActiveJob,
    },
    Draining {
        pending: VecDeque<String>,
        result: Result<PathBuf, AppError>,
        job: ActiveJob,
    },
    Finished,
}

async fn advance_running(
    mut progress: UnboundedReceiver<String>,
    mut outcome: BoxFuture<'static, loader::Result<PathBuf>>,
    job: ActiveJob,
) -> Option<(JobEvent, JobRuntimeState)> {
    tokio::select! {
        biased;
        Some(line) = progress.recv() => Some((
            job.emit(line),
            JobRuntimeState::Running {
                progress,
                outcome,
                job,
            },
        )),
        result = &mut outcome => {
            // Lines sent just before the loader returned are still queued
            let mut pending = VecDeque::new();
            while let Ok(line) = progress.try_recv() {
                pending.push_back(line);
            }

            let result = result.map_err(|e| {
                if let LoaderError::Failed { code: Some(code), .. } = &e {
                    debug!("Loader exited with code {}", code);
                }
                AppError::Download(e.to_string())
            });
            match &result {
                Ok(path) => {
                    pending.push_back("Download complete.".to_string());
                    pending.push_back(format!("Post saved to {}", path.display()));
                }
                Err(AppError::Download(message)) => {
                    pending.push_back(format!("Error: {}", message));
                }
                Err(e) => pending.push_back(format!("Error: {}", e)),
            }
            advance_draining(pending, result, job)
        }
    }
}

fn advance_draining(
    mut pending: VecDeque<String>,
    result: Result<PathBuf, AppError>,
    job: ActiveJob,
) -> Option<(JobEvent, JobRuntimeState)> {
    match pending.pop_front() {
        Some(line) => Some((
            job.emit(line),
            JobRuntimeState::Draining {
                pending,
                result,
                job,
            },
        )),
        None => {
            job.finish(&result);
            Some((JobEvent::Finished(result), JobRuntimeState::Finished))
        }
    }
}
