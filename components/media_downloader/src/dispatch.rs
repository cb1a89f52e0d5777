// components/media_downloader/src/dispatch.rs
//! Background execution of job specifications.
//!
//! Every dispatched job gets its own tokio task. The caller gets a [`JobHandle`]
//! back immediately; progress flows through the [`StatusChannel`] and a single
//! terminal [`Notification`] per job. Errors never leave the task.

use crate::error::JobError;
use crate::metadata::{self, MetadataExport};
use crate::spec::JobSpecification;
use crate::status::{JobPhase, StatusChannel, StatusMessage};
use crate::types::JobMode;
use crate::ytdlp::Engine;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

/// One-shot terminal message for the interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub job_id: u64,
    pub action: JobMode,
    pub kind: NotificationKind,
    pub message: String,
}

/// What a successful job produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutput {
    Downloaded,
    Recorded,
    Metadata(MetadataExport),
}

/// Summary returned by a finished job's task
#[derive(Debug)]
pub struct JobReport {
    pub id: u64,
    pub action: JobMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcome: Result<JobOutput, JobError>,
}

impl JobReport {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Handle to one dispatched job
#[derive(Debug)]
pub struct JobHandle {
    id: u64,
    action: JobMode,
    task: JoinHandle<JobReport>,
}

impl JobHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn action(&self) -> JobMode {
        self.action
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the job to reach a terminal state
    pub async fn wait(self) -> Result<JobReport, JoinError> {
        self.task.await
    }
}

/// Spawns one background task per job against a shared engine
#[derive(Clone)]
pub struct Dispatcher {
    engine: Arc<dyn Engine>,
    status: StatusChannel,
    notifications: mpsc::UnboundedSender<Notification>,
    next_id: Arc<AtomicU64>,
}

impl Dispatcher {
    pub fn new(
        engine: Arc<dyn Engine>,
        status: StatusChannel,
        notifications: mpsc::UnboundedSender<Notification>,
    ) -> Self {
        Self {
            engine,
            status,
            notifications,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn status(&self) -> &StatusChannel {
        &self.status
    }

    /// Start `spec` in the background and return without waiting for it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn dispatch(&self, spec: JobSpecification) -> JobHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let action = spec.mode;
        tracing::info!(job = id, %action, url = %spec.url, "dispatching job");

        if spec.has_format_conflict() {
            tracing::warn!(
                job = id,
                "audio-only requested for a livestream recording; the audio format selector takes precedence"
            );
        }

        let job = Job {
            id,
            spec,
            engine: Arc::clone(&self.engine),
            status: self.status.clone(),
            notifications: self.notifications.clone(),
        };
        let task = tokio::spawn(job.run());

        JobHandle { id, action, task }
    }
}

struct Job {
    id: u64,
    spec: JobSpecification,
    engine: Arc<dyn Engine>,
    status: StatusChannel,
    notifications: mpsc::UnboundedSender<Notification>,
}

impl Job {
    async fn run(self) -> JobReport {
        let action = self.spec.mode;
        let started_at = Utc::now();

        self.publish(JobPhase::Queued);
        let outcome = self.execute().await;

        match &outcome {
            Ok(output) => {
                self.publish(JobPhase::Completed);
                self.notify(NotificationKind::Success, success_message(output));
            }
            Err(error) => {
                tracing::error!(job = self.id, "job failed: {error}");
                self.publish(JobPhase::Failed);
                self.notify(NotificationKind::Error, format!("An error occurred: {error}"));
            }
        }

        JobReport {
            id: self.id,
            action,
            started_at,
            finished_at: Utc::now(),
            outcome,
        }
    }

    async fn execute(&self) -> Result<JobOutput, JobError> {
        let destination = &self.spec.destination;
        tokio::fs::create_dir_all(destination)
            .await
            .map_err(|source| JobError::Destination {
                path: destination.clone(),
                source,
            })?;

        self.publish(JobPhase::Running);

        match self.spec.mode {
            JobMode::StandardDownload => {
                self.engine.download(&self.spec).await?;
                Ok(JobOutput::Downloaded)
            }
            JobMode::LivestreamRecord => {
                self.engine.download(&self.spec).await?;
                Ok(JobOutput::Recorded)
            }
            JobMode::MetadataOnly => {
                let info = self.engine.extract_info(&self.spec).await?;
                let export = metadata::project(&info, destination).await?;
                Ok(JobOutput::Metadata(export))
            }
        }
    }

    fn publish(&self, phase: JobPhase) {
        self.status
            .publish(StatusMessage::for_phase(self.spec.mode, phase));
    }

    fn notify(&self, kind: NotificationKind, message: String) {
        let notification = Notification {
            job_id: self.id,
            action: self.spec.mode,
            kind,
            message,
        };
        if self.notifications.send(notification).is_err() {
            tracing::debug!("no listener for job notifications");
        }
    }
}

fn success_message(output: &JobOutput) -> String {
    match output {
        JobOutput::Downloaded => "Download completed!".to_owned(),
        JobOutput::Recorded => "Livestream recording completed!".to_owned(),
        JobOutput::Metadata(export) => format!(
            "Metadata saved to {} and {}!",
            export.json_path.display(),
            export.csv_path.display()
        ),
    }
}
