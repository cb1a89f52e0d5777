// components/media_downloader/src/status.rs
//! Single-slot progress text shared between running jobs and the interface.
//!
//! Every publish overwrites the previous message. Readers either peek at the
//! current value or await the next change; there is no history.

use crate::types::JobMode;
use serde::Serialize;
use std::fmt;
use tokio::sync::watch;

pub const ERROR_TEXT: &str = "Error occurred!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JobPhase {
    Idle,
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobPhase::Completed | JobPhase::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusMessage {
    /// None until the first job publishes
    pub action: Option<JobMode>,
    pub phase: JobPhase,
    pub text: String,
}

impl StatusMessage {
    pub fn idle() -> Self {
        Self {
            action: None,
            phase: JobPhase::Idle,
            text: String::new(),
        }
    }

    /// The text shown for `action` entering `phase`
    pub fn for_phase(action: JobMode, phase: JobPhase) -> Self {
        let text = match (action, phase) {
            (_, JobPhase::Idle) => "",
            (_, JobPhase::Failed) => ERROR_TEXT,
            (JobMode::StandardDownload, JobPhase::Queued | JobPhase::Running) => "Downloading...",
            (JobMode::StandardDownload, JobPhase::Completed) => "Download completed!",
            (JobMode::LivestreamRecord, JobPhase::Queued) => "Recording livestream...",
            (JobMode::LivestreamRecord, JobPhase::Running) => {
                "Recording started! This may take some time."
            }
            (JobMode::LivestreamRecord, JobPhase::Completed) => "Livestream recording completed!",
            (JobMode::MetadataOnly, JobPhase::Queued | JobPhase::Running) => "Generating Metadata...",
            (JobMode::MetadataOnly, JobPhase::Completed) => "Metadata saved!",
        };

        Self {
            action: Some(action),
            phase,
            text: text.to_owned(),
        }
    }
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Writer side of the status slot. Cheap to clone; every clone writes the same slot.
#[derive(Debug, Clone)]
pub struct StatusChannel {
    tx: watch::Sender<StatusMessage>,
}

impl StatusChannel {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(StatusMessage::idle());
        Self { tx }
    }

    /// Overwrite the current status. Succeeds even when nobody is listening.
    pub fn publish(&self, message: StatusMessage) {
        tracing::debug!(phase = ?message.phase, "{}", message.text);
        self.tx.send_replace(message);
    }

    pub fn current(&self) -> StatusMessage {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> StatusReceiver {
        StatusReceiver {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for StatusChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Reader side of the status slot
#[derive(Debug, Clone)]
pub struct StatusReceiver {
    rx: watch::Receiver<StatusMessage>,
}

impl StatusReceiver {
    pub fn current(&self) -> StatusMessage {
        self.rx.borrow().clone()
    }

    /// Wait for a newer message than the last one seen.
    ///
    /// Intermediate writes may be skipped; only the latest value is returned.
    /// Returns `None` once every [`StatusChannel`] has been dropped.
    pub async fn changed(&mut self) -> Option<StatusMessage> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}
