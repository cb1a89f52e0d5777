// components/media_downloader/src/lib.rs
mod bootstrap;
mod dispatch;
mod error;
mod metadata;
mod spec;
mod status;
mod types;
mod utils;
mod ytdlp;

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

pub use bootstrap::{
    ensure_engine_dependency, BootstrapConfig, DependencySource, EngineDependency,
    FFMPEG_ARCHIVE_URL,
};
pub use dispatch::{Dispatcher, JobHandle, JobOutput, JobReport, Notification, NotificationKind};
pub use error::{BootstrapError, EngineError, ExportError, JobError, ValidationError};
pub use metadata::{
    project, render_csv, render_json, MediaInfo, MetadataExport, CSV_FIELDS, NOT_AVAILABLE,
};
pub use spec::{AudioCodec, Directive, FormatSelector, JobSpecification};
pub use status::{JobPhase, StatusChannel, StatusMessage, StatusReceiver};
pub use types::{JobFlags, JobMode, JobRequest};
pub use ytdlp::{Engine, YtDlp};

/// Entry point for the interface: one method per user action
pub struct MediaDownloader {
    dispatcher: Dispatcher,
}

impl MediaDownloader {
    /// Create a downloader using yt-dlp with an explicitly resolved ffmpeg
    pub async fn new(
        engine: YtDlp,
        dependency: &EngineDependency,
    ) -> Result<(Self, mpsc::UnboundedReceiver<Notification>), EngineError> {
        let engine = engine.with_ffmpeg(&dependency.ffmpeg);
        Self::new_with_engine(Arc::new(engine)).await
    }

    /// Create a downloader with a specific engine implementation
    pub async fn new_with_engine(
        engine: Arc<dyn Engine>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<Notification>), EngineError> {
        engine.check_available().await?;

        let (tx, rx) = mpsc::unbounded_channel();
        let dispatcher = Dispatcher::new(engine, StatusChannel::new(), tx);
        Ok((Self { dispatcher }, rx))
    }

    /// Watch the shared status slot
    pub fn status(&self) -> StatusReceiver {
        self.dispatcher.status().subscribe()
    }

    pub fn start_download(
        &self,
        url: &str,
        destination: impl Into<PathBuf>,
        flags: JobFlags,
    ) -> Result<JobHandle, ValidationError> {
        self.trigger(url, destination, JobMode::StandardDownload, flags)
    }

    pub fn record_live(
        &self,
        url: &str,
        destination: impl Into<PathBuf>,
        flags: JobFlags,
    ) -> Result<JobHandle, ValidationError> {
        self.trigger(url, destination, JobMode::LivestreamRecord, flags)
    }

    pub fn generate_metadata(
        &self,
        url: &str,
        destination: impl Into<PathBuf>,
    ) -> Result<JobHandle, ValidationError> {
        self.trigger(url, destination, JobMode::MetadataOnly, JobFlags::default())
    }

    /// Build and dispatch an already validated request
    pub fn submit(&self, request: JobRequest) -> JobHandle {
        self.dispatcher.dispatch(JobSpecification::build(&request))
    }

    fn trigger(
        &self,
        url: &str,
        destination: impl Into<PathBuf>,
        mode: JobMode,
        flags: JobFlags,
    ) -> Result<JobHandle, ValidationError> {
        let request = JobRequest::new(url, destination, mode, flags)?;
        Ok(self.submit(request))
    }
}
