// bases/download_cli/src/app.rs
use crate::args::Command;
use crate::config::Config;
use crate::output::OutputHandler;
use crate::shell::Shell;
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use media_downloader::{
    ensure_engine_dependency, EngineDependency, JobHandle, JobMode, JobRequest, MediaDownloader,
    Notification, YtDlp,
};
use tokio::sync::mpsc;
use tracing::{debug, info};

pub struct App {
    config: Config,
    command: Command,
    output: OutputHandler,
}

impl App {
    pub fn new(config: Config, command: Command) -> Self {
        let output = OutputHandler::new(config.verbose);
        Self {
            config,
            command,
            output,
        }
    }

    /// Returns whether every job that ran succeeded
    pub async fn run(&self) -> Result<bool> {
        let dependency = self.bootstrap().await?;
        self.output.print_dependency(&dependency);

        let engine = YtDlp::new(&self.config.yt_dlp);
        let (downloader, notifications) = MediaDownloader::new(engine, &dependency)
            .await
            .wrap_err("Download engine is not usable")?;

        let (mode, url) = match &self.command {
            Command::Download { url } => (JobMode::StandardDownload, url),
            Command::Record { url } => (JobMode::LivestreamRecord, url),
            Command::Metadata { url } => (JobMode::MetadataOnly, url),
            Command::Shell => {
                let shell = Shell::new(&self.config, self.output.clone());
                shell.run(downloader, notifications).await?;
                return Ok(true);
            }
        };

        let flags = match mode {
            JobMode::MetadataOnly => Default::default(),
            _ => self.config.flags,
        };
        let request = JobRequest::new(url, &self.config.output_dir, mode, flags)?;
        self.run_one(&downloader, notifications, request).await
    }

    async fn bootstrap(&self) -> Result<EngineDependency> {
        let config = self.config.bootstrap.clone();
        debug!("Checking ffmpeg, tools dir {}", config.tools_dir.display());

        tokio::task::spawn_blocking(move || ensure_engine_dependency(&config))
            .await?
            .map_err(|e| eyre!("Failed to install FFmpeg: {}", e))
    }

    async fn run_one(
        &self,
        downloader: &MediaDownloader,
        mut notifications: mpsc::UnboundedReceiver<Notification>,
        request: JobRequest,
    ) -> Result<bool> {
        // Subscribe before submitting so the first transition is not missed
        let mut status = downloader.status();
        let output = self.output.clone();
        let printer = tokio::spawn(async move {
            let mut last = String::new();
            while let Some(message) = status.changed().await {
                if message.text != last {
                    output.print_status(&message);
                    last = message.text.clone();
                }
                if message.phase.is_terminal() {
                    break;
                }
            }
        });

        let handle: JobHandle = downloader.submit(request);
        info!("Started job #{} ({})", handle.id(), handle.action());

        let report = handle.wait().await?;
        printer.await?;

        while let Ok(notification) = notifications.try_recv() {
            self.output.print_notification(&notification);
        }
        self.output.print_report(&report);

        Ok(report.is_success())
    }

    pub fn print_error(&self, error: &color_eyre::Report) {
        self.output.print_error(error);
    }
}
