// components/media_downloader/src/ytdlp.rs
use crate::error::EngineError;
use crate::metadata::MediaInfo;
use crate::spec::{Directive, JobSpecification};
use crate::types::JobMode;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

/// The external extraction/download engine
#[async_trait]
pub trait Engine: Send + Sync {
    /// Check that the engine can be invoked at all
    async fn check_available(&self) -> Result<(), EngineError>;

    /// Transfer the media described by `spec`
    async fn download(&self, spec: &JobSpecification) -> Result<(), EngineError>;

    /// Resolve info for `spec` without transferring media
    async fn extract_info(&self, spec: &JobSpecification) -> Result<MediaInfo, EngineError>;
}

/// Drives the `yt-dlp` command line program
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: PathBuf,
    ffmpeg_location: Option<PathBuf>,
}

impl YtDlp {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            ffmpeg_location: None,
        }
    }

    /// Hand the engine an explicit ffmpeg binary instead of relying on `PATH`
    pub fn with_ffmpeg(mut self, ffmpeg: impl Into<PathBuf>) -> Self {
        self.ffmpeg_location = Some(ffmpeg.into());
        self
    }

    pub fn program(&self) -> &std::path::Path {
        &self.program
    }

    /// Command line arguments equivalent to `spec`
    pub fn command_args(&self, spec: &JobSpecification) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();

        if let Some(template) = &spec.output_template {
            args.push("-o".into());
            args.push(template.into());
        }
        if let Some(format) = spec.format {
            args.push("-f".into());
            args.push(format.as_str().into());
        }

        for directive in &spec.directives {
            match directive {
                Directive::LiveFromStart => args.push("--live-from-start".into()),
                Directive::FlatListing => {
                    args.push("--flat-playlist".into());
                    args.push("--dump-single-json".into());
                }
                Directive::ExtractAudio {
                    codec,
                    quality_kbps,
                } => {
                    args.push("--extract-audio".into());
                    args.push("--audio-format".into());
                    args.push(codec.as_str().into());
                    args.push("--audio-quality".into());
                    args.push(format!("{quality_kbps}K").into());
                }
                Directive::Subtitles { languages } => {
                    args.push("--write-subs".into());
                    args.push("--sub-langs".into());
                    args.push(languages.join(",").into());
                }
                Directive::Thumbnail => args.push("--write-thumbnail".into()),
                Directive::DownloadArchive(path) => {
                    args.push("--download-archive".into());
                    args.push(path.into());
                }
            }
        }

        if spec.mode != JobMode::MetadataOnly {
            args.push("--no-progress".into());
        }
        if let Some(ffmpeg) = &self.ffmpeg_location {
            args.push("--ffmpeg-location".into());
            args.push(ffmpeg.into());
        }

        args.push("--".into());
        args.push((&spec.url).into());
        args
    }

    async fn run(&self, spec: &JobSpecification) -> Result<Vec<u8>, EngineError> {
        let args = self.command_args(spec);
        tracing::debug!(program = %self.program.display(), ?args, "invoking engine");

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| EngineError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(EngineError::Failed {
                program: self.program.display().to_string(),
                code: output.status.code(),
                stderr: error_detail(&String::from_utf8_lossy(&output.stderr)),
            });
        }

        Ok(output.stdout)
    }
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

#[async_trait]
impl Engine for YtDlp {
    async fn check_available(&self) -> Result<(), EngineError> {
        which::which(&self.program)
            .map(|path| tracing::debug!("engine found at {}", path.display()))
            .map_err(|_| EngineError::NotFound(self.program.display().to_string()))
    }

    async fn download(&self, spec: &JobSpecification) -> Result<(), EngineError> {
        self.run(spec).await.map(|_| ())
    }

    async fn extract_info(&self, spec: &JobSpecification) -> Result<MediaInfo, EngineError> {
        let stdout = self.run(spec).await?;
        Ok(serde_json::from_slice(&stdout)?)
    }
}

/// The engine's own error lines, or the last line it printed
fn error_detail(stderr: &str) -> String {
    let errors: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("ERROR:"))
        .collect();

    if !errors.is_empty() {
        return errors.join("\n");
    }

    stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .unwrap_or("no error output")
        .to_owned()
}
