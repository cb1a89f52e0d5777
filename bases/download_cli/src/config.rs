// bases/download_cli/src/config.rs
use crate::args::Args;
use media_downloader::{BootstrapConfig, JobFlags};
use std::path::{Path, PathBuf};

/// Everything the app needs, resolved once from the command line
#[derive(Debug, Clone)]
pub struct Config {
    /// Destination for media and metadata
    pub output_dir: PathBuf,

    /// Download toggles applied to every action
    pub flags: JobFlags,

    pub bootstrap: BootstrapConfig,

    /// yt-dlp executable
    pub yt_dlp: PathBuf,

    pub verbose: bool,
}

impl Config {
    /// Create configuration from CLI arguments, resolving relative defaults against `cwd`
    pub fn from_args(args: &Args, cwd: &Path) -> Self {
        let output_dir = args
            .output_dir
            .clone()
            .unwrap_or_else(|| cwd.to_path_buf());
        let tools_dir = args.tools_dir.clone().unwrap_or_else(|| cwd.to_path_buf());

        Self {
            output_dir,
            flags: JobFlags {
                audio_only: args.audio_only,
                subtitles: args.subtitles,
                thumbnail: args.thumbnail,
                archive_mode: args.archive,
            },
            bootstrap: BootstrapConfig {
                tools_dir,
                archive_url: args.ffmpeg_archive_url.clone(),
                verify_checksum: !args.skip_checksum,
            },
            yt_dlp: args.yt_dlp.clone(),
            verbose: args.verbose,
        }
    }

    /// Default log filter, overridden by `RUST_LOG`
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "download_cli=debug,media_downloader=debug"
        } else {
            "download_cli=info,media_downloader=info"
        }
    }
}
