// bases/download_cli/src/args.rs
use clap::{Parser, Subcommand};
use media_downloader::FFMPEG_ARCHIVE_URL;
use std::path::PathBuf;
use url::Url;

/// Download media and export its metadata
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory to store downloaded files (defaults to the current directory)
    #[arg(short, long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Keep only the audio track, converted to MP3
    #[arg(long, global = true)]
    pub audio_only: bool,

    /// Also fetch English subtitles
    #[arg(long, global = true)]
    pub subtitles: bool,

    /// Also fetch the thumbnail image
    #[arg(long, global = true)]
    pub thumbnail: bool,

    /// Skip items already listed in <output-dir>/archive.txt
    #[arg(long, global = true)]
    pub archive: bool,

    /// Where ffmpeg is unpacked when it has to be installed (defaults to the current directory)
    #[arg(long, global = true)]
    pub tools_dir: Option<PathBuf>,

    /// Archive to install ffmpeg from
    #[arg(long, global = true, default_value = FFMPEG_ARCHIVE_URL)]
    pub ffmpeg_archive_url: Url,

    /// Do not verify the ffmpeg archive against its published SHA-256
    #[arg(long, global = true)]
    pub skip_checksum: bool,

    /// yt-dlp executable to run
    #[arg(long, global = true, default_value = "yt-dlp")]
    pub yt_dlp: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Download a video, audio track or playlist
    Download {
        /// Video or playlist URL
        url: String,
    },
    /// Record a live stream from its beginning
    Record {
        /// Live stream URL
        url: String,
    },
    /// Write metadata.json and metadata.csv without downloading media
    Metadata {
        /// Video or playlist URL
        url: String,
    },
    /// Read actions from standard input, running them in the background
    Shell,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_after_subcommand() {
        let args = Args::parse_from([
            "download-cli",
            "download",
            "https://example.com/v1",
            "--audio-only",
            "-o",
            "/tmp/out",
        ]);

        assert!(args.audio_only);
        assert_eq!(args.output_dir, Some(PathBuf::from("/tmp/out")));
        assert_eq!(
            args.command,
            Command::Download {
                url: "https://example.com/v1".to_string()
            }
        );
    }

    #[test]
    fn defaults() {
        let args = Args::parse_from(["download-cli", "shell"]);

        assert_eq!(args.output_dir, None);
        assert_eq!(args.ffmpeg_archive_url.as_str(), FFMPEG_ARCHIVE_URL);
        assert_eq!(args.yt_dlp, PathBuf::from("yt-dlp"));
        assert!(!args.skip_checksum);
        assert_eq!(args.command, Command::Shell);
    }

    #[test]
    fn invalid_archive_url_is_rejected() {
        let result = Args::try_parse_from([
            "download-cli",
            "--ffmpeg-archive-url",
            "not a url",
            "shell",
        ]);
        assert!(result.is_err());
    }
}
