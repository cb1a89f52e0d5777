// components/media_downloader/src/spec.rs
//! Translation of a [`JobRequest`] into the complete option set handed to the engine.
//!
//! Building is pure: no filesystem or network access happens here. The rules are
//! applied in a fixed order and later rules only ever add directives.

use crate::types::{JobMode, JobRequest};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Engine placeholder for the media file name
const FILE_PATTERN: &str = "%(title)s.%(ext)s";
const LIVESTREAM_DIR: &str = "livestreams";
const ARCHIVE_FILE: &str = "archive.txt";
const SUBTITLE_LANGUAGE: &str = "en";
const MP3_QUALITY_KBPS: u32 = 192;

/// Which stream(s) the engine should pick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FormatSelector {
    /// Best video merged with best audio, else best available
    BestCombined,
    /// Best single pre-merged stream
    BestSingle,
    /// Best audio only, else best available
    BestAudio,
}

impl FormatSelector {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormatSelector::BestCombined => "bestvideo+bestaudio/best",
            FormatSelector::BestSingle => "best",
            FormatSelector::BestAudio => "bestaudio/best",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AudioCodec {
    Mp3,
}

impl AudioCodec {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioCodec::Mp3 => "mp3",
        }
    }
}

/// Extra work requested from the engine, in the order it was added
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Directive {
    /// Record a live stream from its beginning
    LiveFromStart,
    /// List entries without resolving or transferring media
    FlatListing,
    ExtractAudio { codec: AudioCodec, quality_kbps: u32 },
    Subtitles { languages: Vec<String> },
    Thumbnail,
    /// Skip items already recorded in this ledger, and record new ones
    DownloadArchive(PathBuf),
}

/// Fully resolved option set for one job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSpecification {
    pub url: String,
    pub mode: JobMode,
    pub destination: PathBuf,
    /// Absent for metadata jobs, which transfer no media
    pub output_template: Option<PathBuf>,
    pub format: Option<FormatSelector>,
    pub directives: Vec<Directive>,
}

impl JobSpecification {
    pub fn build(request: &JobRequest) -> Self {
        let destination = request.destination().to_path_buf();
        let flags = request.flags();

        if request.mode() == JobMode::MetadataOnly {
            return Self {
                url: request.url().to_owned(),
                mode: JobMode::MetadataOnly,
                destination,
                output_template: None,
                format: None,
                directives: vec![Directive::FlatListing],
            };
        }

        let mut template = output_template(&destination, None);
        let mut format = FormatSelector::BestCombined;
        let mut directives = Vec::new();

        if request.mode() == JobMode::LivestreamRecord {
            template = output_template(&destination, Some(LIVESTREAM_DIR));
            format = FormatSelector::BestSingle;
            directives.push(Directive::LiveFromStart);
        }

        if flags.audio_only {
            format = FormatSelector::BestAudio;
            directives.push(Directive::ExtractAudio {
                codec: AudioCodec::Mp3,
                quality_kbps: MP3_QUALITY_KBPS,
            });
        }

        if flags.subtitles {
            directives.push(Directive::Subtitles {
                languages: vec![SUBTITLE_LANGUAGE.to_owned()],
            });
        }

        if flags.thumbnail {
            directives.push(Directive::Thumbnail);
        }

        if flags.archive_mode {
            directives.push(Directive::DownloadArchive(destination.join(ARCHIVE_FILE)));
        }

        Self {
            url: request.url().to_owned(),
            mode: request.mode(),
            destination,
            output_template: Some(template),
            format: Some(format),
            directives,
        }
    }

    /// A livestream recording that was also asked to extract audio.
    ///
    /// Both directives are kept and the audio selector wins; callers decide
    /// whether that is acceptable.
    pub fn has_format_conflict(&self) -> bool {
        self.mode == JobMode::LivestreamRecord
            && self
                .directives
                .iter()
                .any(|d| matches!(d, Directive::ExtractAudio { .. }))
    }

    pub fn archive_path(&self) -> Option<&Path> {
        self.directives.iter().find_map(|d| match d {
            Directive::DownloadArchive(path) => Some(path.as_path()),
            _ => None,
        })
    }
}

/// Joined as a path so a non-UTF-8 destination reaches the engine unchanged
fn output_template(destination: &Path, subdir: Option<&str>) -> PathBuf {
    match subdir {
        Some(subdir) => destination.join(subdir).join(FILE_PATTERN),
        None => destination.join(FILE_PATTERN),
    }
}
