// components/media_downloader/src/types.rs
use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// What a job does with the URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobMode {
    StandardDownload,
    LivestreamRecord,
    MetadataOnly,
}

impl fmt::Display for JobMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobMode::StandardDownload => "download",
            JobMode::LivestreamRecord => "record",
            JobMode::MetadataOnly => "metadata",
        };
        f.write_str(name)
    }
}

/// The four user-facing download toggles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFlags {
    pub audio_only: bool,
    pub subtitles: bool,
    pub thumbnail: bool,
    pub archive_mode: bool,
}

/// One user action, captured as a value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    url: String,
    destination: PathBuf,
    mode: JobMode,
    flags: JobFlags,
}

impl JobRequest {
    /// Build a request, rejecting an empty URL.
    ///
    /// An empty destination means the current directory.
    pub fn new(
        url: impl AsRef<str>,
        destination: impl Into<PathBuf>,
        mode: JobMode,
        flags: JobFlags,
    ) -> Result<Self, ValidationError> {
        let url = url.as_ref().trim();
        if url.is_empty() {
            return Err(ValidationError::EmptyUrl);
        }

        let mut destination = destination.into();
        if destination.as_os_str().is_empty() {
            destination = PathBuf::from(".");
        }

        Ok(Self {
            url: url.to_owned(),
            destination,
            mode,
            flags,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn destination(&self) -> &std::path::Path {
        &self.destination
    }

    pub fn mode(&self) -> JobMode {
        self.mode
    }

    pub fn flags(&self) -> JobFlags {
        self.flags
    }
}
