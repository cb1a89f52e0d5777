// components/media_downloader/src/error.rs
use std::path::PathBuf;
use thiserror::Error;

/// Rejected user input, raised before any job is built
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a valid URL.")]
    EmptyUrl,
}

/// The external binary dependency could not be found or installed
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("failed to download {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("checksum mismatch for {url}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    #[error("no checksum found in {0}")]
    ChecksumMissing(String),

    #[error("failed to extract archive: {0}")]
    Archive(String),

    #[error("{0} has no ffmpeg build for this platform; pass an archive for this system")]
    UnsupportedPlatform(String),

    #[error("failed to locate {0} binaries")]
    BinaryNotFound(&'static str),

    #[error("io error during {operation}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },
}

impl BootstrapError {
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        BootstrapError::Io {
            operation: operation.into(),
            source,
        }
    }
}

/// Failure reported by the extraction/download engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Required dependency not found: {0}")]
    NotFound(String),

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The engine ran and exited unsuccessfully; `code` is `None` when killed by a signal
    #[error("{program} failed: {stderr}")]
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("unreadable engine output: {0}")]
    InvalidOutput(#[from] serde_json::Error),
}

/// Failure while writing the metadata artifacts
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to serialize metadata: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to render CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Anything that ends a dispatched job early
#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("cannot use destination {path}: {source}")]
    Destination {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
