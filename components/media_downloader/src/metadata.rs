// components/media_downloader/src/metadata.rs
use crate::error::ExportError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

pub const JSON_FILE: &str = "metadata.json";
pub const CSV_FILE: &str = "metadata.csv";

/// Written for every schema field an item does not carry
pub const NOT_AVAILABLE: &str = "N/A";

/// Column order of `metadata.csv`. Fields outside this list are never exported.
pub const CSV_FIELDS: [&str; 39] = [
    "id",
    "title",
    "fulltitle",
    "ext",
    "alt_title",
    "description",
    "display_id",
    "uploader",
    "uploader_id",
    "uploader_url",
    "license",
    "creators",
    "creator",
    "timestamp",
    "upload_date",
    "release_timestamp",
    "release_date",
    "release_year",
    "modified_timestamp",
    "modified_date",
    "channel",
    "channel_id",
    "channel_url",
    "channel_follower_count",
    "channel_is_verified",
    "location",
    "duration",
    "duration_string",
    "view_count",
    "like_count",
    "dislike_count",
    "comment_count",
    "age_limit",
    "live_status",
    "is_live",
    "was_live",
    "categories",
    "tags",
    "webpage_url",
];

/// Raw info returned by the engine for a single item or a playlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaInfo(Value);

impl MediaInfo {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Playlist entries, when the info describes a non-empty collection
    pub fn entries(&self) -> Option<&[Value]> {
        match self.0.get("entries") {
            Some(Value::Array(entries)) if !entries.is_empty() => Some(entries),
            _ => None,
        }
    }

    /// The records projected to CSV, one per row
    pub fn items(&self) -> Vec<&Value> {
        match self.entries() {
            Some(entries) => entries.iter().collect(),
            None => vec![&self.0],
        }
    }
}

/// Paths of the two artifacts written by [`project`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataExport {
    pub json_path: PathBuf,
    pub csv_path: PathBuf,
}

/// Write `metadata.json` and `metadata.csv` for `info` into `destination`
pub async fn project(info: &MediaInfo, destination: &Path) -> Result<MetadataExport, ExportError> {
    let json_path = destination.join(JSON_FILE);
    let csv_path = destination.join(CSV_FILE);

    let json = render_json(info)?;
    write(&json_path, json).await?;

    let csv = render_csv(info)?;
    write(&csv_path, csv).await?;

    tracing::info!(
        rows = info.items().len(),
        json = %json_path.display(),
        csv = %csv_path.display(),
        "metadata exported"
    );

    Ok(MetadataExport {
        json_path,
        csv_path,
    })
}

/// Full info as UTF-8 JSON, four-space indented, non-ASCII kept literal
pub fn render_json(info: &MediaInfo) -> Result<Vec<u8>, ExportError> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    info.serialize(&mut serializer)?;
    Ok(out)
}

/// Header plus one row per item, restricted to [`CSV_FIELDS`]
pub fn render_csv(info: &MediaInfo) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_FIELDS)?;

    for item in info.items() {
        writer.write_record(project_row(item))?;
    }

    writer
        .into_inner()
        .map_err(|e| ExportError::Csv(e.into_error().into()))
}

/// Schema-ordered cell values for one record
pub fn project_row(item: &Value) -> Vec<String> {
    let empty = Map::new();
    let record = item.as_object().unwrap_or(&empty);
    CSV_FIELDS
        .iter()
        .map(|field| render_cell(record.get(*field)))
        .collect()
}

fn render_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => NOT_AVAILABLE.to_owned(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

async fn write(path: &Path, contents: Vec<u8>) -> Result<(), ExportError> {
    tokio::fs::write(path, contents)
        .await
        .map_err(|source| ExportError::Write {
            path: path.to_path_buf(),
            source,
        })
}
