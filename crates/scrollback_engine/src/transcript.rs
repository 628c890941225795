use std::fs;
use std::path::{Path, PathBuf};

use engine_logging::{engine_info, engine_warn};
use scrollback_core::{
    Category, CategoryTotals, Content, NumberedRecord, SelectedRecord, SelectionCounter,
    StoredRecord,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::persist::{AtomicFileWriter, PersistError};

pub const TRANSCRIPT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum TranscriptError {
    #[error("io error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed transcript {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize transcript: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
    #[error("output path {0:?} has no file name")]
    InvalidPath(PathBuf),
}

/// On-disk form of a harvested or cropped record list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptFile {
    #[serde(default = "default_format_version")]
    pub format_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub harvested_utc: Option<String>,
    /// Range spec of the last crop applied to this transcript.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection_spec: Option<String>,
    #[serde(default)]
    pub records: Vec<TranscriptRecord>,
}

fn default_format_version() -> u32 {
    TRANSCRIPT_FORMAT_VERSION
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptTotals {
    pub user: u32,
    pub assistant: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptSelection {
    pub position: u32,
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn: Option<String>,
    #[serde(default)]
    pub html: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<String>,
    /// Original global index. Read leniently: numbers or numeric strings.
    #[serde(default, deserialize_with = "lenient_index")]
    pub index: Option<u32>,
    #[serde(default, deserialize_with = "lenient_index")]
    pub role_index: Option<u32>,
    #[serde(default)]
    pub totals: Option<TranscriptTotals>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<TranscriptSelection>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub missing_original_index: bool,
}

fn lenient_index<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let index = match value {
        Some(Value::Number(number)) => number.as_u64().and_then(|n| u32::try_from(n).ok()),
        Some(Value::String(text)) => text.trim().parse::<u32>().ok(),
        _ => None,
    };
    Ok(index.filter(|n| *n > 0))
}

impl From<StoredRecord> for TranscriptRecord {
    fn from(record: StoredRecord) -> Self {
        Self {
            id: record.identity,
            role: record.category.as_str().to_string(),
            turn: record.group_id,
            html: record.content.rich,
            text: record.content.plain,
            attachments: record.attachments.into_iter().collect(),
            index: record.global_index,
            role_index: record.category_index,
            totals: record.running_totals.map(|t| TranscriptTotals {
                user: t.user,
                assistant: t.assistant,
            }),
            selection: record.selection.map(|s| TranscriptSelection {
                position: s.position,
                total: s.total,
            }),
            missing_original_index: false,
        }
    }
}

impl From<NumberedRecord> for TranscriptRecord {
    fn from(record: NumberedRecord) -> Self {
        StoredRecord::from(record).into()
    }
}

impl From<SelectedRecord> for TranscriptRecord {
    fn from(selected: SelectedRecord) -> Self {
        let missing = selected.missing_original_index;
        Self {
            missing_original_index: missing,
            ..TranscriptRecord::from(StoredRecord::from(selected))
        }
    }
}

impl From<TranscriptRecord> for StoredRecord {
    fn from(record: TranscriptRecord) -> Self {
        Self {
            identity: record.id,
            category: Category::from_role(&record.role),
            group_id: record.turn,
            content: Content::new(record.html, record.text),
            attachments: record.attachments.into_iter().collect(),
            global_index: record.index,
            category_index: record.role_index,
            running_totals: record
                .totals
                .map(|t| CategoryTotals::new(t.user, t.assistant)),
            selection: record.selection.map(|s| SelectionCounter {
                position: s.position,
                total: s.total,
            }),
        }
    }
}

impl TranscriptFile {
    pub fn from_harvest(records: Vec<NumberedRecord>) -> Self {
        Self {
            format_version: TRANSCRIPT_FORMAT_VERSION,
            title: None,
            source: None,
            harvested_utc: None,
            selection_spec: None,
            records: records.into_iter().map(TranscriptRecord::from).collect(),
        }
    }

    pub fn stored_records(&self) -> Vec<StoredRecord> {
        self.records.iter().cloned().map(StoredRecord::from).collect()
    }
}

pub fn load_transcript(path: &Path) -> Result<TranscriptFile, TranscriptError> {
    let content = fs::read_to_string(path).map_err(|source| TranscriptError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file: TranscriptFile =
        serde_json::from_str(&content).map_err(|source| TranscriptError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    if file.format_version != TRANSCRIPT_FORMAT_VERSION {
        engine_warn!(
            "transcript {:?} has format version {}, expected {}",
            path,
            file.format_version,
            TRANSCRIPT_FORMAT_VERSION
        );
    }
    engine_info!("loaded {} records from {:?}", file.records.len(), path);
    Ok(file)
}

/// Atomically write `file` as pretty JSON to `path`.
pub fn save_transcript(path: &Path, file: &TranscriptFile) -> Result<PathBuf, TranscriptError> {
    let content = serde_json::to_string_pretty(file)?;
    write_output(path, &content)
}

/// Atomically write `content` to `path`, creating the parent directory if needed.
pub fn write_output(path: &Path, content: &str) -> Result<PathBuf, TranscriptError> {
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| TranscriptError::InvalidPath(path.to_path_buf()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let written = AtomicFileWriter::new(dir).write(filename, content)?;
    engine_info!("wrote {:?}", written);
    Ok(written)
}
