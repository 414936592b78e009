use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::HistoryError;
use crate::timestamp::Timestamp;

/// The kind of change that produced a revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Created,
    Changed,
    Deleted,
    Renamed,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Created => "Created",
            Operation::Changed => "Changed",
            Operation::Deleted => "Deleted",
            Operation::Renamed => "Renamed",
        }
    }

    /// Deletion records carry metadata only.
    pub fn has_payload(&self) -> bool {
        !matches!(self, Operation::Deleted)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contents of a record's metadata file (`history.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryDescr {
    pub user: Option<String>,
    pub user_id: Option<String>,
    pub operation: Operation,
    /// Record timestamp string in [`TIMESTAMP_FORMAT`](crate::TIMESTAMP_FORMAT).
    pub timestamp: String,
}

/// (entity name, timestamp): addresses exactly one record without loading it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RevisionId {
    pub name: String,
    pub timestamp: Timestamp,
}

impl RevisionId {
    pub fn new(name: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            name: name.into(),
            timestamp,
        }
    }

    /// Build an identifier from raw request parameters.
    ///
    /// Both parameters must be present; the name must be a valid entity name
    /// and the timestamp must be in record format.
    pub fn from_params(name: Option<&str>, timestamp: Option<&str>) -> Result<Self, HistoryError> {
        let name = require_param("name", name)?;
        let timestamp = require_param("timestamp", timestamp)?;
        validate_entity_name(name)?;
        let timestamp = Timestamp::parse(timestamp)
            .map_err(|e| HistoryError::InvalidRequest(e.to_string()))?;
        Ok(Self::new(name, timestamp))
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.timestamp)
    }
}

fn require_param<'a>(param: &str, value: Option<&'a str>) -> Result<&'a str, HistoryError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(HistoryError::InvalidRequest(format!(
            "missing parameter '{}'",
            param
        ))),
    }
}

/// Entity names are relative paths of plain components, e.g. `folder/job`.
///
/// They are joined onto the history root, so anything that could escape it
/// (`..`, absolute paths, empty segments) is rejected.
pub fn validate_entity_name(name: &str) -> Result<(), HistoryError> {
    let invalid = |why: &str| HistoryError::InvalidRequest(format!("invalid entity name '{}': {}", name, why));
    if name.is_empty() {
        return Err(invalid("empty"));
    }
    if name.contains('\\') || name.contains('\0') {
        return Err(invalid("contains a forbidden character"));
    }
    if name.split('/').any(|seg| seg.is_empty() || seg.starts_with('.')) {
        return Err(invalid("empty or hidden path segment"));
    }
    // A nested history directory with such a name would be read as a record
    // of its parent entity.
    if name.split('/').any(|seg| Timestamp::parse(seg).is_ok()) {
        return Err(invalid("path segment looks like a record timestamp"));
    }
    for component in Path::new(name).components() {
        if !matches!(component, Component::Normal(_)) {
            return Err(invalid("must be a relative path"));
        }
    }
    Ok(())
}

/// Lightweight summary of one record used for listings. Never carries the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigInfo {
    pub id: RevisionId,
    pub operation: Operation,
    pub user: Option<String>,
    pub user_id: Option<String>,
    /// The record directory.
    pub file: PathBuf,
    /// Whether the record directory holds a configuration payload.
    pub has_config: bool,
}

impl ConfigInfo {
    pub(crate) fn from_descr(id: RevisionId, descr: HistoryDescr, file: PathBuf, has_config: bool) -> Self {
        Self {
            id,
            operation: descr.operation,
            user: descr.user,
            user_id: descr.user_id,
            file,
            has_config,
        }
    }
}

/// One fully loaded revision: summary plus the configuration payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionRecord {
    pub info: ConfigInfo,
    pub payload: Vec<u8>,
}
