use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::HistoryConfig;
use crate::error::HistoryError;
use crate::layout::HistoryLayout;
use crate::record::{validate_entity_name, HistoryDescr, Operation, RevisionId};
use crate::timestamp::Timestamp;

/// How many successive seconds to try before giving up on a free record slot.
const MAX_SLOT_ATTEMPTS: usize = 60;

/// Appends new records to the history tree.
///
/// Each record is assembled in a hidden staging directory next to its final
/// location and then renamed into place, so readers either see a complete
/// record or none at all. Existing records are never touched.
#[derive(Debug, Clone)]
pub struct RecordWriter {
    layout: HistoryLayout,
}

/// Who made a change, as stored in the record metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Author {
    pub user: Option<String>,
    pub user_id: Option<String>,
}

impl Author {
    pub fn system() -> Self {
        Self::default()
    }

    pub fn user(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            user: Some(name.clone()),
            user_id: Some(name),
        }
    }
}

impl RecordWriter {
    pub fn new(config: &HistoryConfig) -> Self {
        Self {
            layout: HistoryLayout::new(config),
        }
    }

    /// Record a change made now. When a record already exists for the current
    /// second, the next free second is used.
    pub fn record(
        &self,
        name: &str,
        operation: Operation,
        author: &Author,
        payload: Option<&[u8]>,
    ) -> Result<RevisionId, HistoryError> {
        let mut timestamp = Timestamp::now();
        for _ in 0..MAX_SLOT_ATTEMPTS {
            match self.record_at(name, timestamp, operation, author, payload) {
                Err(HistoryError::WriteFailed { source, .. })
                    if source.kind() == io::ErrorKind::AlreadyExists =>
                {
                    tracing::debug!("record slot {} taken for '{}'", timestamp, name);
                }
                other => return other,
            }
            timestamp = timestamp.next_second().ok_or_else(|| {
                HistoryError::InvalidRequest("record timestamp out of range".to_string())
            })?;
        }
        Err(HistoryError::WriteFailed {
            path: self.layout.history_dir(name),
            source: io::Error::new(
                io::ErrorKind::AlreadyExists,
                "no free record slot within a minute of now",
            ),
        })
    }

    /// Record a change at an explicit timestamp. Fails with `WriteFailed`
    /// (kind `AlreadyExists`) when that record already exists.
    pub fn record_at(
        &self,
        name: &str,
        timestamp: Timestamp,
        operation: Operation,
        author: &Author,
        payload: Option<&[u8]>,
    ) -> Result<RevisionId, HistoryError> {
        validate_entity_name(name)?;
        let payload = match (operation.has_payload(), payload) {
            (true, Some(p)) => Some(p),
            (true, None) => {
                return Err(HistoryError::InvalidRequest(format!(
                    "{} record needs a configuration payload",
                    operation
                )))
            }
            (false, _) => None,
        };

        let id = RevisionId::new(name, timestamp);
        let history_dir = self.layout.history_dir(name);
        fs::create_dir_all(&history_dir).map_err(|source| HistoryError::WriteFailed {
            path: history_dir.clone(),
            source,
        })?;

        let final_dir = self.layout.record_dir(&id);
        if final_dir.exists() {
            return Err(HistoryError::WriteFailed {
                path: final_dir,
                source: io::Error::new(io::ErrorKind::AlreadyExists, "record already exists"),
            });
        }

        // Unique per call, so concurrent writers never share or remove each
        // other's staging directory. Dropping the guard cleans up on failure.
        let staging = tempfile::Builder::new()
            .prefix(&format!(".{}.", timestamp))
            .suffix(".staging")
            .tempdir_in(&history_dir)
            .map_err(|source| HistoryError::WriteFailed {
                path: history_dir.clone(),
                source,
            })?;
        let descr = HistoryDescr {
            user: author.user.clone(),
            user_id: author.user_id.clone(),
            operation,
            timestamp: timestamp.to_string(),
        };
        self.stage(staging.path(), &descr, payload)?;

        // rename(2) onto an existing non-empty directory fails, which closes
        // the race with a concurrent writer that took the same slot.
        if let Err(source) = fs::rename(staging.path(), &final_dir) {
            let source = if final_dir.exists() {
                io::Error::new(io::ErrorKind::AlreadyExists, source.to_string())
            } else {
                source
            };
            return Err(HistoryError::WriteFailed {
                path: final_dir,
                source,
            });
        }
        // The staging path is gone now; the guard's cleanup finds nothing.
        drop(staging);

        tracing::info!("recorded {} of '{}' at {}", operation, name, timestamp);
        Ok(id)
    }

    fn stage(
        &self,
        staging: &Path,
        descr: &HistoryDescr,
        payload: Option<&[u8]>,
    ) -> Result<(), HistoryError> {
        let write_failed = |path: PathBuf| move |source: io::Error| HistoryError::WriteFailed { path, source };

        if let Some(payload) = payload {
            let path = self.layout.payload_path(staging);
            fs::write(&path, payload).map_err(write_failed(path))?;
        }
        let meta_path = self.layout.metadata_path(staging);
        let json = serde_json::to_vec_pretty(descr).map_err(|e| HistoryError::WriteFailed {
            path: meta_path.clone(),
            source: io::Error::new(io::ErrorKind::InvalidData, e),
        })?;
        fs::write(&meta_path, json).map_err(write_failed(meta_path))
    }
}
