use std::path::PathBuf;

/// Error raised by a [`ConfigurableEntity`](crate::ConfigurableEntity) while
/// applying or persisting a configuration. The entity owns its own failure
/// types, so they are carried opaquely.
pub type EntityError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// All errors that can be returned by the history store, the restore engine
/// and the record writer.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// A request parameter was missing or malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The caller lacks the configure capability on the entity.
    #[error("permission denied: {} may not configure {entity}", .principal.as_deref().unwrap_or("anonymous"))]
    PermissionDenied {
        entity: String,
        principal: Option<String>,
    },

    /// No record exists for the given (entity name, timestamp).
    #[error("revision not found: {name}/{timestamp}")]
    NotFound { name: String, timestamp: String },

    /// A record exists but its metadata or payload could not be read or decoded.
    #[error("could not read record {}: {reason}", .path.display())]
    ReadError { path: PathBuf, reason: String },

    /// The history directory exists but could not be opened for enumeration.
    #[error("history directory {} is unreadable", .path.display())]
    DirectoryUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The entity rejected the configuration; its live state is unchanged.
    #[error("entity {entity} rejected the restored configuration")]
    ApplyFailed {
        entity: String,
        #[source]
        source: EntityError,
    },

    /// The entity accepted the configuration in memory but failed to save it.
    /// Its durable state is unknown.
    #[error("entity {entity} applied the restored configuration but could not persist it; durable state is unknown")]
    PersistFailed {
        entity: String,
        #[source]
        source: EntityError,
    },

    /// A new record could not be written.
    #[error("could not write record at {}", .path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl HistoryError {
    /// Stable machine-readable name of the error class.
    pub fn kind(&self) -> &'static str {
        match self {
            HistoryError::InvalidRequest(_) => "invalid_request",
            HistoryError::PermissionDenied { .. } => "permission_denied",
            HistoryError::NotFound { .. } => "not_found",
            HistoryError::ReadError { .. } => "read_error",
            HistoryError::DirectoryUnreadable { .. } => "directory_unreadable",
            HistoryError::ApplyFailed { .. } => "apply_failed",
            HistoryError::PersistFailed { .. } => "persist_failed",
            HistoryError::WriteFailed { .. } => "write_failed",
        }
    }

    pub(crate) fn read(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        HistoryError::ReadError {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// A non-fatal failure to read one record during a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordError {
    /// Record directory (or the entry path when the entry itself was unreadable).
    pub path: PathBuf,
    pub reason: String,
}

impl std::fmt::Display for RecordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.reason)
    }
}

impl From<HistoryError> for RecordError {
    fn from(err: HistoryError) -> Self {
        match err {
            HistoryError::ReadError { path, reason } => RecordError { path, reason },
            other => RecordError {
                path: PathBuf::new(),
                reason: other.to_string(),
            },
        }
    }
}
