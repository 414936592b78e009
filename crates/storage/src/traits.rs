use std::path::Path;

use crate::error::{EntityError, HistoryError};

/// A configurable item whose configuration history is tracked.
///
/// The history core never creates or destroys an entity. It reads the
/// entity's identity and, during a restore, calls exactly two mutating
/// operations:
///
/// 1. `apply_configuration(payload)`: replace the in-memory configuration.
///    On error the entity must be left unchanged.
/// 2. `persist()`: save the applied configuration durably. Only called after
///    a successful apply.
///
/// How the payload is interpreted and where it is saved is the entity's own
/// business; the core treats both as opaque.
pub trait ConfigurableEntity {
    /// Stable entity name, a relative path such as `folder/job`. The entity's
    /// history directory is `<history root>/<name>`.
    fn name(&self) -> &str;

    /// Path of the entity's live configuration file.
    fn config_file(&self) -> &Path;

    /// Where callers should look at the entity after it changed (a URL or path).
    fn location(&self) -> String {
        self.config_file().display().to_string()
    }

    fn apply_configuration(&mut self, payload: &[u8]) -> Result<(), EntityError>;

    fn persist(&mut self) -> Result<(), EntityError>;
}

/// Capability check consulted before any listing or restore.
///
/// Implementations decide who the caller is; the core only asks whether that
/// caller may configure the named entity.
pub trait AccessGate {
    /// Non-failing check, used to decide whether to offer history actions at all.
    fn has_permission(&self, entity: &str) -> bool;

    /// Identity of the caller, for error messages.
    fn principal(&self) -> Option<&str> {
        None
    }

    /// Hard gate: `Err(HistoryError::PermissionDenied)` when the caller lacks
    /// the capability.
    fn check_permission(&self, entity: &str) -> Result<(), HistoryError> {
        if self.has_permission(entity) {
            Ok(())
        } else {
            Err(HistoryError::PermissionDenied {
                entity: entity.to_string(),
                principal: self.principal().map(str::to_string),
            })
        }
    }
}
