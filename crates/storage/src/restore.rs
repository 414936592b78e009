//! Restoring an entity to a recorded revision.
//!
//! A restore runs through five steps, in order:
//!
//! 1. **Identify**: validate the (name, timestamp) parameters.
//! 2. **Authorize**: ask the access gate; nothing is read before it agrees.
//! 3. **Load**: read the record's payload into memory. The record itself is
//!    never modified or moved.
//! 4. **Apply**: hand the payload to the entity, then ask it to persist.
//!    `persist()` is only called after a successful apply.
//! 5. **Confirm**: report the restored revision and where the entity lives.
//!
//! A persist failure after a successful apply is reported as `PersistFailed`
//! and left at that: the entity's own store is outside this crate's control,
//! so no rollback is attempted.

use serde::Serialize;

use crate::error::HistoryError;
use crate::record::RevisionId;
use crate::store::HistoryStore;
use crate::traits::{AccessGate, ConfigurableEntity};

/// Raw restore parameters as received from a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreRequest {
    pub name: Option<String>,
    pub timestamp: Option<String>,
}

impl RestoreRequest {
    pub fn new(name: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            timestamp: Some(timestamp.into()),
        }
    }

    pub fn revision_id(&self) -> Result<RevisionId, HistoryError> {
        RevisionId::from_params(self.name.as_deref(), self.timestamp.as_deref())
    }
}

/// A successful restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestoreOutcome {
    pub restored: RevisionId,
    /// Where the caller should now look at the entity.
    pub location: String,
}

/// Parameters carried to a restore confirmation step. Producing one touches
/// no storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestoreQuestion {
    pub name: String,
    pub timestamp: String,
}

impl RestoreQuestion {
    /// Relative link to the confirmation step, with both values percent-encoded.
    pub fn query(&self) -> String {
        format!(
            "restoreQuestion?timestamp={}&name={}",
            urlencoding::encode(&self.timestamp),
            urlencoding::encode(&self.name)
        )
    }
}

/// Carry (timestamp, name) forward to a confirmation prompt. Only checks
/// that both parameters are present.
pub fn forward_to_restore_question(request: &RestoreRequest) -> Result<RestoreQuestion, HistoryError> {
    let present = |param: &str, value: &Option<String>| match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(HistoryError::InvalidRequest(format!("missing parameter '{}'", param))),
    };
    Ok(RestoreQuestion {
        name: present("name", &request.name)?,
        timestamp: present("timestamp", &request.timestamp)?,
    })
}

#[derive(Debug, Clone, Copy)]
pub struct RestoreEngine<'a> {
    store: &'a HistoryStore,
}

impl<'a> RestoreEngine<'a> {
    pub fn new(store: &'a HistoryStore) -> Self {
        Self { store }
    }

    pub fn restore<G, E>(
        &self,
        gate: &G,
        entity: &mut E,
        request: &RestoreRequest,
    ) -> Result<RestoreOutcome, HistoryError>
    where
        G: AccessGate + ?Sized,
        E: ConfigurableEntity + ?Sized,
    {
        // Identify
        let id = request.revision_id()?;
        if id.name != self.store.history_name(entity)? {
            return Err(HistoryError::InvalidRequest(format!(
                "revision {} does not belong to entity '{}'",
                id,
                entity.name()
            )));
        }

        // Authorize
        gate.check_permission(entity.name())?;

        // Load
        let record = self.store.resolve(&id)?;
        tracing::debug!("restoring '{}' from {}", entity.name(), record.info.file.display());

        // Apply
        entity
            .apply_configuration(&record.payload)
            .map_err(|source| HistoryError::ApplyFailed {
                entity: entity.name().to_string(),
                source,
            })?;
        entity.persist().map_err(|source| {
            tracing::error!(
                "'{}' applied {} but failed to persist: {}",
                entity.name(),
                id,
                source
            );
            HistoryError::PersistFailed {
                entity: entity.name().to_string(),
                source,
            }
        })?;

        // Confirm
        tracing::info!("restored '{}' to {}", entity.name(), id.timestamp);
        Ok(RestoreOutcome {
            restored: id,
            location: entity.location(),
        })
    }
}
