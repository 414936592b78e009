use crate::error::HistoryError;
use crate::restore::{self, RestoreEngine, RestoreOutcome, RestoreQuestion, RestoreRequest};
use crate::store::{HistoryStore, Listing};
use crate::timestamp::Timestamp;
use crate::traits::{AccessGate, ConfigurableEntity};

/// Icon shown for the history action when the caller may use it.
pub const ICON_FILE_NAME: &str = "confighistory.svg";

/// The history operations offered on one entity, each guarded by the access gate.
pub struct HistoryAction<'a, G: AccessGate + ?Sized> {
    store: &'a HistoryStore,
    gate: &'a G,
}

impl<'a, G: AccessGate + ?Sized> HistoryAction<'a, G> {
    pub fn new(store: &'a HistoryStore, gate: &'a G) -> Self {
        Self { store, gate }
    }

    /// `None` hides the action from callers without the configure capability.
    pub fn icon_file_name<E: ConfigurableEntity + ?Sized>(&self, entity: &E) -> Option<&'static str> {
        self.gate
            .has_permission(entity.name())
            .then_some(ICON_FILE_NAME)
    }

    /// The entity's configuration history, after the permission check.
    pub fn job_configs<E: ConfigurableEntity + ?Sized>(&self, entity: &E) -> Result<Listing, HistoryError> {
        self.gate.check_permission(entity.name())?;
        self.store.list_revisions(entity)
    }

    pub fn restore<E: ConfigurableEntity + ?Sized>(
        &self,
        entity: &mut E,
        request: &RestoreRequest,
    ) -> Result<RestoreOutcome, HistoryError> {
        RestoreEngine::new(self.store).restore(self.gate, entity, request)
    }

    pub fn forward_to_restore_question(&self, request: &RestoreRequest) -> Result<RestoreQuestion, HistoryError> {
        restore::forward_to_restore_question(request)
    }

    /// Parse a record timestamp for display. Unparseable input gives `None`.
    pub fn date_from_string(&self, date: &str) -> Option<Timestamp> {
        Timestamp::parse_for_display(date)
    }
}
