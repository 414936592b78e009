mod action;
mod config;
mod error;
mod gate;
mod index;
mod layout;
mod record;
mod restore;
mod store;
mod timestamp;
mod traits;
mod writer;

pub use action::{HistoryAction, ICON_FILE_NAME};
pub use config::{HistoryConfig, DEFAULT_PAYLOAD_FILE, METADATA_FILE};
pub use error::{EntityError, HistoryError, RecordError};
pub use gate::{AllowAll, StaticAcl};
pub use index::{ChronologicalIndex, SortOrder, Timestamped};
pub use layout::{entity_name_for, HistoryLayout};
pub use record::{validate_entity_name, ConfigInfo, HistoryDescr, Operation, RevisionId, RevisionRecord};
pub use restore::{
    forward_to_restore_question, RestoreEngine, RestoreOutcome, RestoreQuestion, RestoreRequest,
};
pub use store::{HistoryStore, Listing};
pub use timestamp::{Timestamp, TimestampParseError, TIMESTAMP_FORMAT};
pub use traits::{AccessGate, ConfigurableEntity};
pub use writer::{Author, RecordWriter};
