use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::index::SortOrder;

/// Name of the metadata file inside every record directory.
pub const METADATA_FILE: &str = "history.json";

/// Default name of the configuration payload file inside a record directory.
pub const DEFAULT_PAYLOAD_FILE: &str = "config.xml";

/// Settings for a [`HistoryStore`](crate::HistoryStore) or
/// [`RecordWriter`](crate::RecordWriter).
///
/// The history root is always passed in explicitly; independent stores can
/// point at independent directories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Root directory holding one history directory per entity.
    pub root: PathBuf,
    /// Listing order.
    #[serde(default)]
    pub order: SortOrder,
    /// File name of the configuration payload inside each record directory.
    #[serde(default = "default_payload_file")]
    pub payload_file: String,
}

fn default_payload_file() -> String {
    DEFAULT_PAYLOAD_FILE.to_string()
}

impl HistoryConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            order: SortOrder::default(),
            payload_file: default_payload_file(),
        }
    }

    pub fn with_order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_payload_file(mut self, name: impl Into<String>) -> Self {
        self.payload_file = name.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let cfg: HistoryConfig = serde_json::from_str(r#"{"root": "/var/history"}"#).unwrap();
        assert_eq!(cfg, HistoryConfig::new("/var/history"));
        assert_eq!(cfg.order, SortOrder::Ascending);
        assert_eq!(cfg.payload_file, "config.xml");
    }

    #[test]
    fn order_is_lowercase() {
        let cfg: HistoryConfig =
            serde_json::from_str(r#"{"root": "h", "order": "descending", "payload_file": "job.toml"}"#)
                .unwrap();
        assert_eq!(cfg.order, SortOrder::Descending);
        assert_eq!(cfg.payload_file, "job.toml");
    }
}
