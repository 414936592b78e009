//! On-disk layout of the history tree.
//!
//! ```text
//! <root>/<entity name>/<YYYY-MM-DD-hh-mm-ss>/history.json
//! <root>/<entity name>/<YYYY-MM-DD-hh-mm-ss>/<payload file>
//! ```

use std::path::{Path, PathBuf};

use crate::config::{HistoryConfig, METADATA_FILE};
use crate::record::RevisionId;
use crate::timestamp::Timestamp;

#[derive(Debug, Clone)]
pub struct HistoryLayout {
    root: PathBuf,
    payload_file: String,
}

impl HistoryLayout {
    pub fn new(config: &HistoryConfig) -> Self {
        Self {
            root: config.root.clone(),
            payload_file: config.payload_file.clone(),
        }
    }

    /// History directory of one entity. The name must already be validated.
    pub fn history_dir(&self, entity_name: &str) -> PathBuf {
        self.root.join(entity_name)
    }

    pub fn record_dir(&self, id: &RevisionId) -> PathBuf {
        self.history_dir(&id.name).join(id.timestamp.to_string())
    }

    pub fn metadata_path(&self, record_dir: &Path) -> PathBuf {
        record_dir.join(METADATA_FILE)
    }

    pub fn payload_path(&self, record_dir: &Path) -> PathBuf {
        record_dir.join(&self.payload_file)
    }

    /// The timestamp encoded in a record directory name, or `None` for
    /// anything that is not a record directory name.
    pub fn record_timestamp(dir_name: &str) -> Option<Timestamp> {
        Timestamp::parse(dir_name).ok()
    }
}

/// Entity name derived from its configuration file path: the path of the
/// file's directory relative to the root all entities live under.
///
/// `entities/team/app/config.xml` under `entities` gives `team/app`.
pub fn entity_name_for(entities_root: &Path, config_file: &Path) -> Option<String> {
    let dir = config_file.parent()?;
    let rel = dir.strip_prefix(entities_root).ok()?;
    let parts: Vec<&str> = rel
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_paths() {
        let layout = HistoryLayout::new(&HistoryConfig::new("/var/hist").with_payload_file("job.toml"));
        let id = RevisionId::new("team/app", Timestamp::parse("2020-01-01-00-00-00").unwrap());
        let dir = layout.record_dir(&id);
        assert_eq!(dir, PathBuf::from("/var/hist/team/app/2020-01-01-00-00-00"));
        assert_eq!(
            layout.metadata_path(&dir),
            PathBuf::from("/var/hist/team/app/2020-01-01-00-00-00/history.json")
        );
        assert_eq!(
            layout.payload_path(&dir),
            PathBuf::from("/var/hist/team/app/2020-01-01-00-00-00/job.toml")
        );
    }

    #[test]
    fn record_dir_names() {
        assert!(HistoryLayout::record_timestamp("2020-01-01-00-00-00").is_some());
        assert!(HistoryLayout::record_timestamp(".2020-01-01-00-00-00.staging").is_none());
        assert!(HistoryLayout::record_timestamp("notes").is_none());
    }

    #[test]
    fn entity_name_from_config_path() {
        let root = Path::new("/srv/jobs");
        assert_eq!(
            entity_name_for(root, Path::new("/srv/jobs/team/app/config.xml")).as_deref(),
            Some("team/app")
        );
        assert_eq!(
            entity_name_for(root, Path::new("/srv/jobs/app/config.xml")).as_deref(),
            Some("app")
        );
        assert_eq!(entity_name_for(root, Path::new("/srv/jobs/config.xml")), None);
        assert_eq!(entity_name_for(root, Path::new("/elsewhere/app/config.xml")), None);
    }
}
