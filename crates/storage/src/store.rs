use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::HistoryConfig;
use crate::error::{HistoryError, RecordError};
use crate::index::ChronologicalIndex;
use crate::layout::{entity_name_for, HistoryLayout};
use crate::record::{validate_entity_name, ConfigInfo, HistoryDescr, RevisionId, RevisionRecord};
use crate::timestamp::Timestamp;
use crate::traits::ConfigurableEntity;

/// Result of listing an entity's history.
///
/// Records that could not be read are reported in `errors` and left out of
/// `configs`; they never fail the listing as a whole.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub configs: Vec<ConfigInfo>,
    pub errors: Vec<RecordError>,
}

impl Listing {
    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }
}

/// Read-only view over the history tree.
///
/// The store never writes, moves or deletes anything and keeps no state
/// between calls: every call reads what is on disk at that moment.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    layout: HistoryLayout,
    index: ChronologicalIndex,
    entities_root: Option<PathBuf>,
}

impl HistoryStore {
    pub fn new(config: &HistoryConfig) -> Self {
        Self {
            layout: HistoryLayout::new(config),
            index: ChronologicalIndex::new(config.order),
            entities_root: None,
        }
    }

    /// Derive each entity's history directory from where its configuration
    /// file lives under `root`, instead of trusting the entity's name alone.
    pub fn with_entities_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.entities_root = Some(root.into());
        self
    }

    /// Name of `entity`'s history directory, relative to the history root.
    ///
    /// With an entities root set, this is the path of the entity's
    /// configuration directory under that root, and it must agree with
    /// `entity.name()`.
    pub fn history_name<E>(&self, entity: &E) -> Result<String, HistoryError>
    where
        E: ConfigurableEntity + ?Sized,
    {
        let Some(root) = &self.entities_root else {
            return Ok(entity.name().to_string());
        };
        match entity_name_for(root, entity.config_file()) {
            Some(derived) if derived == entity.name() => Ok(derived),
            Some(derived) => Err(HistoryError::InvalidRequest(format!(
                "entity '{}' keeps its configuration at {}, which belongs to '{}'",
                entity.name(),
                entity.config_file().display(),
                derived
            ))),
            None => Err(HistoryError::InvalidRequest(format!(
                "configuration file {} of '{}' is not under {}",
                entity.config_file().display(),
                entity.name(),
                root.display()
            ))),
        }
    }

    /// List every record of `entity`, sorted chronologically.
    ///
    /// The caller is expected to have passed the access gate already.
    pub fn list_revisions<E>(&self, entity: &E) -> Result<Listing, HistoryError>
    where
        E: ConfigurableEntity + ?Sized,
    {
        self.list_by_name(&self.history_name(entity)?)
    }

    /// [`list_revisions`](Self::list_revisions) by entity name.
    pub fn list_by_name(&self, name: &str) -> Result<Listing, HistoryError> {
        validate_entity_name(name)?;
        let history_dir = self.layout.history_dir(name);

        let entries = match fs::read_dir(&history_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("no history directory for '{}'", name);
                return Ok(Listing::default());
            }
            Err(source) => {
                return Err(HistoryError::DirectoryUnreadable {
                    path: history_dir,
                    source,
                })
            }
        };

        let mut listing = Listing::default();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("skipping unreadable entry in {}: {}", history_dir.display(), e);
                    listing.errors.push(RecordError {
                        path: history_dir.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };
            let path = entry.path();
            let Some(timestamp) = entry
                .file_name()
                .to_str()
                .and_then(HistoryLayout::record_timestamp)
            else {
                tracing::debug!("ignoring {}: not a record directory", path.display());
                continue;
            };
            if !path.is_dir() {
                tracing::debug!("ignoring {}: not a directory", path.display());
                continue;
            }

            let id = RevisionId::new(name, timestamp);
            match self.read_info(id, path) {
                Ok(info) => listing.configs.push(info),
                Err(e) => {
                    tracing::warn!("skipping record: {}", e);
                    listing.errors.push(RecordError::from(e));
                }
            }
        }

        listing.configs = self.index.sort(listing.configs);
        Ok(listing)
    }

    /// Load one record of `entity`, payload included.
    pub fn resolve_revision<E>(&self, entity: &E, timestamp: Timestamp) -> Result<RevisionRecord, HistoryError>
    where
        E: ConfigurableEntity + ?Sized,
    {
        self.resolve(&RevisionId::new(self.history_name(entity)?, timestamp))
    }

    /// Load the record addressed by `id`, payload included.
    ///
    /// `NotFound` when no such record directory exists; `ReadError` when the
    /// record exists but its metadata or payload cannot be read.
    pub fn resolve(&self, id: &RevisionId) -> Result<RevisionRecord, HistoryError> {
        validate_entity_name(&id.name)?;
        let record_dir = self.layout.record_dir(id);
        if !record_dir.is_dir() {
            return Err(HistoryError::NotFound {
                name: id.name.clone(),
                timestamp: id.timestamp.to_string(),
            });
        }
        tracing::debug!("resolving record {}", record_dir.display());

        let info = self.read_info(id.clone(), record_dir)?;
        if !info.operation.has_payload() {
            return Err(HistoryError::read(
                &info.file,
                format!("{} record carries no configuration", info.operation),
            ));
        }
        let payload_path = self.layout.payload_path(&info.file);
        let payload = fs::read(&payload_path).map_err(|e| HistoryError::read(&payload_path, e))?;
        Ok(RevisionRecord { info, payload })
    }

    fn read_info(&self, id: RevisionId, record_dir: PathBuf) -> Result<ConfigInfo, HistoryError> {
        let descr = read_descr(&self.layout.metadata_path(&record_dir))?;
        if descr.timestamp != id.timestamp.to_string() {
            tracing::warn!(
                "metadata timestamp '{}' differs from record directory {}; using the directory name",
                descr.timestamp,
                record_dir.display()
            );
        }
        let has_config = self.layout.payload_path(&record_dir).is_file();
        Ok(ConfigInfo::from_descr(id, descr, record_dir, has_config))
    }
}

fn read_descr(path: &Path) -> Result<HistoryDescr, HistoryError> {
    let raw = fs::read_to_string(path).map_err(|e| HistoryError::read(path, e))?;
    serde_json::from_str(&raw).map_err(|e| HistoryError::read(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::SortOrder;
    use crate::record::Operation;

    fn write_record(root: &Path, name: &str, ts: &str, op: Operation, payload: Option<&str>) {
        let dir = root.join(name).join(ts);
        fs::create_dir_all(&dir).unwrap();
        let descr = HistoryDescr {
            user: Some("alice".into()),
            user_id: Some("alice".into()),
            operation: op,
            timestamp: ts.to_string(),
        };
        fs::write(dir.join("history.json"), serde_json::to_string(&descr).unwrap()).unwrap();
        if let Some(p) = payload {
            fs::write(dir.join("config.xml"), p).unwrap();
        }
    }

    #[test]
    fn missing_history_dir_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(&HistoryConfig::new(tmp.path()));
        let listing = store.list_by_name("foo").unwrap();
        assert!(listing.is_empty());
        assert!(listing.errors.is_empty());
    }

    #[test]
    fn empty_history_dir_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("foo")).unwrap();
        let store = HistoryStore::new(&HistoryConfig::new(tmp.path()));
        assert_eq!(store.list_by_name("foo").unwrap().len(), 0);
    }

    #[test]
    fn foreign_entries_are_skipped_silently() {
        let tmp = tempfile::tempdir().unwrap();
        write_record(tmp.path(), "app", "2020-01-01-00-00-00", Operation::Created, Some("<a/>"));
        fs::create_dir_all(tmp.path().join("app/notes")).unwrap();
        fs::create_dir_all(tmp.path().join("app/.2020-01-02-00-00-00.staging")).unwrap();
        fs::write(tmp.path().join("app/2020-01-03-00-00-00"), "a file, not a dir").unwrap();

        let store = HistoryStore::new(&HistoryConfig::new(tmp.path()));
        let listing = store.list_by_name("app").unwrap();
        assert_eq!(listing.len(), 1);
        assert!(listing.errors.is_empty());
    }

    #[test]
    fn missing_metadata_is_a_record_error() {
        let tmp = tempfile::tempdir().unwrap();
        write_record(tmp.path(), "app", "2020-01-01-00-00-00", Operation::Created, Some("<a/>"));
        fs::create_dir_all(tmp.path().join("app/2020-01-02-00-00-00")).unwrap();

        let store = HistoryStore::new(&HistoryConfig::new(tmp.path()));
        let listing = store.list_by_name("app").unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing.errors.len(), 1);
        assert!(listing.errors[0].path.ends_with("2020-01-02-00-00-00/history.json"));
    }

    #[test]
    fn history_path_that_is_a_file_is_unreadable() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("app"), "oops").unwrap();
        let store = HistoryStore::new(&HistoryConfig::new(tmp.path()));
        let err = store.list_by_name("app").unwrap_err();
        assert_eq!(err.kind(), "directory_unreadable");
    }

    #[test]
    fn descending_order() {
        let tmp = tempfile::tempdir().unwrap();
        write_record(tmp.path(), "app", "2020-01-01-00-00-00", Operation::Created, Some("1"));
        write_record(tmp.path(), "app", "2020-01-03-00-00-00", Operation::Changed, Some("3"));
        write_record(tmp.path(), "app", "2020-01-02-00-00-00", Operation::Changed, Some("2"));

        let store = HistoryStore::new(&HistoryConfig::new(tmp.path()).with_order(SortOrder::Descending));
        let listing = store.list_by_name("app").unwrap();
        let stamps: Vec<String> = listing.configs.iter().map(|c| c.id.timestamp.to_string()).collect();
        assert_eq!(
            stamps,
            ["2020-01-03-00-00-00", "2020-01-02-00-00-00", "2020-01-01-00-00-00"]
        );
    }

    #[test]
    fn deleted_record_lists_but_does_not_resolve() {
        let tmp = tempfile::tempdir().unwrap();
        write_record(tmp.path(), "app", "2020-01-01-00-00-00", Operation::Deleted, None);

        let store = HistoryStore::new(&HistoryConfig::new(tmp.path()));
        let listing = store.list_by_name("app").unwrap();
        assert_eq!(listing.len(), 1);
        assert!(!listing.configs[0].has_config);

        let id = RevisionId::new("app", Timestamp::parse("2020-01-01-00-00-00").unwrap());
        assert_eq!(store.resolve(&id).unwrap_err().kind(), "read_error");
    }

    #[test]
    fn missing_payload_is_read_error() {
        let tmp = tempfile::tempdir().unwrap();
        write_record(tmp.path(), "app", "2020-01-01-00-00-00", Operation::Changed, None);
        let store = HistoryStore::new(&HistoryConfig::new(tmp.path()));
        let id = RevisionId::new("app", Timestamp::parse("2020-01-01-00-00-00").unwrap());
        match store.resolve(&id) {
            Err(HistoryError::ReadError { path, .. }) => assert!(path.ends_with("config.xml")),
            other => panic!("expected ReadError, got {:?}", other),
        }
    }

    #[test]
    fn invalid_name_is_rejected_before_io() {
        let tmp = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(&HistoryConfig::new(tmp.path()));
        assert_eq!(store.list_by_name("../etc").unwrap_err().kind(), "invalid_request");
    }
}
