//! An entity whose live configuration is a single file on disk.

use std::fs;
use std::path::{Path, PathBuf};

use confhist_storage::{ConfigurableEntity, EntityError};

pub struct FileEntity {
    name: String,
    config_file: PathBuf,
    /// Configuration accepted by `apply_configuration`, not yet written.
    staged: Option<Vec<u8>>,
}

impl FileEntity {
    pub fn new(name: impl Into<String>, config_file: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            config_file: config_file.into(),
            staged: None,
        }
    }

    /// Current contents of the live configuration file.
    pub fn read_current(&self) -> std::io::Result<Vec<u8>> {
        fs::read(&self.config_file)
    }
}

impl ConfigurableEntity for FileEntity {
    fn name(&self) -> &str {
        &self.name
    }

    fn config_file(&self) -> &Path {
        &self.config_file
    }

    fn apply_configuration(&mut self, payload: &[u8]) -> Result<(), EntityError> {
        if payload.iter().all(u8::is_ascii_whitespace) {
            return Err("configuration is empty".into());
        }
        std::str::from_utf8(payload).map_err(|e| format!("configuration is not UTF-8: {}", e))?;
        self.staged = Some(payload.to_vec());
        Ok(())
    }

    fn persist(&mut self) -> Result<(), EntityError> {
        let Some(payload) = self.staged.as_deref() else {
            return Err("nothing to persist".into());
        };
        if let Some(parent) = self.config_file.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.config_file.with_extension("confhist-tmp");
        fs::write(&tmp, payload)?;
        if let Err(e) = fs::rename(&tmp, &self.config_file) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        self.staged = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_then_persist_replaces_file() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("app/config.xml");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, "<old/>").unwrap();

        let mut entity = FileEntity::new("app", &file);
        entity.apply_configuration(b"<new/>").unwrap();
        // Nothing on disk changes until persist.
        assert_eq!(fs::read(&file).unwrap(), b"<old/>");
        entity.persist().unwrap();
        assert_eq!(fs::read(&file).unwrap(), b"<new/>");
        assert!(!file.with_extension("confhist-tmp").exists());
    }

    #[test]
    fn rejects_empty_and_binary() {
        let tmp = tempfile::tempdir().unwrap();
        let mut entity = FileEntity::new("app", tmp.path().join("config.xml"));
        assert!(entity.apply_configuration(b"  \n").is_err());
        assert!(entity.apply_configuration(&[0xff, 0xfe]).is_err());
        assert!(entity.persist().is_err());
    }

    #[test]
    fn persist_creates_missing_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("team/app/config.xml");
        let mut entity = FileEntity::new("team/app", &file);
        entity.apply_configuration(b"<cfg/>").unwrap();
        entity.persist().unwrap();
        assert_eq!(entity.read_current().unwrap(), b"<cfg/>");
    }
}
