//! `confhist.toml`: where history and entities live, and who may touch them.
//!
//! # Example
//!
//! ```toml
//! [history]
//! root = "/var/lib/ci/config-history"
//! order = "descending"
//! payload_file = "config.xml"
//!
//! [entities]
//! root = "/var/lib/ci/jobs"
//! config_file = "config.xml"
//!
//! [access]
//! configure = ["admin"]
//!
//! [access.entities]
//! "team" = ["alice", "bob"]
//! "team/release" = ["carol"]
//! ```
//!
//! Without an `[access]` section every caller may list and restore.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use confhist_storage::{AccessGate, AllowAll, HistoryConfig, StaticAcl, DEFAULT_PAYLOAD_FILE};
use serde::{Deserialize, Serialize};

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "confhist.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfhistConfig {
    #[serde(default = "default_history")]
    pub history: HistoryConfig,
    #[serde(default)]
    pub entities: EntitiesConfig,
    pub access: Option<AccessConfig>,
}

/// `[entities]`: entity `<name>` keeps its live configuration at
/// `<root>/<name>/<config_file>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitiesConfig {
    #[serde(default = "default_entities_root")]
    pub root: PathBuf,
    #[serde(default = "default_config_file")]
    pub config_file: String,
}

/// `[access]`: users holding the configure capability.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessConfig {
    /// May configure every entity.
    #[serde(default)]
    pub configure: Vec<String>,
    /// Per-entity (or per-folder) grants.
    #[serde(default)]
    pub entities: BTreeMap<String, Vec<String>>,
}

fn default_history() -> HistoryConfig {
    HistoryConfig::new("history")
}

fn default_entities_root() -> PathBuf {
    PathBuf::from("jobs")
}

fn default_config_file() -> String {
    DEFAULT_PAYLOAD_FILE.to_string()
}

impl Default for EntitiesConfig {
    fn default() -> Self {
        Self {
            root: default_entities_root(),
            config_file: default_config_file(),
        }
    }
}

impl Default for ConfhistConfig {
    fn default() -> Self {
        Self {
            history: default_history(),
            entities: EntitiesConfig::default(),
            access: None,
        }
    }
}

impl ConfhistConfig {
    /// Live configuration file of entity `name`.
    pub fn entity_config_file(&self, name: &str) -> PathBuf {
        self.entities.root.join(name).join(&self.entities.config_file)
    }

    /// An entity's history directory is named after its configuration
    /// directory, so the configuration file must sit directly inside it.
    pub fn validate(&self) -> Result<(), String> {
        let file = &self.entities.config_file;
        if file.is_empty() || file.contains('/') || file.contains('\\') || file.starts_with('.') {
            return Err(format!(
                "entities.config_file must be a plain file name, got '{}'",
                file
            ));
        }
        Ok(())
    }

    /// The access gate for `principal`.
    pub fn gate(&self, principal: Option<&str>) -> Box<dyn AccessGate> {
        match &self.access {
            None => Box::new(AllowAll),
            Some(access) => {
                let mut acl = StaticAcl::new(principal.map(str::to_string));
                for user in &access.configure {
                    acl = acl.grant_all(user.as_str());
                }
                for (entity, users) in &access.entities {
                    for user in users {
                        acl = acl.grant(entity.as_str(), user.as_str());
                    }
                }
                Box::new(acl)
            }
        }
    }
}

/// Read and parse a config TOML file from `path`.
///
/// Returns a human-readable error string on failure.
pub fn read_config(path: &Path) -> Result<ConfhistConfig, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("could not read '{}': {}", path.display(), e))?;

    let config: ConfhistConfig = toml::from_str(&content)
        .map_err(|e| format!("could not parse '{}': {}", path.display(), e))?;
    config
        .validate()
        .map_err(|e| format!("invalid config '{}': {}", path.display(), e))?;
    Ok(config)
}

/// Load the config named on the command line, or `confhist.toml` when it
/// exists, or the defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<ConfhistConfig, String> {
    match explicit {
        Some(path) => read_config(path),
        None => {
            let path = Path::new(DEFAULT_CONFIG_FILE);
            if path.is_file() {
                read_config(path)
            } else {
                tracing::debug!("no {} found, using defaults", DEFAULT_CONFIG_FILE);
                Ok(ConfhistConfig::default())
            }
        }
    }
}
