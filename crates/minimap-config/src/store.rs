//! Read and write the settings file.
//!
//! Writes are atomic (write to `.tmp`, then rename) so a crash mid-write
//! leaves either the previous or the new file on disk.

use std::path::{Path, PathBuf};

use minimap_common::ConfigError;
use tracing::{debug, error, info, warn};

use crate::merge::merge;
use crate::schema::Configuration;

/// Settings file name, resolved against the working directory.
pub const SETTINGS_FILE: &str = "plugin.setting.json";

/// Owner of the on-disk settings record.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the settings, repairing whatever is missing or malformed.
    ///
    /// Never fails. The reconciled record is persisted before returning;
    /// a failed write is logged and the in-memory value is still returned.
    pub fn load(&self) -> Configuration {
        let defaults = Configuration::default();

        let config = match self.read_value() {
            Ok(value) => {
                let outcome = merge(&value, &defaults);
                if !outcome.repaired.is_empty() {
                    warn!(
                        path = %self.path.display(),
                        keys = ?outcome.repaired,
                        "repaired settings keys with defaults"
                    );
                }
                outcome.config
            }
            Err(ConfigError::FileNotFound(path)) => {
                info!("no settings at {}, using defaults", path.display());
                defaults
            }
            Err(e) => {
                warn!("{e}; falling back to default settings");
                defaults
            }
        };

        if let Err(e) = self.save(&config) {
            error!("failed to persist normalized settings: {e}");
        }

        config
    }

    /// Read and parse the raw JSON value without any reconciliation.
    pub fn read_value(&self) -> Result<serde_json::Value, ConfigError> {
        if !self.path.exists() {
            return Err(ConfigError::FileNotFound(self.path.clone()));
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            ConfigError::ReadError(format!("failed to read {}: {e}", self.path.display()))
        })?;

        serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseError(format!("failed to parse JSON: {e}")))
    }

    /// Serialize `config` and atomically replace the settings file.
    pub fn save(&self, config: &Configuration) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(config)
            .map_err(|e| ConfigError::WriteError(format!("failed to serialize settings: {e}")))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::WriteError(format!(
                    "failed to create settings directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let tmp_path = self.tmp_path();
        std::fs::write(&tmp_path, &json).map_err(|e| {
            ConfigError::WriteError(format!("failed to write {}: {e}", tmp_path.display()))
        })?;

        // Rename can fail on Windows while another process holds the file.
        // The old file stays untouched; the caller retries on its next save.
        if let Err(e) = std::fs::rename(&tmp_path, &self.path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(ConfigError::WriteError(format!(
                "failed to replace {}: {e}",
                self.path.display()
            )));
        }

        debug!(path = %self.path.display(), "settings saved");
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| SETTINGS_FILE.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> ConfigStore {
        ConfigStore::new(dir.path().join(SETTINGS_FILE))
    }

    fn on_disk(store: &ConfigStore) -> serde_json::Value {
        let content = std::fs::read_to_string(store.path()).unwrap();
        serde_json::from_str(&content).unwrap()
    }

    #[test]
    fn missing_file_yields_defaults_and_creates_it() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let config = store.load();
        assert_eq!(config, Configuration::default());
        assert!(store.path().exists());
        assert_eq!(
            on_disk(&store),
            serde_json::to_value(Configuration::default()).unwrap()
        );
    }

    #[test]
    fn empty_object_is_normalized_on_disk() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "{}").unwrap();

        let config = store.load();
        assert_eq!(config, Configuration::default());
        assert_eq!(
            on_disk(&store),
            serde_json::to_value(Configuration::default()).unwrap()
        );
    }

    #[test]
    fn malformed_json_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "this is not json {{{").unwrap();

        assert!(matches!(store.read_value(), Err(ConfigError::ParseError(_))));
        let config = store.load();
        assert_eq!(config, Configuration::default());
        assert_eq!(
            on_disk(&store),
            serde_json::to_value(Configuration::default()).unwrap()
        );
    }

    #[test]
    fn partial_drift_is_repaired_per_key() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), r#"{"x": 50, "debug": "yes"}"#).unwrap();

        let config = store.load();
        assert_eq!(config.x, 50);
        assert!(!config.debug);
        assert_eq!(config.y, 100);
        assert_eq!(config.url, Configuration::default().url);

        let disk = on_disk(&store);
        assert_eq!(disk["x"], json!(50));
        assert_eq!(disk["debug"], json!(false));
    }

    #[test]
    fn legacy_bound_only_file_is_upgraded() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), r#"{"x": 1, "y": 2, "w": 3, "h": 4}"#).unwrap();

        let config = store.load();
        assert_eq!((config.x, config.y, config.w, config.h), (1, 2, 3, 4));
        let disk = on_disk(&store);
        assert_eq!(disk["opacity"], json!(1.0));
        assert_eq!(disk["index"], json!(0));
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let config = Configuration {
            x: 7,
            opacity: 0.4,
            debug: true,
            ..Default::default()
        };
        store.save(&config).unwrap();
        assert_eq!(store.load(), config);
    }

    #[test]
    fn save_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path().join("nested").join("deep").join(SETTINGS_FILE));

        store.save(&Configuration::default()).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn save_cleans_up_tmp_file() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.save(&Configuration::default()).unwrap();
        assert!(!store.tmp_path().exists(), "tmp file should be renamed away");
    }

    #[test]
    fn save_into_unwritable_location_reports_error() {
        let dir = TempDir::new().unwrap();
        // A regular file where the parent directory should be.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();
        let store = ConfigStore::new(blocker.join(SETTINGS_FILE));

        let err = store.save(&Configuration::default()).unwrap_err();
        assert!(matches!(err, ConfigError::WriteError(_)));
    }

    #[test]
    fn failed_rename_reports_error_and_keeps_target() {
        let dir = TempDir::new().unwrap();
        // A non-empty directory at the settings path makes the rename fail.
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), "old").unwrap();
        let store = ConfigStore::new(&path);

        let err = store.save(&Configuration::default()).unwrap_err();
        assert!(matches!(err, ConfigError::WriteError(_)));
        assert!(!store.tmp_path().exists());
        assert_eq!(std::fs::read_to_string(path.join("keep")).unwrap(), "old");
    }

    #[test]
    fn failed_save_leaves_previous_settings_intact() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let before = Configuration {
            x: 7,
            ..Configuration::default()
        };
        store.save(&before).unwrap();

        // Block the tmp file so the next save cannot even start.
        std::fs::create_dir(store.tmp_path()).unwrap();
        let next = Configuration {
            x: 8,
            ..Configuration::default()
        };
        assert!(store.save(&next).is_err());
        assert_eq!(on_disk(&store), serde_json::to_value(&before).unwrap());
    }

    #[test]
    fn tmp_path_sits_next_to_settings() {
        let store = ConfigStore::new("/var/lib/minimap/plugin.setting.json");
        assert_eq!(
            store.tmp_path(),
            PathBuf::from("/var/lib/minimap/plugin.setting.json.tmp")
        );
    }
}
