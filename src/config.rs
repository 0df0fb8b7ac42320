//! Configuration of a backup run, read from a TOML file.

use std::io;
use std::path::{Path, PathBuf};

use derive_more::{Display, Error, From};

use crate::backup::{DatabaseId, KeepBackups};

const DEFAULT_BACKUP_DIR: &str = "/root/ldap_backup";

/// Settings of a backup run.
///
/// Constructed once on startup and never altered while the backup runs.
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Config {
    /// Keep this amount of backups (excluding the backup just made).
    ///
    /// `-1` keeps every backup.
    pub keep_backups: KeepBackups,

    /// Numbers of the slapd databases to backup.
    ///
    /// If empty, the default database is backed up.
    pub databases: Vec<DatabaseId>,

    /// Directory the backups are stored in.
    pub backup_dir: PathBuf,

    /// Check if slapd is running before the backup.
    ///
    /// Useful on clusters where backups shouldn't be made on inactive nodes.
    pub check_slapd: bool,

    /// Create the backup directory if it doesn't exist.
    pub create_backup_dir: bool,

    /// Command dumping a database, invoked as `<cmd> [-n <db>] -l <file>`.
    pub dump_command: String,

    /// Additional arguments passed to the dump command, e.g. `["-F", "/etc/ldap/slapd.d"]`.
    pub dump_args: Vec<String>,

    /// Process name checked if [`check_slapd`](Self::check_slapd) is set.
    pub service_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            keep_backups: KeepBackups::default(),
            databases: Vec::new(),
            backup_dir: PathBuf::from(DEFAULT_BACKUP_DIR),
            check_slapd: false,
            create_backup_dir: false,
            dump_command: "slapcat".to_string(),
            dump_args: Vec::new(),
            service_name: "slapd".to_string(),
        }
    }
}

#[derive(Debug, Display, Error, From)]
/// Errors on loading the [Config].
pub enum ConfigError {
    /// Config file can't be read.
    #[display("Reading the config file failed: {_0}")]
    Read(io::Error),
    /// Config file isn't valid.
    #[display("Parsing the config file failed: {_0}")]
    Parse(toml::de::Error),
}

impl Config {
    /// Parses a config from TOML.
    pub fn from_toml(config_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(config_str)?)
    }

    /// Loads the config at `path`.
    ///
    /// If there is no file at `path` yet the default config is written there
    /// and returned.
    pub fn load_or_init(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(config_str) => Self::from_toml(&config_str),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!(
                    target: "config",
                    "Writing default config to {} because it doesn't exist yet",
                    path.display()
                );
                let default_config = Self::default();
                match toml::to_string_pretty(&default_config) {
                    Ok(config_str) => {
                        if let Err(e) = std::fs::write(path, config_str) {
                            log::warn!(
                                target: "config",
                                "Writing default config to {} failed: {e}",
                                path.display(),
                            );
                        }
                    }
                    Err(e) => {
                        log::warn!(target: "config", "Serializing default config failed: {e}")
                    }
                }

                Ok(default_config)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Directory to store the backups in.
    ///
    /// An empty path is the current working directory.
    pub fn backup_dir(&self) -> &Path {
        if self.backup_dir.as_os_str().is_empty() {
            Path::new(".")
        } else {
            &self.backup_dir
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn partial_config_uses_defaults() {
        let config = Config::from_toml(
            r#"
            keep_backups = -1
            databases = [0, 1]
            "#,
        )
        .unwrap();

        assert_eq!(config.keep_backups, KeepBackups::Unlimited);
        assert_eq!(config.databases, vec![DatabaseId(0), DatabaseId(1)]);
        assert_eq!(config.backup_dir, PathBuf::from(DEFAULT_BACKUP_DIR));
        assert_eq!(config.dump_command, "slapcat");
        assert!(!config.check_slapd);
    }

    #[test]
    fn invalid_keep_backups_is_rejected() {
        let err = Config::from_toml("keep_backups = -5").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_config_is_initialized() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ldap_backup.toml");

        let config = Config::load_or_init(&path).unwrap();
        assert_eq!(config, Config::default());
        assert!(path.exists());

        let reloaded = Config::load_or_init(&path).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn empty_backup_dir_is_cwd() {
        let config = Config {
            backup_dir: PathBuf::new(),
            ..Config::default()
        };
        assert_eq!(config.backup_dir(), Path::new("."));
    }
}
