//! Backup run: dump every configured database and rotate its old backups.

pub mod name;
pub mod retention;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use derive_more::{Display, Error};

pub use name::{make_file_name, BackupFile, DatabaseId, Timestamp};
pub use retention::{rotate_backups, KeepBackups, Rotation};

use crate::config::Config;
use crate::slapd::{DumpStatus, Dumper, ServiceProbe};

/// A database backed up in a run. [None] is the default database.
pub type Target = Option<DatabaseId>;

#[derive(Debug, Display, Error)]
/// Errors preventing any backup of the run.
pub enum PreflightError {
    /// The directory service isn't running on this host.
    #[display("{_0} not running")]
    ServiceNotRunning(#[error(ignore)] String),
    /// Backup directory doesn't exist and shouldn't be created.
    #[display("Directory {} does not exist", _0.display())]
    BackupDirMissing(#[error(ignore)] PathBuf),
    /// Backup directory couldn't be created.
    #[display("Could not create directory {}: {_1}", _0.display())]
    BackupDirCreation(#[error(not(source))] PathBuf, #[error(source)] io::Error),
}

/// Outcome of a completed run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: Vec<Target>,
    pub failed: Vec<Target>,
    /// Databases whose old backups were rotated.
    pub rotated: Vec<Target>,
}

/// Makes sure `dir` exists, creating it if `create` is set.
pub fn ensure_backup_dir(dir: &Path, create: bool, dry_run: bool) -> Result<(), PreflightError> {
    if dir.is_dir() {
        return Ok(());
    }

    if !create {
        return Err(PreflightError::BackupDirMissing(dir.to_path_buf()));
    }

    log::info!(target: "backup", "Creating directory {}...", dir.display());
    if dry_run {
        return Ok(());
    }

    fs::create_dir(dir).map_err(|e| PreflightError::BackupDirCreation(dir.to_path_buf(), e))
}

fn describe(target: Target) -> String {
    match target {
        Some(db) => format!("database {db}"),
        None => "default database".to_string(),
    }
}

/// Runs the backup of all databases of a [Config].
pub struct Orchestrator<'a> {
    config: &'a Config,
    dumper: &'a dyn Dumper,
    probe: &'a dyn ServiceProbe,
    dry_run: bool,
}

impl<'a> Orchestrator<'a> {
    pub fn new(config: &'a Config, dumper: &'a dyn Dumper, probe: &'a dyn ServiceProbe) -> Self {
        Self {
            config,
            dumper,
            probe,
            dry_run: false,
        }
    }

    /// Simulative run: neither dumps nor deletes anything.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Databases backed up in this run, in configured order.
    pub fn targets(&self) -> Vec<Target> {
        if self.config.databases.is_empty() {
            vec![None]
        } else {
            self.config.databases.iter().copied().map(Some).collect()
        }
    }

    /// Performs a run with a fresh timestamp.
    pub fn run(&self) -> Result<RunSummary, PreflightError> {
        self.run_at(&Timestamp::now())
    }

    /// Performs a run naming every backup file with `timestamp`.
    ///
    /// Failing preflight checks abort the run before anything is dumped.
    /// Failing dumps are logged and reported in the [RunSummary], the
    /// remaining databases are backed up regardless.
    pub fn run_at(&self, timestamp: &Timestamp) -> Result<RunSummary, PreflightError> {
        if self.config.check_slapd && !self.probe.is_running() {
            return Err(PreflightError::ServiceNotRunning(
                self.config.service_name.clone(),
            ));
        }

        let backup_dir = self.config.backup_dir();
        ensure_backup_dir(backup_dir, self.config.create_backup_dir, self.dry_run)?;

        log::info!(target: "backup", "Backing up...");

        let mut summary = RunSummary::default();
        for target in self.targets() {
            self.backup(backup_dir, timestamp, target, &mut summary);
        }

        Ok(summary)
    }

    /// Dumps a single database and rotates its backups on success.
    fn backup(
        &self,
        backup_dir: &Path,
        timestamp: &Timestamp,
        target: Target,
        summary: &mut RunSummary,
    ) {
        let backup_file = make_file_name(timestamp.as_str(), target);
        let backup_file_path = backup_dir.join(&backup_file);

        log::info!(
            target: "backup",
            "Backing up {} to {}",
            describe(target),
            backup_file_path.display()
        );

        let status = if self.dry_run {
            log::debug!(target: "backup", "Skipping dump on dry-run");
            Ok(DumpStatus::success())
        } else {
            self.dumper.dump(target, &backup_file_path)
        };

        match status {
            Ok(DumpStatus {
                succeeded: true, ..
            }) => {}
            Ok(DumpStatus {
                exit_code: Some(code),
                ..
            }) => {
                log::error!(
                    target: "backup",
                    "Backing up {} failed with exit code {code}",
                    describe(target)
                );
                summary.failed.push(target);
                return;
            }
            Ok(DumpStatus {
                exit_code: None, ..
            }) => {
                log::error!(
                    target: "backup",
                    "Backing up {} failed: dump terminated by signal",
                    describe(target)
                );
                summary.failed.push(target);
                return;
            }
            Err(e) => {
                log::error!(
                    target: "backup",
                    "Backing up {} failed: {e}",
                    describe(target)
                );
                summary.failed.push(target);
                return;
            }
        }

        summary.succeeded.push(target);

        let KeepBackups::Count(keep) = self.config.keep_backups else {
            return;
        };

        // a dry run doesn't create the backup directory
        if self.dry_run && !backup_dir.is_dir() {
            log::debug!(target: "backup", "Skipping rotation of missing {}", backup_dir.display());
            return;
        }

        log::info!(target: "backup", "Rotating...");
        let rotation = rotate_backups(backup_dir, keep, &backup_file, target, self.dry_run);
        if !rotation.failed.is_empty() {
            log::warn!(
                target: "backup::rotate",
                "{} outdated backup(s) of {} left behind",
                rotation.failed.len(),
                describe(target)
            );
        }
        summary.rotated.push(target);
    }
}
