use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use derive_more::{Display, Error};

use super::name::{BackupFile, DatabaseId};

/// Configure how many backups of a database are retained.
///
/// The backup created by the current run is never counted.
#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum KeepBackups {
    /// Keep every backup. Rotation is skipped entirely.
    Unlimited,
    /// Keep this amount of backups in addition to the current one.
    Count(usize),
}

impl Default for KeepBackups {
    fn default() -> Self {
        Self::Count(7)
    }
}

/// Retention count is neither `-1` nor a non-negative number.
#[derive(Debug, Display, Error)]
#[display("Invalid retention count {_0}: expected -1 (unlimited) or a non-negative number")]
pub struct InvalidKeepBackups(#[error(ignore)] i64);

impl TryFrom<i64> for KeepBackups {
    type Error = InvalidKeepBackups;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Self::Unlimited),
            n => usize::try_from(n)
                .map(Self::Count)
                .map_err(|_| InvalidKeepBackups(n)),
        }
    }
}

impl From<KeepBackups> for i64 {
    fn from(value: KeepBackups) -> Self {
        match value {
            KeepBackups::Unlimited => -1,
            KeepBackups::Count(n) => i64::try_from(n).unwrap_or(i64::MAX),
        }
    }
}

impl FromStr for KeepBackups {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: i64 = s.trim().parse().map_err(|e| format!("{e}"))?;
        Self::try_from(value).map_err(|e| e.to_string())
    }
}

impl fmt::Display for KeepBackups {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unlimited => f.write_str("unlimited"),
            Self::Count(n) => write!(f, "{n}"),
        }
    }
}

/// Outcome of [rotate_backups].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Rotation {
    /// Names of the removed backup files.
    pub deleted: Vec<String>,
    /// Names of the backup files that should have been removed but couldn't.
    pub failed: Vec<String>,
}

/// Selects the outdated backups among `candidates`.
///
/// Candidates are sorted by name, which equals creation order for the
/// timestamp format in use. All but the newest `keep` are returned.
pub fn deletion_targets(mut candidates: Vec<BackupFile>, keep: usize) -> Vec<BackupFile> {
    candidates.sort_by(|a, b| a.name().cmp(b.name()));

    let excess = candidates.len().saturating_sub(keep);
    candidates.truncate(excess);
    candidates
}

/// Lists the backups of `db` in `dir`, leaving out `protected`.
fn candidates(dir: &Path, protected: &str, db: Option<DatabaseId>) -> Vec<BackupFile> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!(target: "backup::rotate", "Could not list {}: {e}", dir.display());
            return Vec::new();
        }
    };

    entries
        .filter_map(Result::ok)
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter_map(|name| BackupFile::parse(&name))
        .filter(|file| file.belongs_to(db))
        .filter(|file| file.name() != protected)
        .collect()
}

/// Remove old backup files of a database from `dir`.
///
/// Only backups of `db` are considered (the default database if [None]).
/// The newest `keep` of them survive, `protected` (i.e. the file just created)
/// is never touched. Failing to delete a file is logged and doesn't stop the
/// rotation.
///
/// # Dry Run
///
/// On a dry run (`dry_run=true`) the files are reported as deleted without
/// being removed.
pub fn rotate_backups(
    dir: &Path,
    keep: usize,
    protected: &str,
    db: Option<DatabaseId>,
    dry_run: bool,
) -> Rotation {
    let targets = deletion_targets(candidates(dir, protected, db), keep);
    let mut rotation = Rotation::default();

    for file in targets {
        let name = file.name().to_string();
        log::info!(target: "backup::rotate", "Deleting {name}...");

        if dry_run {
            log::debug!(target: "backup::rotate", "Keeping {name} on dry-run");
            rotation.deleted.push(name);
            continue;
        }

        match fs::remove_file(dir.join(&name)) {
            Ok(()) => rotation.deleted.push(name),
            Err(e) => {
                log::error!(target: "backup::rotate", "Could not delete file {name}: {e}");
                rotation.failed.push(name);
            }
        }
    }

    rotation
}
