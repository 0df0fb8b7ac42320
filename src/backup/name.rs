//! Naming convention of the backup files: `backup-[db<N>-]<YYYYMMDD-HHMMSS>.ldif`.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::Local;
use regex::Regex;

const PREFIX: &str = "backup-";
const SUFFIX: &str = ".ldif";
const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

static BACKUP_FILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^backup-(?:db(0|[1-9][0-9]*)-)?(.*)\.ldif$")
        .expect("backup file name pattern should be valid")
});

/// Number of a slapd database as passed to `slapcat -n`.
///
/// The default (unnumbered) database is represented by the absence of a
/// [DatabaseId], so `0` is an ordinary numbered database.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct DatabaseId(pub u32);

impl fmt::Display for DatabaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DatabaseId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// Timestamp shared by all backup files of a single run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Timestamp(String);

impl Timestamp {
    /// Captures the current local time.
    pub fn now() -> Self {
        Self(Local::now().format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Timestamp {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Compose the file name of a backup from a preformatted timestamp and an
/// optional database number.
///
/// The result is only the file name, the backup directory has to be joined by
/// the caller.
pub fn make_file_name(timestamp: &str, db: Option<DatabaseId>) -> String {
    match db {
        Some(db) => format!("{PREFIX}db{db}-{timestamp}{SUFFIX}"),
        None => format!("{PREFIX}{timestamp}{SUFFIX}"),
    }
}

/// A file name parsed according to the backup naming convention.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackupFile {
    name: String,
    db: Option<DatabaseId>,
    timestamp: String,
}

impl BackupFile {
    /// Parses a file name.
    ///
    /// Returns [None] for names outside of the `backup-*.ldif` namespace and
    /// for names carrying a malformed database marker (e.g. `db01` or a
    /// marker behind the timestamp), since those belong to no database.
    pub fn parse(name: &str) -> Option<Self> {
        let captures = BACKUP_FILE_RE.captures(name)?;

        let db = match captures.get(1) {
            Some(id) => Some(id.as_str().parse().ok()?),
            None => None,
        };

        let timestamp = captures.get(2).map_or("", |m| m.as_str());
        if timestamp.starts_with("db") || timestamp.contains("-db") {
            log::trace!(target: "backup::name", "Ignoring {name}: malformed database marker");
            return None;
        }

        Some(Self {
            name: name.to_string(),
            db,
            timestamp: timestamp.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn db(&self) -> Option<DatabaseId> {
        self.db
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Returns if the file is a backup of exactly the given database.
    pub fn belongs_to(&self, db: Option<DatabaseId>) -> bool {
        self.db == db
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_of_numbered_database() {
        let name = make_file_name("20240101-120000", Some(DatabaseId(2)));
        assert_eq!(name, "backup-db2-20240101-120000.ldif");
        assert!(name.contains("db2-"));
        assert!(name.ends_with("20240101-120000.ldif"));
    }

    #[test]
    fn file_name_of_default_database_has_no_marker() {
        let name = make_file_name("20240101-120000", None);
        assert_eq!(name, "backup-20240101-120000.ldif");
        assert!(!name.contains("-db"));
    }

    #[test]
    fn database_zero_is_numbered() {
        assert_eq!(
            make_file_name("20240101-120000", Some(DatabaseId(0))),
            "backup-db0-20240101-120000.ldif"
        );

        let file = BackupFile::parse("backup-db0-20240101-120000.ldif").unwrap();
        assert_eq!(file.db(), Some(DatabaseId(0)));
        assert!(!file.belongs_to(None));
    }

    #[test]
    fn parse_recovers_composed_name() {
        let name = make_file_name("20240301-010203", Some(DatabaseId(10)));
        let file = BackupFile::parse(&name).unwrap();

        assert_eq!(file.name(), name);
        assert_eq!(file.db(), Some(DatabaseId(10)));
        assert_eq!(file.timestamp(), "20240301-010203");
        assert!(file.belongs_to(Some(DatabaseId(10))));
        assert!(!file.belongs_to(Some(DatabaseId(1))));
    }

    #[test]
    fn parse_rejects_foreign_names() {
        assert_eq!(BackupFile::parse("backup-20240101-000000.ldif.gz"), None);
        assert_eq!(BackupFile::parse("snapshot-20240101-000000.ldif"), None);
        assert_eq!(BackupFile::parse("backup-db01-20240101-000000.ldif"), None);
        assert_eq!(BackupFile::parse("backup-db-20240101-000000.ldif"), None);
        assert_eq!(BackupFile::parse("backup-20240101-000000-db3.ldif"), None);
        assert_eq!(BackupFile::parse("backup-db99999999999-20240101-000000.ldif"), None);
    }

    #[test]
    fn parse_keeps_unvalidated_timestamps_in_default_namespace() {
        let file = BackupFile::parse("backup-manual.ldif").unwrap();
        assert_eq!(file.db(), None);
        assert_eq!(file.timestamp(), "manual");
    }

    #[test]
    fn timestamp_is_sortable() {
        let timestamp = Timestamp::now();
        let ts = timestamp.as_str();

        assert_eq!(ts.len(), "YYYYMMDD-HHMMSS".len());
        assert_eq!(&ts[8..9], "-");
        assert!(ts.chars().filter(|c| *c != '-').all(|c| c.is_ascii_digit()));
    }
}
