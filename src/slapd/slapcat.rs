use std::io;
use std::path::Path;
use std::process::Command;

use crate::backup::DatabaseId;

const DEFAULT_SLAPCAT: &str = "slapcat";

/// Exit status of a finished dump.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DumpStatus {
    pub succeeded: bool,
    /// [None] if the dump tool was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl DumpStatus {
    pub fn success() -> Self {
        Self {
            succeeded: true,
            exit_code: Some(0),
        }
    }

    pub fn failure(exit_code: Option<i32>) -> Self {
        Self {
            succeeded: false,
            exit_code,
        }
    }
}

/// Tool writing an LDIF dump of a database to a file.
pub trait Dumper {
    /// Dumps `db` (the default database if [None]) to `output`.
    ///
    /// Blocks until the dump finished. An [io::Error] is returned if the tool
    /// couldn't be run at all.
    fn dump(&self, db: Option<DatabaseId>, output: &Path) -> io::Result<DumpStatus>;
}

/// Dumps databases using [`slapcat(8)`].
///
/// [`slapcat(8)`]: https://www.openldap.org/software/man.cgi?query=slapcat
#[derive(Debug, Clone)]
pub struct Slapcat {
    command: String,
    extra_args: Vec<String>,
}

impl Default for Slapcat {
    fn default() -> Self {
        Self::with_command(DEFAULT_SLAPCAT.to_string(), Vec::new())
    }
}

impl Slapcat {
    /// Use `command` instead of `slapcat`. `extra_args` are passed before the
    /// database selection.
    pub fn with_command(command: String, extra_args: Vec<String>) -> Self {
        Self {
            command,
            extra_args,
        }
    }

    fn command(&self, db: Option<DatabaseId>, output: &Path) -> Command {
        let mut slapcat = Command::new(&self.command);
        slapcat.args(&self.extra_args);
        if let Some(db) = db {
            slapcat.arg("-n").arg(db.to_string());
        }
        slapcat.arg("-l").arg(output);

        slapcat
    }
}

impl Dumper for Slapcat {
    fn dump(&self, db: Option<DatabaseId>, output: &Path) -> io::Result<DumpStatus> {
        let mut slapcat = self.command(db, output);
        log::trace!(target: "slapd::slapcat", "Running: {slapcat:?}");

        let slapcat_output = slapcat.output()?;

        let stderr = String::from_utf8_lossy(&slapcat_output.stderr);
        if !stderr.is_empty() {
            log::warn!(target: "slapd::slapcat", "{}", stderr.trim_end());
        }

        let status = slapcat_output.status;
        Ok(DumpStatus {
            succeeded: status.success(),
            exit_code: status.code(),
        })
    }
}
