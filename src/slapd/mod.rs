//! Interaction with the OpenLDAP server `slapd`.
//!
//! - [Slapcat]: dumps a database to an LDIF file.
//! - [Pidof]: checks if the server process is running on this host.

mod slapcat;

use std::process::{Command, Stdio};

pub use slapcat::{DumpStatus, Dumper, Slapcat};

/// Liveness check of the directory service.
pub trait ServiceProbe {
    /// Returns if the service is running.
    fn is_running(&self) -> bool;
}

/// Detects a running process by name using `pidof`.
#[derive(Debug, Clone)]
pub struct Pidof {
    process: String,
}

impl Pidof {
    pub fn with_process(process: String) -> Self {
        Self { process }
    }
}

impl ServiceProbe for Pidof {
    fn is_running(&self) -> bool {
        log::trace!(target: "slapd::pidof", "Running: pidof {}", self.process);

        match Command::new("pidof")
            .arg(&self.process)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
        {
            Ok(status) => status.success(),
            Err(e) => {
                log::warn!(target: "slapd::pidof", "Failed to execute pidof: {e}");
                false
            }
        }
    }
}
