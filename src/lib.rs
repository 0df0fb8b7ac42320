//! Library to backup the databases of an [OpenLDAP][openldap] server.
//!
//! Every run dumps the configured databases with `slapcat` into files named
//! `backup-[db<N>-]<YYYYMMDD-HHMMSS>.ldif` and removes outdated dumps.
//! See [`backup`] for the run itself and [`slapd`] for the interaction with
//! the server.
//!
//! [openldap]: https://www.openldap.org/

#![forbid(unsafe_code)]

pub mod backup;
pub mod cli;
pub mod config;
pub mod slapd;
