use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

use crate::backup::{DatabaseId, KeepBackups};
use crate::config::Config;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Verbosity of the command output.
    #[arg(long)]
    pub verbose: Option<LevelFilter>,

    /// Path to the configuration file. Created with defaults if missing.
    #[arg(
        long,
        short = 'c',
        env = "LDAP_BACKUP_CONFIG",
        default_value = "/etc/ldap_backup.toml"
    )]
    pub config: PathBuf,

    /// Simulative backup run.
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub overrides: ConfigOverrides,
}

/// Command line arguments taking precedence over the configuration file.
#[derive(clap::Args, Debug, Default)]
pub struct ConfigOverrides {
    /// Directory to store the backups in.
    #[arg(long, short = 'd')]
    pub backup_dir: Option<PathBuf>,

    /// Backups to keep besides the new one (-1 keeps all).
    #[arg(long, short = 'k', allow_negative_numbers = true)]
    pub keep: Option<KeepBackups>,

    /// Number of a database to backup. May be repeated.
    #[arg(long = "db", short = 'n')]
    pub databases: Vec<DatabaseId>,

    /// Abort if slapd isn't running.
    #[arg(long, overrides_with = "no_check_slapd")]
    pub check_slapd: bool,

    /// Don't check if slapd is running, even if configured.
    #[arg(long, overrides_with = "check_slapd")]
    pub no_check_slapd: bool,

    /// Create the backup directory if it doesn't exist.
    #[arg(long, overrides_with = "no_create_dir")]
    pub create_dir: bool,

    /// Never create the backup directory, even if configured.
    #[arg(long, overrides_with = "create_dir")]
    pub no_create_dir: bool,
}

/// Resolves a `--flag`/`--no-flag` pair. [None] if neither is given.
fn switch(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

impl ConfigOverrides {
    /// Applies the overrides to `config`.
    pub fn apply(self, mut config: Config) -> Config {
        if let Some(backup_dir) = self.backup_dir {
            config.backup_dir = backup_dir;
        }
        if let Some(keep) = self.keep {
            config.keep_backups = keep;
        }
        if !self.databases.is_empty() {
            config.databases = self.databases;
        }
        if let Some(check_slapd) = switch(self.check_slapd, self.no_check_slapd) {
            config.check_slapd = check_slapd;
        }
        if let Some(create_dir) = switch(self.create_dir, self.no_create_dir) {
            config.create_backup_dir = create_dir;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_take_precedence() {
        let cli = Cli::try_parse_from([
            "ldap_backup",
            "--keep",
            "-1",
            "--db",
            "0",
            "-n",
            "2",
            "--backup-dir",
            "/srv/ldap",
            "--create-dir",
        ])
        .unwrap();

        let config = cli.overrides.apply(Config::default());

        assert_eq!(config.keep_backups, KeepBackups::Unlimited);
        assert_eq!(config.databases, vec![DatabaseId(0), DatabaseId(2)]);
        assert_eq!(config.backup_dir, PathBuf::from("/srv/ldap"));
        assert!(config.create_backup_dir);
        assert!(!config.check_slapd);
    }

    #[test]
    fn no_overrides_keep_config() {
        let config = Config {
            databases: vec![DatabaseId(1)],
            check_slapd: true,
            ..Config::default()
        };

        let applied = ConfigOverrides::default().apply(config.clone());

        assert_eq!(applied, config);
    }

    #[test]
    fn negated_flags_disable_config() {
        let config = Config {
            check_slapd: true,
            create_backup_dir: true,
            ..Config::default()
        };
        let cli = Cli::try_parse_from(["ldap_backup", "--no-check-slapd", "--no-create-dir"])
            .unwrap();

        let applied = cli.overrides.apply(config);

        assert!(!applied.check_slapd);
        assert!(!applied.create_backup_dir);
    }

    #[test]
    fn last_of_flag_pair_wins() {
        let cli = Cli::try_parse_from(["ldap_backup", "--check-slapd", "--no-check-slapd"])
            .unwrap();
        assert!(!cli.overrides.apply(Config::default()).check_slapd);

        let cli = Cli::try_parse_from(["ldap_backup", "--no-create-dir", "--create-dir"])
            .unwrap();
        assert!(cli.overrides.apply(Config::default()).create_backup_dir);
    }

    #[test]
    fn invalid_keep_is_rejected() {
        assert!(Cli::try_parse_from(["ldap_backup", "--keep", "-3"]).is_err());
        assert!(Cli::try_parse_from(["ldap_backup", "--db", "x"]).is_err());
    }
}
