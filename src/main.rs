use std::process::ExitCode;

use clap::Parser;
use ldap_backup_lib::backup::Orchestrator;
use ldap_backup_lib::cli::Cli;
use ldap_backup_lib::config::Config;
use ldap_backup_lib::slapd::{Pidof, Slapcat};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // init logger
    let mut env_logger = env_logger::builder();
    if let Some(level) = cli.verbose {
        env_logger.filter_level(level);
    }
    env_logger.try_init().expect("env_logger should not fail");

    let config = match Config::load_or_init(&cli.config) {
        Ok(config) => cli.overrides.apply(config),
        Err(e) => {
            log::error!(target: "config", "{e}");
            return ExitCode::FAILURE;
        }
    };
    log::debug!(target: "config", "Using {config:?}");

    let dry_run = cli.dry_run;
    if dry_run {
        log::warn!("Running in dry-run mode");
    }

    let slapcat = Slapcat::with_command(config.dump_command.clone(), config.dump_args.clone());
    let pidof = Pidof::with_process(config.service_name.clone());

    match Orchestrator::new(&config, &slapcat, &pidof)
        .dry_run(dry_run)
        .run()
    {
        Ok(summary) => {
            if !summary.failed.is_empty() {
                log::warn!(
                    target: "backup",
                    "{} of {} database backup(s) failed",
                    summary.failed.len(),
                    summary.failed.len() + summary.succeeded.len()
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!(target: "backup", "{e}");
            ExitCode::FAILURE
        }
    }
}
