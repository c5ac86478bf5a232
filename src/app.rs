use clap::Parser;
use rand::thread_rng;
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::cli::{Cli, CliCommand};
use crate::config::{load_config, Config};
use crate::credentials::Credentials;
use crate::doctor::run_doctor_mode;
use crate::logger::Logger;
use crate::pacing::{Pacer, ThreadSleeper};
use crate::run_loop::{run_daily, Quit};

const DEFAULT_CONFIG_REL: &str = ".config/duokan-checkin.yml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AppMode {
    Run,
    Doctor,
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// An explicit path must exist; the default path is optional.
pub(crate) fn resolve_config_path(
    explicit: Option<PathBuf>,
    home: Option<&Path>,
) -> Result<Option<PathBuf>, String> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(format!("Missing config file: {}", path.display()));
        }
        return Ok(Some(path));
    }
    Ok(home
        .map(|home| home.join(DEFAULT_CONFIG_REL))
        .filter(|path| path.is_file()))
}

fn load_effective_config(path: Option<&Path>) -> Result<Config, String> {
    match path {
        Some(path) => load_config(path).map(|loaded| loaded.config),
        None => Ok(Config::default()),
    }
}

pub(crate) fn run_with_cli(cli: Cli) -> Result<(), Quit> {
    let mode = match cli.command {
        Some(CliCommand::Doctor) => AppMode::Doctor,
        None => AppMode::Run,
    };

    let fail = |message: String| {
        eprintln!("{}", message);
        Quit {
            code: 1,
            reason: message,
        }
    };
    let config_path = resolve_config_path(cli.config, home_dir().as_deref()).map_err(fail)?;
    let config = load_effective_config(config_path.as_deref()).map_err(fail)?;

    let logger = Logger::new(config.log_path.clone());
    let credentials = Credentials::from_env();

    if mode == AppMode::Doctor {
        return run_doctor_mode(&config, config_path.as_deref(), &credentials, &logger);
    }

    let interrupt_flag = Arc::new(AtomicBool::new(false));
    if let Err(err) = ctrlc::set_handler({
        let interrupt_flag = Arc::clone(&interrupt_flag);
        move || {
            interrupt_flag.store(true, Ordering::SeqCst);
        }
    }) {
        eprintln!("Failed to set interrupt handler: {}", err);
    }

    let mut pacer = Pacer::new(ThreadSleeper::new(interrupt_flag), thread_rng());
    // Outcomes of the run itself are reported through the summary and notification,
    // never through the exit status.
    let report = run_daily(&config, &credentials, &logger, &mut pacer);
    logger.log(&format!(
        "run finished status={:?} coins={}",
        report.status, report.coin_total
    ));
    Ok(())
}

pub(crate) fn run_with_args(args: Vec<OsString>) -> Result<(), Quit> {
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            // Render clap errors ourselves so they go through captured stderr.
            eprintln!("{err}");
            return Err(Quit {
                code: err.exit_code(),
                reason: "cli_parse".to_string(),
            });
        }
    };
    run_with_cli(cli)
}

pub(crate) fn main_with_args(args: Vec<OsString>) -> ExitCode {
    match run_with_args(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(quit) => quit.exit_code(),
    }
}

pub(crate) fn main() -> ExitCode {
    main_with_args(env::args_os().collect())
}
