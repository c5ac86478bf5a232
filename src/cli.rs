use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "duokan-checkin",
    about = "Daily Duokan check-in with simulated task rewards and a ServerChan summary.",
    long_about = "Claims the daily Duokan check-in reward, lists the channel tasks, simulates the supported ones locally, and pushes a summary through ServerChan.\n\nCredentials are read from DUOKAN_COOKIE (required) and SERVERCHAN_KEY (optional).",
    disable_help_subcommand = true
)]
pub(crate) struct Cli {
    /// Load configuration from PATH instead of ~/.config/duokan-checkin.yml.
    #[arg(
        short = 'c',
        long = "config",
        global = true,
        value_name = "PATH",
        help = "Load configuration from PATH instead of ~/.config/duokan-checkin.yml."
    )]
    pub(crate) config: Option<PathBuf>,

    #[command(subcommand)]
    pub(crate) command: Option<CliCommand>,
}

#[derive(Debug, Subcommand)]
pub(crate) enum CliCommand {
    #[command(about = "Validate configuration and credentials without making any network call.")]
    /// Validate configuration and credentials without making any network call.
    Doctor,
}
