use std::process::ExitCode;

mod app;
mod cli;
mod client;
mod config;
mod credentials;
mod doctor;
mod logger;
mod notifier;
mod pacing;
mod run_loop;
mod signing;
mod task_types;


fn main() -> ExitCode {
    app::main()
}
