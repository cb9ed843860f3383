// src/bin/gcli.rs

use gcli::{
    cli::{Cli, dispatcher},
    system::executor::ExecError,
};
use clap::Parser;
use colored::*;

/// The main entry point of the `gcli` application.
/// Sets up logging, parses arguments, dispatches to the handler and reports
/// errors in one place.
fn main() {
    env_logger::init();

    if let Err(e) = dispatcher::run_cli(Cli::parse()) {
        // Input that does not parse is a usage problem, not a failure.
        let code = match e.downcast_ref::<ExecError>() {
            Some(ExecError::InvalidInput(_) | ExecError::UnknownCommand(_)) => 2,
            _ => 1,
        };
        eprintln!("\n{}: {}", "Error".red().bold(), e);
        std::process::exit(code);
    }
}
