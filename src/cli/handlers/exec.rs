// src/cli/handlers/exec.rs

use crate::{
    cli::handlers::commons::{self, Session},
    core::requisition::ExecOptions,
};
use anyhow::{Result, anyhow};
use clap::Parser;

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, about = "Parses and runs a command line.")]
struct ExecArgs {
    /// Keep the execution out of the report log.
    #[arg(long)]
    hidden: bool,

    /// The command line to run.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    input: Vec<String>,
}

/// The main handler for the `exec` action.
pub fn handle(args: Vec<String>, session: &Session) -> Result<()> {
    let exec_args = ExecArgs::try_parse_from(&args)?;
    let typed = commons::input_from(&exec_args.input);
    let mut requisition = session.requisition_for(&typed);

    let options = ExecOptions {
        hidden: exec_args.hidden,
    };
    let report = session.runtime.block_on(requisition.exec(options))?;
    commons::print_report(&report);
    if report.error {
        return Err(anyhow!("Command '{}' failed.", report.command));
    }
    Ok(())
}
