// src/cli/handlers/repl.rs

use crate::{
    cli::handlers::commons::{self, Session},
    core::{conversion::Status, requisition::ExecOptions},
};
use anyhow::Result;
use colored::*;
use dialoguer::{Input, theme::ColorfulTheme};

/// The main handler for the `repl` action.
///
/// Each line is parsed as a whole. Valid lines run; anything else is shown
/// back with its status markup and the completions for where it stopped.
pub fn handle(_args: Vec<String>, session: &Session) -> Result<()> {
    println!("{}", "gcli interactive prompt. Type 'exit' to leave.".dimmed());
    let theme = ColorfulTheme::default();
    let mut requisition = session.requisition();

    loop {
        let line: String = Input::with_theme(&theme)
            .with_prompt("gcli")
            .allow_empty(true)
            .interact_text()?;
        let line = line.trim_end();
        if line == "exit" || line == "quit" {
            return Ok(());
        }
        if line.is_empty() {
            continue;
        }

        session.runtime.block_on(requisition.update_async(line));
        if requisition.get_status() == Status::Valid {
            match session.runtime.block_on(requisition.exec(ExecOptions::default())) {
                Ok(report) => commons::print_report(&report),
                Err(e) => eprintln!("{}: {}", "Error".red().bold(), e),
            }
            continue;
        }

        let cursor = line.chars().count();
        println!("  {}", commons::render_markup(&requisition.get_input_status_markup(cursor)));
        println!(
            "  {} {}",
            commons::render_status(requisition.get_status()),
            requisition.get_status_message()
        );
        commons::print_predictions(requisition.get_assignment_at(cursor));
    }
}
