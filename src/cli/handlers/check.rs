// src/cli/handlers/check.rs

use crate::cli::handlers::commons::{self, Session};
use anyhow::Result;
use clap::Parser;
use colored::*;

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Shows how gcli reads a command line without running it."
)]
struct CheckArgs {
    /// Cursor position. Defaults to the end of the input.
    #[arg(long)]
    cursor: Option<usize>,

    /// Print the result as JSON.
    #[arg(long)]
    json: bool,

    /// The command line to check.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    input: Vec<String>,
}

/// The main handler for the `check` action.
pub fn handle(args: Vec<String>, session: &Session) -> Result<()> {
    let check_args = CheckArgs::try_parse_from(&args)?;
    let typed = commons::input_from(&check_args.input);
    let requisition = session.requisition_for(&typed);
    let cursor = check_args.cursor.unwrap_or_else(|| typed.chars().count());
    let assignment = requisition.get_assignment_at(cursor);

    if check_args.json {
        let summary = serde_json::json!({
            "typed": requisition.typed(),
            "canonical": requisition.to_canonical_string(),
            "status": requisition.get_status(),
            "message": requisition.get_status_message(),
            "markup": requisition.get_input_status_markup(cursor),
            "args": requisition.get_args_object(),
            "assignment": assignment.param().name(),
            "predictions": assignment.predictions(),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("\n  {:<12} {}", "Input".blue(), commons::render_markup(&requisition.get_input_status_markup(cursor)));
    println!("  {:<12} {}", "Markup".blue(), requisition.get_input_status_string(cursor).dimmed());
    println!("  {:<12} {}", "Status".blue(), commons::render_status(requisition.get_status()));
    let message = requisition.get_status_message();
    if !message.is_empty() {
        println!("  {:<12} {}", "Message".blue(), message);
    }
    println!("  {:<12} {}", "Canonical".blue(), requisition.to_canonical_string());

    for (name, value) in requisition.get_args_object() {
        println!("  {:<12} {} = {}", "Argument".blue(), name.yellow(), value);
    }
    if !assignment.predictions().is_empty() {
        println!("\n{} '{}':", "Predictions for".bold(), assignment.param().name());
        commons::print_predictions(assignment);
    }
    Ok(())
}
