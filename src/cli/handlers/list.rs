// src/cli/handlers/list.rs

use crate::{cli::handlers::commons::Session, core::canon::Command};
use anyhow::Result;
use clap::Parser;
use colored::*;

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, about = "Lists the registered commands.")]
struct ListArgs {
    /// Include hidden commands.
    #[arg(long)]
    all: bool,
}

/// The main handler for the `list` action.
pub fn handle(args: Vec<String>, session: &Session) -> Result<()> {
    let list_args = ListArgs::try_parse_from(&args)?;
    let commands = session.system.canon().get_commands();

    println!("\n--- {} ---", "Commands".yellow());
    for command in commands.iter().filter(|c| list_args.all || !c.hidden) {
        print_command(command);
    }
    Ok(())
}

fn print_command(command: &Command) {
    let name = if command.is_executable() {
        command.name.cyan().bold()
    } else {
        command.name.green().bold()
    };
    println!(
        "\n  {} {}",
        name,
        command.description.as_deref().unwrap_or_default().dimmed()
    );
    for param in &command.params {
        let mut line = format!("    {:<16} {}", param.name(), param.type_().name().blue());
        if let Some(short) = param.short() {
            line.push_str(&format!(" (-{})", short));
        }
        if let Some(group) = param.group() {
            line.push_str(&format!(" [{}]", group));
        }
        if let Some(default) = param.default_value() {
            line.push_str(&format!(" = {}", default));
        }
        println!("{}", line);
        if let Some(description) = param.description() {
            println!("      {}", description.dimmed());
        }
    }
}
