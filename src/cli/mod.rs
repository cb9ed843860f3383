// src/cli/mod.rs

use clap::Parser;

pub mod dispatcher;
pub mod handlers;

/// gcli: an incremental command-line parser with typed parameters.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    styles = clap::builder::Styles::styled()
        .header(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .usage(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .literal(clap::builder::styling::AnsiColor::Cyan.on_default().bold())
        .placeholder(clap::builder::styling::AnsiColor::Green.on_default()),
)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// Path to a gcli.toml with command declarations.
    #[arg(long, short, global = true)]
    pub config: Option<String>,

    /// The action (check, exec, list, repl) followed by its arguments.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}
