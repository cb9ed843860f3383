// src/cli/handlers/commons.rs

// Shared pieces for the handlers: session setup and terminal rendering.

use anyhow::{Context, Result};
use colored::Colorize;
use serde_json::Value;
use std::sync::Arc;

use crate::{
    core::{
        assignment::Assignment,
        canon::Command,
        config_loader,
        conversion::Status,
        parameters::Parameter,
        requisition::{Requisition, StatusSpan},
        types::StringType,
    },
    state::System,
    system::{context::ExecutionContext, executor::Report},
};

/// The loaded system plus the runtime async work runs on.
#[derive(Debug)]
pub struct Session {
    pub system: Arc<System>,
    pub runtime: tokio::runtime::Runtime,
}

impl Session {
    /// Builds a system from the configuration file and the built-in commands.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let config = config_loader::resolve_config(config_path)?;
        let system = System::with_settings(config.settings.clone());
        register_builtin_commands(&system)?;
        config_loader::register_commands(&system, &config)?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("Failed to start the async runtime")?;
        Ok(Self {
            system: Arc::new(system),
            runtime,
        })
    }

    pub fn requisition(&self) -> Requisition {
        Requisition::with_context(self.system.clone(), ExecutionContext::from_process(""))
    }

    /// A requisition for `typed`, with any deferred lookups loaded.
    pub fn requisition_for(&self, typed: &str) -> Requisition {
        let mut requisition = self.requisition();
        self.runtime.block_on(requisition.update_async(typed));
        requisition
    }
}

/// Commands that exist without any configuration.
pub fn register_builtin_commands(system: &System) -> Result<()> {
    system.canon().add_command(
        Command::new("echo")
            .with_description("Show a message")
            .with_param(
                Parameter::new("message", Arc::new(StringType))
                    .with_description("The text to show"),
            )
            .with_returns("string")
            .with_exec(|args, _| Ok(args.get("message").cloned().unwrap_or(Value::Null).into())),
    )?;
    Ok(())
}

/// Re-joins shell arguments into one command line. Arguments the shell
/// unquoted are quoted again so they stay single arguments.
pub fn input_from(args: &[String]) -> String {
    args.iter()
        .map(|arg| {
            if arg.contains(char::is_whitespace) && !arg.contains('\'') {
                format!("'{}'", arg)
            } else {
                arg.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Colors the input by status: errors in red, incomplete parts in yellow.
pub fn render_markup(spans: &[StatusSpan]) -> String {
    spans
        .iter()
        .map(|span| match span.status {
            Status::Valid => span.text.normal().to_string(),
            Status::Incomplete => span.text.yellow().to_string(),
            Status::Error => span.text.red().underline().to_string(),
        })
        .collect()
}

pub fn render_status(status: Status) -> String {
    match status {
        Status::Valid => status.to_string().green().bold().to_string(),
        Status::Incomplete => status.to_string().yellow().bold().to_string(),
        Status::Error => status.to_string().red().bold().to_string(),
    }
}

/// Lists the predictions of an assignment, one per line.
pub fn print_predictions(assignment: &Assignment) {
    for prediction in assignment.predictions() {
        match &prediction.description {
            Some(description) => println!("  {:<20} {}", prediction.name.cyan(), description.dimmed()),
            None => println!("  {}", prediction.name.cyan()),
        }
    }
}

pub fn print_report(report: &Report) {
    let output = match &report.output {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    };
    if report.error {
        eprintln!("{}: {}", "Failed".red().bold(), output);
    } else if !output.is_empty() {
        println!("{}", output);
    }
    log::debug!("'{}' took {:?}", report.canonical, report.duration);
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_from_requotes_spaced_arguments() {
        let args = vec!["echo".to_string(), "hello world".to_string(), "x".to_string()];
        assert_eq!(input_from(&args), "echo 'hello world' x");
    }

    #[test]
    fn test_render_markup_keeps_text() {
        colored::control::set_override(false);
        let spans = vec![
            StatusSpan {
                status: Status::Valid,
                text: "echo ".into(),
            },
            StatusSpan {
                status: Status::Error,
                text: "x".into(),
            },
        ];
        assert_eq!(render_markup(&spans), "echo x");
    }

    #[test]
    fn test_builtin_echo() {
        let system = System::new();
        register_builtin_commands(&system).unwrap();
        assert!(system.canon().get_command("echo").is_some_and(|c| c.is_executable()));
    }
}
