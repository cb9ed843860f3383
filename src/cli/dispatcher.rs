// src/cli/dispatcher.rs

use anyhow::Result;

use crate::cli::{
    Cli,
    handlers::{self, commons::Session},
};

/// A built-in action, its aliases and its handler.
struct ActionDefinition {
    name: &'static str,
    aliases: &'static [&'static str],
    handler: fn(Vec<String>, &Session) -> Result<()>,
}

static ACTION_REGISTRY: &[ActionDefinition] = &[
    ActionDefinition {
        name: "check",
        aliases: &["status"],
        handler: handlers::check::handle,
    },
    ActionDefinition {
        name: "exec",
        aliases: &["run"],
        handler: handlers::exec::handle,
    },
    ActionDefinition {
        name: "list",
        aliases: &["ls"],
        handler: handlers::list::handle,
    },
    ActionDefinition {
        name: "repl",
        aliases: &[],
        handler: handlers::repl::handle,
    },
];

fn find_action(name: &str) -> Option<&'static ActionDefinition> {
    ACTION_REGISTRY
        .iter()
        .find(|action| action.name == name || action.aliases.contains(&name))
}

/// Routes the command line to a handler.
///
/// # Logic:
/// - No arguments: start the interactive prompt.
/// - A known action name: run that action with the rest.
/// - Anything else is a command line to execute (`gcli echo hi`).
pub fn run_cli(cli: Cli) -> Result<()> {
    log::debug!("CLI args parsed: {:?}", cli);
    let session = Session::load(cli.config.as_deref())?;

    let mut args = cli.args.into_iter();
    let Some(first) = args.next() else {
        return handlers::repl::handle(Vec::new(), &session);
    };
    let rest: Vec<String> = args.collect();

    match find_action(&first) {
        Some(action) => (action.handler)(rest, &session),
        None => {
            let mut input = vec![first];
            input.extend(rest);
            handlers::exec::handle(input, &session)
        }
    }
}

// MARK: --- UNIT TESTS ---
