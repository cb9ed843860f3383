// src/core/canon.rs

//! The command registry.

use crate::{
    core::parameters::{Parameter, ParameterError},
    system::context::{ExecutionContext, Reply},
};
use serde_json::{Map, Value};
use std::{
    collections::{BTreeMap, HashSet},
    fmt,
    sync::{Arc, PoisonError, RwLock},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CanonError {
    #[error("A command needs a name.")]
    EmptyName,
    #[error("Command '{command}' declares parameter '{param}' more than once.")]
    DuplicateParameter { command: String, param: String },
    #[error("Command '{command}' uses the short name '-{short}' for more than one parameter.")]
    DuplicateShort { command: String, short: char },
    #[error("Command '{command}' has an invalid parameter: {source}")]
    Parameter {
        command: String,
        #[source]
        source: ParameterError,
    },
}

pub type ArgsExecFn =
    Arc<dyn Fn(&Map<String, Value>, &ExecutionContext) -> anyhow::Result<Reply> + Send + Sync>;
pub type FunctionalExecFn =
    Arc<dyn Fn(&[Value], &ExecutionContext) -> anyhow::Result<Reply> + Send + Sync>;

/// How a command runs.
#[derive(Clone)]
pub enum Exec {
    /// Receives `param name -> value`.
    Args(ArgsExecFn),
    /// Receives the values positionally, in declaration order.
    Functional(FunctionalExecFn),
}

impl fmt::Debug for Exec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Args(_) => f.write_str("Exec::Args"),
            Self::Functional(_) => f.write_str("Exec::Functional"),
        }
    }
}

/// A registered command. Multi-word names (`"pref set"`) form a hierarchy
/// under their group commands (`"pref"`).
#[derive(Debug, Clone)]
pub struct Command {
    pub name: String,
    pub description: Option<String>,
    pub params: Vec<Arc<Parameter>>,
    /// `None` for group commands.
    pub exec: Option<Exec>,
    pub returns: Option<String>,
    /// Hidden commands run when typed exactly but are never predicted and
    /// never reported.
    pub hidden: bool,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            params: Vec::new(),
            exec: None,
            returns: None,
            hidden: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_param(mut self, param: Parameter) -> Self {
        self.params.push(Arc::new(param));
        self
    }

    pub fn with_exec<F>(mut self, exec: F) -> Self
    where
        F: Fn(&Map<String, Value>, &ExecutionContext) -> anyhow::Result<Reply> + Send + Sync + 'static,
    {
        self.exec = Some(Exec::Args(Arc::new(exec)));
        self
    }

    pub fn with_functional_exec<F>(mut self, exec: F) -> Self
    where
        F: Fn(&[Value], &ExecutionContext) -> anyhow::Result<Reply> + Send + Sync + 'static,
    {
        self.exec = Some(Exec::Functional(Arc::new(exec)));
        self
    }

    pub fn with_returns(mut self, returns: impl Into<String>) -> Self {
        self.returns = Some(returns.into());
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn is_executable(&self) -> bool {
        self.exec.is_some()
    }

    pub fn get_parameter(&self, name: &str) -> Option<&Arc<Parameter>> {
        self.params.iter().find(|p| p.name() == name)
    }

    fn validate(&self) -> Result<(), CanonError> {
        if self.name.trim().is_empty() {
            return Err(CanonError::EmptyName);
        }
        let mut names = HashSet::new();
        let mut shorts = HashSet::new();
        for param in &self.params {
            if !names.insert(param.name()) {
                return Err(CanonError::DuplicateParameter {
                    command: self.name.clone(),
                    param: param.name().to_string(),
                });
            }
            if let Some(short) = param.short() {
                if !shorts.insert(short) {
                    return Err(CanonError::DuplicateShort {
                        command: self.name.clone(),
                        short,
                    });
                }
            }
            param.validate().map_err(|source| CanonError::Parameter {
                command: self.name.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

/// Commands by name. Registration is last-writer-wins.
#[derive(Debug, Default)]
pub struct Canon {
    commands: RwLock<BTreeMap<String, Arc<Command>>>,
}

impl Canon {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a command, replacing any command with the same name.
    pub fn add_command(&self, command: Command) -> Result<Arc<Command>, CanonError> {
        command.validate()?;
        let name = normalize(&command.name);
        let command = Arc::new(Command { name: name.clone(), ..command });
        let mut commands = self.commands.write().unwrap_or_else(PoisonError::into_inner);
        if commands.insert(name.clone(), command.clone()).is_some() {
            log::debug!("Command '{}' was replaced", name);
        } else {
            log::debug!("Command '{}' was registered", name);
        }
        Ok(command)
    }

    pub fn remove_command(&self, name: &str) -> bool {
        self.commands
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&normalize(name))
            .is_some()
    }

    pub fn get_command(&self, name: &str) -> Option<Arc<Command>> {
        self.commands
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&normalize(name))
            .cloned()
    }

    /// Every command, sorted by name.
    pub fn get_commands(&self) -> Vec<Arc<Command>> {
        self.commands
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    /// The direct and nested sub-commands of a group.
    pub fn subcommands(&self, parent: &str) -> Vec<Arc<Command>> {
        let prefix = format!("{} ", parent);
        self.commands
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .range(prefix.clone()..)
            .take_while(|(name, _)| name.starts_with(&prefix))
            .map(|(_, command)| command.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.commands.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Collapses runs of whitespace so `"pref   set"` registers as `"pref set"`.
fn normalize(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

// MARK: --- UNIT TESTS ---
