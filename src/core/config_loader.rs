// src/core/config_loader.rs

//! Turns a `gcli.toml` file into registered commands.

use crate::{
    constants::{CONFIG_FILENAME, GCLI_DIR},
    core::{
        canon::Command,
        interpolator::Interpolator,
        parameters::{Parameter, parameter_from_config},
        types::Types,
    },
    models::{CommandConfig, GcliConfig},
    state::System,
};
use anyhow::{Context, Result, anyhow};
use serde_json::Value;
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not find system config directory.")]
    ConfigDirNotFound,
    #[error("Could not read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML file at '{path}': {source}")]
    TomlParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

/// `<config dir>/gcli/gcli.toml`.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join(GCLI_DIR).join(CONFIG_FILENAME))
        .ok_or(ConfigError::ConfigDirNotFound)
}

/// Expands `~` and environment variables in a user-given path.
pub fn expand_path(template: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(template)
        .map_err(|e| anyhow!("Failed to expand path '{}': {}", template, e))?;
    Ok(PathBuf::from(expanded.into_owned()))
}

pub fn parse_config(content: &str) -> Result<GcliConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

pub fn load_config(path: &Path) -> Result<GcliConfig, ConfigError> {
    log::debug!("Loading configuration from '{}'", path.display());
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads the file the user pointed at, or the default file when it exists.
/// No file at the default location is an empty configuration.
pub fn resolve_config(explicit: Option<&str>) -> Result<GcliConfig> {
    if let Some(template) = explicit {
        let path = expand_path(template)?;
        return Ok(load_config(&path)?);
    }
    let path = default_config_path()?;
    if !path.exists() {
        log::debug!("No configuration at '{}', starting empty", path.display());
        return Ok(GcliConfig::default());
    }
    Ok(load_config(&path)?)
}

/// Builds a live command from its declaration.
///
/// # Logic:
/// - Each parameter goes through the declaration parser and the type registry.
/// - An `output` template becomes the exec function: it is expanded with the
///   converted arguments and returned as a string.
/// - Without a template the command is a group.
pub fn build_command(config: &CommandConfig, types: &Types) -> Result<Command> {
    let params: Vec<Parameter> = config
        .params
        .iter()
        .map(|p| parameter_from_config(p, types))
        .collect::<Result<_, _>>()
        .with_context(|| format!("Invalid parameter in command '{}'", config.name))?;

    let mut command = Command::new(config.name.clone());
    for param in params {
        command = command.with_param(param);
    }
    if let Some(description) = &config.description {
        command = command.with_description(description.clone());
    }
    if let Some(returns) = &config.returns {
        command = command.with_returns(returns.clone());
    }
    command = command.hidden(config.hidden);

    if let Some(template) = config.output.clone() {
        let shape = command.clone();
        command = command.with_exec(move |args, ctx| {
            let output = Interpolator::new(&shape, args, ctx).expand_string(&template)?;
            Ok(Value::String(output).into())
        });
    }
    Ok(command)
}

/// Registers every command of a configuration. Returns how many were added.
pub fn register_commands(system: &System, config: &GcliConfig) -> Result<usize> {
    for command_config in &config.commands {
        let command = build_command(command_config, system.types())?;
        system
            .canon()
            .add_command(command)
            .with_context(|| format!("Could not register command '{}'", command_config.name))?;
    }
    log::info!("Registered {} command(s) from configuration", config.commands.len());
    Ok(config.commands.len())
}

// MARK: --- UNIT TESTS ---
