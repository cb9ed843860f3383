// src/core/types/command.rs

use super::{
    ParseContext, Type, TypeKind,
    selection::{Lookup, find_corrections, no_match_message},
};
use crate::core::{
    argument::Argument,
    canon::{Canon, Command},
    conversion::{Conversion, Prediction, Status},
};
use serde_json::Value;
use std::sync::Arc;

/// Resolves command names against the registry. The value of a conversion is
/// the command's name.
#[derive(Debug, Clone)]
pub struct CommandType {
    canon: Arc<Canon>,
}

impl CommandType {
    pub fn new(canon: Arc<Canon>) -> Self {
        Self { canon }
    }

    fn prediction(command: &Command) -> Prediction {
        Prediction {
            name: command.name.clone(),
            value: Value::String(command.name.clone()),
            description: command.description.clone(),
            incomplete: !command.is_executable(),
        }
    }

    /// Visible commands starting with the typed text, exact match first. With
    /// nothing typed, only top-level commands are offered.
    fn find_predictions(&self, text: &str, max: usize) -> Vec<Prediction> {
        let mut commands: Vec<Arc<Command>> = self
            .canon
            .get_commands()
            .into_iter()
            .filter(|c| !c.hidden && c.name.starts_with(text))
            .filter(|c| !text.is_empty() || !c.name.contains(' '))
            .collect();
        commands.sort_by_key(|c| c.name != text);
        commands
            .iter()
            .take(max)
            .map(|c| Self::prediction(c))
            .collect()
    }
}

impl Type for CommandType {
    fn name(&self) -> &str {
        "command"
    }

    fn kind(&self) -> TypeKind {
        TypeKind::Command
    }

    /// # Logic:
    /// - Exact name of an executable command -> VALID.
    /// - Exact name of a group -> INCOMPLETE, but with the value set so the
    ///   caller can keep extending the match into sub-commands.
    /// - Prefix of some command -> INCOMPLETE.
    /// - Nothing -> ERROR with "did you mean" corrections.
    fn parse(&self, arg: &Argument, ctx: &ParseContext) -> Conversion {
        let text = arg.text();

        if let Some(command) = self.canon.get_command(text) {
            let value = Value::String(command.name.clone());
            if command.is_executable() {
                let predictions = vec![Self::prediction(&command)];
                return Conversion::new(value, arg.clone(), Status::Valid, "", predictions);
            }
            let predictions: Vec<Prediction> = self
                .canon
                .subcommands(&command.name)
                .iter()
                .filter(|c| !c.hidden)
                .take(ctx.max_predictions)
                .map(|c| Self::prediction(c))
                .collect();
            return Conversion::new(value, arg.clone(), Status::Incomplete, "", predictions);
        }

        let predictions = self.find_predictions(text, ctx.max_predictions);
        if !predictions.is_empty() {
            return Conversion::new(Value::Null, arg.clone(), Status::Incomplete, "", predictions);
        }

        let visible: Vec<Lookup> = self
            .canon
            .get_commands()
            .iter()
            .filter(|c| !c.hidden)
            .map(|c| Lookup::new(c.name.clone(), Value::String(c.name.clone())))
            .collect();
        let corrections: Vec<Prediction> = find_corrections(&visible, text, ctx.max_predictions)
            .into_iter()
            .filter_map(|p| self.canon.get_command(&p.name))
            .map(|c| Self::prediction(&c))
            .collect();
        let message = no_match_message(text, &corrections);
        Conversion::new(Value::Null, arg.clone(), Status::Error, message, corrections)
    }

    fn stringify(&self, value: &Value, _ctx: &ParseContext) -> String {
        value.as_str().map(str::to_string).unwrap_or_default()
    }

    fn get_blank(&self, ctx: &ParseContext) -> Conversion {
        let predictions = self.find_predictions("", ctx.max_predictions);
        Conversion::new(Value::Null, Argument::blank(), Status::Incomplete, "", predictions)
    }
}

// MARK: --- UNIT TESTS ---
