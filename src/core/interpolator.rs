// src/core/interpolator.rs

use crate::{
    constants::MAX_PREDICTIONS,
    core::{canon::Command, types::ParseContext},
    system::context::ExecutionContext,
};
use anyhow::{Result, anyhow};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

lazy_static! {
    static ref TOKEN_RE: Regex =
        Regex::new(r"<([a-z]+)::([^>]+)>").expect("Failed to compile template token regex");
}

/// Expands `<args::name>` and `<env::KEY>` tokens in a command's output template.
#[derive(Debug, Clone)]
pub struct Interpolator<'a> {
    command: &'a Command,
    args: &'a Map<String, Value>,
    ctx: &'a ExecutionContext,
}

impl<'a> Interpolator<'a> {
    pub fn new(command: &'a Command, args: &'a Map<String, Value>, ctx: &'a ExecutionContext) -> Self {
        Self { command, args, ctx }
    }

    /// Replaces every token in one pass. Expanded text is never re-scanned,
    /// so values containing `<...>` come out verbatim.
    pub fn expand_string(&self, template: &str) -> Result<String> {
        let mut expanded = String::with_capacity(template.len());
        let mut last = 0;
        for captures in TOKEN_RE.captures_iter(template) {
            let (Some(full), Some(namespace), Some(key)) =
                (captures.get(0), captures.get(1), captures.get(2))
            else {
                continue;
            };
            expanded.push_str(template.get(last..full.start()).unwrap_or_default());
            expanded.push_str(&self.expand_token(namespace.as_str(), key.as_str())?);
            last = full.end();
        }
        expanded.push_str(template.get(last..).unwrap_or_default());
        Ok(expanded)
    }

    fn expand_token(&self, namespace: &str, key: &str) -> Result<String> {
        match namespace {
            "args" => {
                let param = self
                    .command
                    .get_parameter(key)
                    .ok_or_else(|| anyhow!("<args::{}> not found.", key))?;
                let value = self.args.get(key).cloned().unwrap_or(Value::Null);
                if value.is_null() {
                    return Ok(String::new());
                }
                let ctx = ParseContext::with_values(self.args.clone(), MAX_PREDICTIONS);
                Ok(param.type_().stringify(&value, &ctx))
            }
            "env" => self
                .ctx
                .env
                .get(key)
                .cloned()
                .ok_or_else(|| anyhow!("<env::{}> not found.", key)),
            _ => Err(anyhow!("Unknown token namespace: '<{}::...>'.", namespace)),
        }
    }
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        parameters::Parameter,
        types::{NumberType, StringType},
    };
    use serde_json::json;
    use std::sync::Arc;

    fn greet() -> Command {
        Command::new("greet")
            .with_param(Parameter::new("name", Arc::new(StringType)))
            .with_param(Parameter::new("times", Arc::new(NumberType::new())).with_default(json!(1)))
    }

    #[test]
    fn test_expands_args_and_env() {
        // --- Setup ---
        let command = greet();
        let args: Map<String, Value> = [
            ("name".to_string(), json!("Ada")),
            ("times".to_string(), json!(3)),
        ]
        .into_iter()
        .collect();
        let mut ctx = ExecutionContext::default();
        ctx.env.insert("GREETING".into(), "Hello".into());

        // --- Execute ---
        let output = Interpolator::new(&command, &args, &ctx)
            .expand_string("<env::GREETING>, <args::name> x<args::times>!")
            .unwrap();

        // --- Assert ---
        assert_eq!(output, "Hello, Ada x3!");
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let command = greet();
        let args: Map<String, Value> = [("name".to_string(), json!("<args::times>"))]
            .into_iter()
            .collect();
        let ctx = ExecutionContext::default();
        let output = Interpolator::new(&command, &args, &ctx)
            .expand_string("[<args::name>]")
            .unwrap();
        assert_eq!(output, "[<args::times>]");
    }

    #[test]
    fn test_unknown_tokens_fail() {
        let command = greet();
        let args = Map::new();
        let ctx = ExecutionContext::default();
        let interpolator = Interpolator::new(&command, &args, &ctx);
        assert!(interpolator.expand_string("<args::missing>").is_err());
        assert!(interpolator.expand_string("<env::NOT_SET_ANYWHERE>").is_err());
        assert!(interpolator.expand_string("<vars::x>").is_err());
        assert_eq!(interpolator.expand_string("no tokens").unwrap(), "no tokens");
    }
}
