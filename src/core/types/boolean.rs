// src/core/types/boolean.rs

use super::{
    ParseContext, Type, TypeKind,
    selection::{Lookup, SelectionType},
};
use crate::core::{
    argument::{Argument, ArgumentKind},
    conversion::Conversion,
};
use serde_json::Value;

/// `true`/`false`, typed out or given as a bare `--flag`.
#[derive(Debug, Clone)]
pub struct BooleanType {
    selection: SelectionType,
}

impl Default for BooleanType {
    fn default() -> Self {
        Self::new()
    }
}

impl BooleanType {
    pub fn new() -> Self {
        let selection = SelectionType::from_lookup(vec![
            Lookup::new("false", Value::Bool(false)),
            Lookup::new("true", Value::Bool(true)),
        ])
        .with_name("boolean");
        Self { selection }
    }
}

impl Type for BooleanType {
    fn name(&self) -> &str {
        "boolean"
    }

    fn kind(&self) -> TypeKind {
        TypeKind::Boolean
    }

    fn parse(&self, arg: &Argument, ctx: &ParseContext) -> Conversion {
        match arg.kind() {
            ArgumentKind::TrueNamed(_) => Conversion::valid(Value::Bool(true), arg.clone()),
            ArgumentKind::FalseNamed => Conversion::valid(Value::Bool(false), arg.clone()),
            _ => self.selection.parse(arg, ctx),
        }
    }

    fn stringify(&self, value: &Value, _ctx: &ParseContext) -> String {
        match value {
            Value::Bool(b) => b.to_string(),
            _ => String::new(),
        }
    }

    fn increment(&self, value: &Value, ctx: &ParseContext) -> Option<Value> {
        self.selection.increment(value, ctx)
    }

    fn decrement(&self, value: &Value, ctx: &ParseContext) -> Option<Value> {
        self.selection.decrement(value, ctx)
    }

    fn get_blank(&self, _ctx: &ParseContext) -> Conversion {
        Conversion::valid(Value::Bool(false), Argument::blank())
    }

    fn default_value(&self) -> Option<Value> {
        Some(Value::Bool(false))
    }
}

// MARK: --- UNIT TESTS ---
