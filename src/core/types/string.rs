// src/core/types/string.rs

use super::{ParseContext, Type, TypeKind};
use crate::core::{argument::Argument, conversion::Conversion};
use serde_json::Value;

/// Plain text. Every input converts.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringType;

impl Type for StringType {
    fn name(&self) -> &str {
        "string"
    }

    fn kind(&self) -> TypeKind {
        TypeKind::String
    }

    fn parse(&self, arg: &Argument, _ctx: &ParseContext) -> Conversion {
        let value = if arg.text().is_empty() {
            Value::Null
        } else {
            Value::String(arg.text().to_string())
        };
        Conversion::valid(value, arg.clone())
    }

    /// Escapes characters the tokenizer would otherwise interpret, so the
    /// result reads back as the same string.
    fn stringify(&self, value: &Value, _ctx: &ParseContext) -> String {
        let text = match value {
            Value::Null => return String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            match c {
                '\\' => out.push_str("\\\\"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                '\'' => out.push_str("\\'"),
                '"' => out.push_str("\\\""),
                other => out.push(other),
            }
        }
        out
    }
}

// MARK: --- UNIT TESTS ---
