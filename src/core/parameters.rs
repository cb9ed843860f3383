// src/core/parameters.rs

use crate::{
    core::{
        argument::Argument,
        conversion::Status,
        tokenizer::tokenize,
        types::{ParseContext, Type, TypeError, TypeKind, Types},
    },
    models::{ParamConfig, ParamDetail, TypeSpec, TypeSpecDetail},
};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use std::{fmt, sync::Arc};
use thiserror::Error;

lazy_static! {
    static ref PARAMETER_DECL_RE: Regex =
        Regex::new(r"^\s*([^(\s]+)\s*(?:\((.*)\))?\s*$").expect("parameter declaration regex");
}

lazy_static! {
    static ref MODIFIERS_RE: Regex =
        Regex::new(r#"\s*([^=,\s]+)(?:\s*=\s*(?:'([^']*)'|"([^"]*)"|([^,]*)))?\s*"#)
            .expect("modifier regex");
}

#[derive(Error, Debug)]
pub enum ParameterError {
    #[error("Invalid parameter declaration: '{0}'")]
    InvalidFormat(String),
    #[error("Unknown modifier '{key}' in parameter '{param}'.")]
    UnknownModifier { param: String, key: String },
    #[error("Modifier '{key}' of parameter '{param}' has an invalid value '{value}'.")]
    InvalidModifier {
        param: String,
        key: String,
        value: String,
    },
    #[error("Parameter '{param}' has an invalid default '{value}': {reason}")]
    InvalidDefault {
        param: String,
        value: String,
        reason: String,
    },
    #[error("Parameter '{0}' can only be given by name, so it needs a default value.")]
    NamedWithoutDefault(String),
    #[error("Type of parameter '{param}' could not be built: {source}")]
    Type {
        param: String,
        #[source]
        source: TypeError,
    },
}

// --- PARAMETER ---

/// Static metadata for one command parameter. Immutable once the command is
/// registered.
#[derive(Clone)]
pub struct Parameter {
    name: String,
    type_: Arc<dyn Type>,
    description: Option<String>,
    default_value: Option<Value>,
    short: Option<char>,
    group: Option<String>,
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameter")
            .field("name", &self.name)
            .field("type", &self.type_.name())
            .field("default_value", &self.default_value)
            .field("short", &self.short)
            .field("group", &self.group)
            .finish()
    }
}

impl Parameter {
    pub fn new(name: impl Into<String>, type_: Arc<dyn Type>) -> Self {
        Self {
            name: name.into(),
            type_,
            description: None,
            default_value: None,
            short: None,
            group: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn with_short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    /// Puts the parameter in a named group, which makes it named-only.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_(&self) -> &Arc<dyn Type> {
        &self.type_
    }

    pub fn kind(&self) -> TypeKind {
        self.type_.kind()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn short(&self) -> Option<char> {
        self.short
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// The declared default, or the one implied by the type (`false` for
    /// booleans, `[]` for arrays).
    pub fn default_value(&self) -> Option<Value> {
        self.default_value
            .clone()
            .or_else(|| self.type_.default_value())
    }

    /// True when the command cannot run without the user providing a value.
    pub fn is_data_required(&self) -> bool {
        self.default_value().is_none()
    }

    /// Grouped parameters and booleans are only given by name.
    pub fn is_positional_allowed(&self) -> bool {
        self.group.is_none() && self.kind() != TypeKind::Boolean
    }

    /// True when `text` is exactly `--name` or `-s`.
    pub fn is_known_as(&self, text: &str) -> bool {
        if text.strip_prefix("--") == Some(self.name.as_str()) {
            return true;
        }
        match (self.short, text.strip_prefix('-')) {
            (Some(short), Some(rest)) => {
                let mut chars = rest.chars();
                chars.next() == Some(short) && chars.next().is_none()
            }
            _ => false,
        }
    }

    /// Checks the declaration is usable on a command line.
    pub fn validate(&self) -> Result<(), ParameterError> {
        if !self.is_positional_allowed() && self.is_data_required() {
            return Err(ParameterError::NamedWithoutDefault(self.name.clone()));
        }
        Ok(())
    }
}

// --- DECLARATION PARSING ---

/// Builds a parameter from its config form, compact or detailed.
pub fn parameter_from_config(config: &ParamConfig, types: &Types) -> Result<Parameter, ParameterError> {
    match config {
        ParamConfig::Compact(decl) => parse_parameter_decl(decl, types),
        ParamConfig::Detailed(detail) => parameter_from_detail(detail, types),
    }
}

/// Parses a compact declaration, e.g. `count(type='number', default='1', min=0)`.
///
/// # Logic:
/// - Type-shaping modifiers (`type`, `min`, `max`, `step`, `data`, `subtype`,
///   `float`) build the type spec.
/// - The default is typed text and is converted with the finished type.
pub fn parse_parameter_decl(decl: &str, types: &Types) -> Result<Parameter, ParameterError> {
    log::debug!("Parsing parameter declaration: '{}'", decl);
    let caps = PARAMETER_DECL_RE
        .captures(decl)
        .ok_or_else(|| ParameterError::InvalidFormat(decl.to_string()))?;
    let name = caps
        .get(1)
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| ParameterError::InvalidFormat(decl.to_string()))?;
    let modifiers = caps.get(2).map_or("", |m| m.as_str());

    let mut spec = TypeSpecDetail {
        name: "string".to_string(),
        ..Default::default()
    };
    let mut default_text: Option<String> = None;
    let mut description = None;
    let mut short = None;
    let mut group = None;

    let invalid = |key: &str, value: &str| ParameterError::InvalidModifier {
        param: name.clone(),
        key: key.to_string(),
        value: value.to_string(),
    };
    let number = |key: &str, value: &str| value.trim().parse::<f64>().map_err(|_| invalid(key, value));

    for caps in MODIFIERS_RE.captures_iter(modifiers) {
        let key = caps.get(1).map_or("", |m| m.as_str()).trim();
        if key.is_empty() {
            continue;
        }
        let value = caps
            .get(2)
            .or(caps.get(3))
            .or(caps.get(4))
            .map(|m| m.as_str());

        match (key, value) {
            ("type", Some(v)) => spec.name = v.trim().to_string(),
            ("default", Some(v)) => default_text = Some(v.to_string()),
            ("description", Some(v)) => description = Some(v.to_string()),
            ("group", Some(v)) => group = Some(v.to_string()),
            ("short", Some(v)) => short = Some(parse_short(v).ok_or_else(|| invalid(key, v))?),
            ("min", Some(v)) => spec.min = Some(number(key, v)?),
            ("max", Some(v)) => spec.max = Some(number(key, v)?),
            ("step", Some(v)) => spec.step = Some(number(key, v)?),
            ("data", Some(v)) => {
                spec.data = Some(v.split('|').map(|s| s.trim().to_string()).collect());
            }
            ("subtype", Some(v)) => spec.subtype = Some(Box::new(TypeSpec::from(v.trim()))),
            ("float", None) => spec.allow_float = true,
            _ => {
                return Err(ParameterError::UnknownModifier {
                    param: name.clone(),
                    key: key.to_string(),
                });
            }
        }
    }

    let type_ = types
        .get_type(&TypeSpec::Detailed(spec))
        .map_err(|source| ParameterError::Type {
            param: name.clone(),
            source,
        })?;

    let mut param = Parameter::new(name, type_);
    param.description = description;
    param.short = short;
    param.group = group;
    if let Some(text) = default_text {
        param.default_value = Some(parse_default(&param, &text)?);
    }
    param.validate()?;

    log::debug!("Parsed parameter: {:?}", param);
    Ok(param)
}

/// Builds a parameter from a table. A string default for a non-string type is
/// treated as typed text; other defaults are taken as they are.
pub fn parameter_from_detail(detail: &ParamDetail, types: &Types) -> Result<Parameter, ParameterError> {
    let spec = detail
        .type_spec
        .clone()
        .unwrap_or_else(|| TypeSpec::from("string"));
    let type_ = types.get_type(&spec).map_err(|source| ParameterError::Type {
        param: detail.name.clone(),
        source,
    })?;

    let mut param = Parameter::new(detail.name.clone(), type_);
    param.description = detail.description.clone();
    param.group = detail.group.clone();
    if let Some(short) = &detail.short {
        param.short = Some(parse_short(short).ok_or_else(|| ParameterError::InvalidModifier {
            param: detail.name.clone(),
            key: "short".to_string(),
            value: short.clone(),
        })?);
    }
    param.default_value = match &detail.default {
        Some(Value::String(text)) if param.kind() != TypeKind::String => {
            Some(parse_default(&param, text)?)
        }
        other => other.clone(),
    };
    param.validate()?;
    Ok(param)
}

fn parse_short(text: &str) -> Option<char> {
    let mut chars = text.trim().trim_start_matches('-').chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_alphanumeric() => Some(c),
        _ => None,
    }
}

/// Converts default text with the parameter's own type.
fn parse_default(param: &Parameter, text: &str) -> Result<Value, ParameterError> {
    let arg = if param.kind() == TypeKind::Array {
        let elements = if text.trim().is_empty() {
            Vec::new()
        } else {
            tokenize(text)
        };
        Argument::array(elements)
    } else {
        Argument::new(text, "", "")
    };

    let conversion = param.type_.parse(&arg, &ParseContext::default());
    if conversion.status() != Status::Valid {
        return Err(ParameterError::InvalidDefault {
            param: param.name.clone(),
            value: text.to_string(),
            reason: conversion.message,
        });
    }
    Ok(conversion.value)
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(decl: &str) -> Result<Parameter, ParameterError> {
        parse_parameter_decl(decl, &Types::new())
    }

    // --- `parse_parameter_decl` Tests ---
    #[test]
    fn test_bare_name_is_a_required_string() {
        let param = parse("message").unwrap();
        assert_eq!(param.name(), "message");
        assert_eq!(param.kind(), TypeKind::String);
        assert!(param.is_data_required());
        assert!(param.is_positional_allowed());
    }

    #[test]
    fn test_modifiers_shape_the_type() {
        let param = parse("count(type='number', default='3', short=n, min=1, max=5)").unwrap();
        assert_eq!(param.kind(), TypeKind::Number);
        assert_eq!(param.default_value(), Some(json!(3)));
        assert_eq!(param.short(), Some('n'));
        assert!(param.is_known_as("--count"));
        assert!(param.is_known_as("-n"));
        assert!(!param.is_known_as("-nn"));
        assert!(!param.is_known_as("--coun"));
    }

    #[test]
    fn test_selection_data_and_description() {
        let param =
            parse(r#"color(type=selection, data='red|green', description="Paint, carefully")"#)
                .unwrap();
        assert_eq!(param.kind(), TypeKind::Selection);
        assert_eq!(param.description(), Some("Paint, carefully"));
    }

    #[test]
    fn test_float_flag() {
        let param = parse("ratio(type='number', float, default='0.5')").unwrap();
        assert_eq!(param.default_value(), Some(json!(0.5)));
    }

    #[test]
    fn test_array_default_is_tokenized() {
        let param = parse("ids(type='array', subtype='number', default='1 2')").unwrap();
        assert_eq!(param.default_value(), Some(json!([1, 2])));
        let empty = parse("tags(type='array', subtype='string')").unwrap();
        assert_eq!(empty.default_value(), Some(json!([])));
    }

    #[test]
    fn test_invalid_declarations() {
        assert!(matches!(parse("x(colour='red')"), Err(ParameterError::UnknownModifier { .. })));
        assert!(matches!(parse("x(type='date')"), Err(ParameterError::Type { .. })));
        assert!(matches!(
            parse("x(type='number', default='many')"),
            Err(ParameterError::InvalidDefault { .. })
        ));
        assert!(matches!(parse("x(min='low')"), Err(ParameterError::InvalidModifier { .. })));
        assert!(matches!(parse("x(short='ab')"), Err(ParameterError::InvalidModifier { .. })));
    }

    #[test]
    fn test_named_only_needs_default() {
        assert!(matches!(
            parse("depth(type='number', group='Options')"),
            Err(ParameterError::NamedWithoutDefault(name)) if name == "depth"
        ));
        let flag = parse("verbose(type='boolean', group='Options')").unwrap();
        assert_eq!(flag.default_value(), Some(json!(false)));
        assert!(!flag.is_positional_allowed());
    }

    // --- `parameter_from_detail` Tests ---
    #[test]
    fn test_detailed_declaration() {
        let detail = ParamDetail {
            name: "depth".to_string(),
            type_spec: Some(TypeSpec::from("number")),
            default: Some(json!("4")),
            short: Some("-d".to_string()),
            group: Some("Options".to_string()),
            ..Default::default()
        };
        let param = parameter_from_detail(&detail, &Types::new()).unwrap();
        assert_eq!(param.default_value(), Some(json!(4)));
        assert_eq!(param.short(), Some('d'));
        assert!(!param.is_positional_allowed());
    }
}
