// src/models.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;

// --- CONFIG FILE MODELS (gcli.toml) ---
// These are what the user writes. They are turned into live commands and
// parameters by `core::config_loader`.

/// The root of a `gcli.toml` file.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct GcliConfig {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub commands: Vec<CommandConfig>,
}

/// Engine-wide knobs.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    /// Predictions carried by each conversion. Capped at `MAX_PREDICTIONS_LIMIT`.
    pub max_predictions: Option<usize>,
}

/// One `[[commands]]` entry.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct CommandConfig {
    /// Possibly multi-word, e.g. `"pref set"`.
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    /// A template like `"Hello, <args::name>!"`. Without it the command is a
    /// group that only exists to hold sub-commands.
    #[serde(default)]
    pub output: Option<String>,
    /// Name of the type the command returns, informational only.
    #[serde(default)]
    pub returns: Option<String>,
    #[serde(default)]
    pub params: Vec<ParamConfig>,
}

/// A parameter declaration. Uses `untagged` so both forms are accepted:
/// `"count(type='number', default='1')"` or a full table.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(untagged)]
pub enum ParamConfig {
    Compact(String),
    Detailed(ParamDetail),
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct ParamDetail {
    pub name: String,
    #[serde(rename = "type", default)]
    pub type_spec: Option<TypeSpec>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub default: Option<Value>,
    /// Single-character alias, given without the dash.
    #[serde(default)]
    pub short: Option<String>,
    /// Parameters in a group can only be given by name (`--name value`).
    #[serde(default)]
    pub group: Option<String>,
}

// --- TYPE SPECS ---

/// A type reference: a bare registered name or a table with configuration.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum TypeSpec {
    Name(String),
    Detailed(TypeSpecDetail),
}

impl From<&str> for TypeSpec {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl TypeSpec {
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Detailed(detail) => &detail.name,
        }
    }

    /// The spec as a table, with everything but the name unset for bare names.
    pub fn detail(&self) -> TypeSpecDetail {
        match self {
            Self::Name(name) => TypeSpecDetail {
                name: name.clone(),
                ..Default::default()
            },
            Self::Detailed(detail) => detail.clone(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct TypeSpecDetail {
    pub name: String,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub step: Option<f64>,
    #[serde(default)]
    pub allow_float: bool,
    /// Selection options whose names are their values.
    #[serde(default)]
    pub data: Option<Vec<String>>,
    /// Selection options with explicit values.
    #[serde(default)]
    pub lookup: Option<Vec<LookupEntry>>,
    /// Element type of an array.
    #[serde(default)]
    pub subtype: Option<Box<TypeSpec>>,
    /// Alternatives of a union, tried in order.
    #[serde(default)]
    pub alternatives: Option<Vec<TypeSpec>>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct LookupEntry {
    pub name: String,
    /// Defaults to the name itself.
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub description: Option<String>,
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_full_config() {
        // --- Setup ---
        let content = r#"
            [settings]
            max_predictions = 5

            [[commands]]
            name = "pref"
            description = "Preference commands"

            [[commands]]
            name = "pref set"
            output = "<args::setting> = <args::value>"
            params = [
                "setting(type='selection', data='a|b')",
                { name = "value", type = { name = "number", min = 0, max = 10 }, default = 3, group = "Options", short = "v" },
            ]
        "#;

        // --- Execute ---
        let config: GcliConfig = toml::from_str(content).unwrap();

        // --- Assert ---
        assert_eq!(config.settings.max_predictions, Some(5));
        assert_eq!(config.commands.len(), 2);
        assert!(config.commands[0].output.is_none());

        let set = &config.commands[1];
        assert!(matches!(&set.params[0], ParamConfig::Compact(s) if s.starts_with("setting")));
        let ParamConfig::Detailed(value) = &set.params[1] else {
            panic!("expected a detailed parameter");
        };
        assert_eq!(value.default, Some(json!(3)));
        let spec = value.type_spec.as_ref().unwrap().detail();
        assert_eq!(spec.name, "number");
        assert_eq!(spec.min, Some(0.0));
        assert_eq!(spec.max, Some(10.0));
    }

    #[test]
    fn test_type_spec_forms() {
        let bare: TypeSpec = serde_json::from_value(json!("string")).unwrap();
        assert_eq!(bare, TypeSpec::from("string"));
        assert_eq!(bare.detail().name, "string");

        let nested: TypeSpec =
            serde_json::from_value(json!({"name": "array", "subtype": "number"})).unwrap();
        let detail = nested.detail();
        assert_eq!(detail.name, "array");
        assert_eq!(detail.subtype.as_deref().map(TypeSpec::name), Some("number"));
    }
}
