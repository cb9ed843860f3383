// src/core/types/mod.rs

//! Pluggable types: each converts an argument into a typed [`Conversion`] and
//! back into text.
//!
//! Types are created from a [`TypeSpec`] through the [`Types`] registry, so
//! composite types (array, union) can look up the types they wrap by name at
//! construction time.

pub mod array;
pub mod boolean;
pub mod command;
pub mod delegate;
pub mod number;
pub mod selection;
pub mod string;
pub mod union;

use crate::{
    constants::MAX_PREDICTIONS,
    core::{argument::Argument, conversion::Conversion, conversion::Status},
    models::{TypeSpec, TypeSpecDetail},
};
use serde_json::{Map, Value};
use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, PoisonError, RwLock},
};
use thiserror::Error;

pub use array::ArrayType;
pub use boolean::BooleanType;
pub use command::CommandType;
pub use delegate::DelegateType;
pub use number::NumberType;
pub use selection::{DeferredLookup, Lookup, LookupSource, SelectionType};
pub use string::StringType;
pub use union::UnionType;

#[derive(Error, Debug)]
pub enum TypeError {
    #[error("Unknown type '{0}'.")]
    Unknown(String),
    #[error("Type '{name}' requires '{field}' to be set.")]
    MissingField { name: String, field: &'static str },
    #[error("Invalid configuration for type '{name}': {reason}")]
    Invalid { name: String, reason: String },
}

/// The structural families the assignment engine special-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    String,
    Number,
    Boolean,
    Selection,
    Array,
    Command,
    Other,
}

/// What a type may look at while converting.
#[derive(Debug, Clone)]
pub struct ParseContext {
    /// Values of the sibling parameters converted so far, by parameter name.
    pub values: Map<String, Value>,
    /// The cap on predictions per conversion.
    pub max_predictions: usize,
}

impl Default for ParseContext {
    fn default() -> Self {
        Self {
            values: Map::new(),
            max_predictions: MAX_PREDICTIONS,
        }
    }
}

impl ParseContext {
    pub fn with_values(values: Map<String, Value>, max_predictions: usize) -> Self {
        Self {
            values,
            max_predictions,
        }
    }
}

/// A named strategy for converting arguments.
pub trait Type: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn kind(&self) -> TypeKind {
        TypeKind::Other
    }

    /// Converts an argument. Never fails: problems are reported through the
    /// conversion's status and message.
    fn parse(&self, arg: &Argument, ctx: &ParseContext) -> Conversion;

    /// Turns a value back into text that parses to the same value.
    fn stringify(&self, value: &Value, ctx: &ParseContext) -> String;

    /// The next value "up", for steppable types.
    fn increment(&self, _value: &Value, _ctx: &ParseContext) -> Option<Value> {
        None
    }

    /// The next value "down", for steppable types.
    fn decrement(&self, _value: &Value, _ctx: &ParseContext) -> Option<Value> {
        None
    }

    /// The conversion used when nothing was typed for a parameter.
    fn get_blank(&self, _ctx: &ParseContext) -> Conversion {
        Conversion::new(
            Value::Null,
            Argument::blank(),
            Status::Incomplete,
            "",
            Vec::new(),
        )
    }

    /// A default value implied by the type itself (e.g. `false` for booleans).
    fn default_value(&self) -> Option<Value> {
        None
    }

    /// Lookup sources that must be loaded before this type can convert.
    fn pending_lookups(&self, _ctx: &ParseContext) -> Vec<DeferredLookup> {
        Vec::new()
    }
}

/// Builds a type instance from its configuration.
pub type TypeFactory =
    Arc<dyn Fn(&TypeSpecDetail, &Types) -> Result<Arc<dyn Type>, TypeError> + Send + Sync>;

/// Registry of type factories keyed by name.
pub struct Types {
    factories: RwLock<HashMap<String, TypeFactory>>,
}

impl fmt::Debug for Types {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Types")
            .field("names", &self.names())
            .finish()
    }
}

impl Default for Types {
    fn default() -> Self {
        Self::new()
    }
}

impl Types {
    /// A registry with the built-in types.
    pub fn new() -> Self {
        let types = Self::empty();
        types.register_type("string", Arc::new(build_string));
        types.register_type("number", Arc::new(build_number));
        types.register_type("boolean", Arc::new(build_boolean));
        types.register_type("selection", Arc::new(build_selection));
        types.register_type("array", Arc::new(build_array));
        types.register_type("union", Arc::new(build_union));
        types
    }

    /// A registry with nothing registered.
    pub fn empty() -> Self {
        Self {
            factories: RwLock::new(HashMap::new()),
        }
    }

    /// Registers (or replaces) a factory.
    pub fn register_type(&self, name: &str, factory: TypeFactory) {
        let mut factories = self.factories.write().unwrap_or_else(PoisonError::into_inner);
        if factories.insert(name.to_string(), factory).is_some() {
            log::debug!("Type '{}' was re-registered", name);
        }
    }

    /// Registers a ready-made instance under its own name. Useful for types built
    /// from closures (delegates, dynamic selections) so config can refer to them.
    pub fn register_instance(&self, instance: Arc<dyn Type>) {
        let name = instance.name().to_string();
        self.register_type(
            &name,
            Arc::new(move |_: &TypeSpecDetail, _: &Types| Ok(instance.clone())),
        );
    }

    pub fn unregister_type(&self, name: &str) -> bool {
        self.factories
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .is_some()
    }

    /// Sorted names of the registered types.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Creates a type instance from a spec.
    pub fn get_type(&self, spec: &TypeSpec) -> Result<Arc<dyn Type>, TypeError> {
        let detail = spec.detail();
        // Clone the factory out so composite factories can call back in.
        let factory = self
            .factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&detail.name)
            .cloned()
            .ok_or_else(|| TypeError::Unknown(detail.name.clone()))?;
        factory(&detail, self)
    }
}

// --- BUILT-IN FACTORIES ---

fn build_string(_: &TypeSpecDetail, _: &Types) -> Result<Arc<dyn Type>, TypeError> {
    Ok(Arc::new(StringType))
}

fn build_number(spec: &TypeSpecDetail, _: &Types) -> Result<Arc<dyn Type>, TypeError> {
    Ok(Arc::new(NumberType::from_spec(spec)?))
}

fn build_boolean(_: &TypeSpecDetail, _: &Types) -> Result<Arc<dyn Type>, TypeError> {
    Ok(Arc::new(BooleanType::new()))
}

fn build_selection(spec: &TypeSpecDetail, _: &Types) -> Result<Arc<dyn Type>, TypeError> {
    Ok(Arc::new(SelectionType::from_spec(spec)?))
}

fn build_array(spec: &TypeSpecDetail, types: &Types) -> Result<Arc<dyn Type>, TypeError> {
    Ok(Arc::new(ArrayType::from_spec(spec, types)?))
}

fn build_union(spec: &TypeSpecDetail, types: &Types) -> Result<Arc<dyn Type>, TypeError> {
    Ok(Arc::new(UnionType::from_spec(spec, types)?))
}

// MARK: --- UNIT TESTS ---
