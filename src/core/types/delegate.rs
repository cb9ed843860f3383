// src/core/types/delegate.rs

use super::{ParseContext, Type, selection::DeferredLookup};
use crate::core::{
    argument::Argument,
    conversion::{Conversion, Status},
};
use serde_json::Value;
use std::{fmt, sync::Arc};

/// Picks the real type from the values of sibling parameters. Resolvers
/// should hand out shared instances: a deferred selection built afresh on
/// every call is never seen as loaded.
pub type TypeResolver = Arc<dyn Fn(&ParseContext) -> Option<Arc<dyn Type>> + Send + Sync>;

/// A type decided at parse time, e.g. the type of a "value" parameter that
/// depends on which "setting" was chosen before it.
#[derive(Clone)]
pub struct DelegateType {
    name: String,
    resolver: TypeResolver,
}

impl fmt::Debug for DelegateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegateType").field("name", &self.name).finish()
    }
}

impl DelegateType {
    pub fn new(name: impl Into<String>, resolver: TypeResolver) -> Self {
        Self {
            name: name.into(),
            resolver,
        }
    }

    fn resolve(&self, ctx: &ParseContext) -> Option<Arc<dyn Type>> {
        (self.resolver)(ctx)
    }

    fn waiting(arg: Argument) -> Conversion {
        Conversion::new(
            Value::Null,
            arg,
            Status::Incomplete,
            "Waiting for a value this depends on.",
            Vec::new(),
        )
    }
}

impl Type for DelegateType {
    fn name(&self) -> &str {
        &self.name
    }

    fn parse(&self, arg: &Argument, ctx: &ParseContext) -> Conversion {
        match self.resolve(ctx) {
            Some(delegated) => delegated.parse(arg, ctx),
            None => Self::waiting(arg.clone()),
        }
    }

    fn stringify(&self, value: &Value, ctx: &ParseContext) -> String {
        match self.resolve(ctx) {
            Some(delegated) => delegated.stringify(value, ctx),
            None => match value {
                Value::Null => String::new(),
                Value::String(s) => s.clone(),
                other => other.to_string(),
            },
        }
    }

    fn increment(&self, value: &Value, ctx: &ParseContext) -> Option<Value> {
        self.resolve(ctx)?.increment(value, ctx)
    }

    fn decrement(&self, value: &Value, ctx: &ParseContext) -> Option<Value> {
        self.resolve(ctx)?.decrement(value, ctx)
    }

    fn get_blank(&self, ctx: &ParseContext) -> Conversion {
        match self.resolve(ctx) {
            Some(delegated) => delegated.get_blank(ctx),
            None => Self::waiting(Argument::blank()),
        }
    }

    /// Whatever the resolved type still needs. Nothing while unresolved.
    fn pending_lookups(&self, ctx: &ParseContext) -> Vec<DeferredLookup> {
        self.resolve(ctx)
            .map(|delegated| delegated.pending_lookups(ctx))
            .unwrap_or_default()
    }
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{BooleanType, NumberType, SelectionType};
    use serde_json::{Map, json};

    /// Resolves to the type named by the sibling "setting" value.
    fn setting_value() -> DelegateType {
        let resolver: TypeResolver = Arc::new(|ctx: &ParseContext| {
            match ctx.values.get("setting").and_then(Value::as_str) {
                Some("verbose") => Some(Arc::new(BooleanType::new()) as Arc<dyn Type>),
                Some("depth") => Some(Arc::new(NumberType::new()) as Arc<dyn Type>),
                _ => None,
            }
        });
        DelegateType::new("settingValue", resolver)
    }

    fn ctx_with_setting(setting: &str) -> ParseContext {
        let mut values = Map::new();
        values.insert("setting".to_string(), json!(setting));
        ParseContext::with_values(values, 10)
    }

    #[test]
    fn test_resolves_from_sibling_values() {
        let delegate = setting_value();
        let arg = Argument::new("3", "", "");

        let as_number = delegate.parse(&arg, &ctx_with_setting("depth"));
        assert_eq!(as_number.status(), Status::Valid);
        assert_eq!(as_number.value, json!(3));

        let as_boolean = delegate.parse(&arg, &ctx_with_setting("verbose"));
        assert_eq!(as_boolean.status(), Status::Error);
    }

    #[test]
    fn test_unresolved_is_incomplete() {
        let conversion = setting_value().parse(&Argument::new("3", "", ""), &ParseContext::default());
        assert_eq!(conversion.status(), Status::Incomplete);
        assert!(conversion.value.is_null());
    }

    #[test]
    fn test_stepping_is_delegated() {
        let delegate = setting_value();
        let ctx = ctx_with_setting("depth");
        assert_eq!(delegate.increment(&json!(1), &ctx), Some(json!(2)));
        assert_eq!(delegate.increment(&json!(1), &ParseContext::default()), None);
    }

    #[test]
    fn test_pending_lookups_follow_the_resolved_type() {
        // --- Setup ---
        let shades: Arc<dyn Type> = Arc::new(
            SelectionType::from_data(vec!["red".to_string(), "blue".to_string()]).force_deferred(true),
        );
        let resolver: TypeResolver = Arc::new(move |ctx: &ParseContext| {
            match ctx.values.get("setting").and_then(Value::as_str) {
                Some("color") => Some(shades.clone()),
                _ => None,
            }
        });
        let delegate = DelegateType::new("settingValue", resolver);

        // --- Execute & Assert ---
        assert!(delegate.pending_lookups(&ParseContext::default()).is_empty());
        assert_eq!(delegate.pending_lookups(&ctx_with_setting("color")).len(), 1);
    }
}
