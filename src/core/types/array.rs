// src/core/types/array.rs

use super::{ParseContext, Type, TypeError, TypeKind, Types, selection::DeferredLookup};
use crate::{
    core::{
        argument::{Argument, ArgumentKind},
        conversion::{Conversion, Status},
    },
    models::TypeSpecDetail,
};
use serde_json::Value;
use std::sync::Arc;

/// A list of values of one element type, filled from an array argument.
#[derive(Debug, Clone)]
pub struct ArrayType {
    subtype: Arc<dyn Type>,
}

impl ArrayType {
    pub fn new(subtype: Arc<dyn Type>) -> Self {
        Self { subtype }
    }

    pub fn from_spec(spec: &TypeSpecDetail, types: &Types) -> Result<Self, TypeError> {
        let subtype = spec.subtype.as_ref().ok_or_else(|| TypeError::MissingField {
            name: spec.name.clone(),
            field: "subtype",
        })?;
        Ok(Self::new(types.get_type(subtype)?))
    }

    pub fn subtype(&self) -> &Arc<dyn Type> {
        &self.subtype
    }
}

impl Type for ArrayType {
    fn name(&self) -> &str {
        "array"
    }

    fn kind(&self) -> TypeKind {
        TypeKind::Array
    }

    fn parse(&self, arg: &Argument, ctx: &ParseContext) -> Conversion {
        if !matches!(arg.kind(), ArgumentKind::Array(_)) {
            return Conversion::new(
                Value::Null,
                arg.clone(),
                Status::Error,
                "Expected a list of values.",
                Vec::new(),
            );
        }

        let elements: Vec<Conversion> = arg
            .elements()
            .iter()
            .map(|element| self.subtype.parse(element, ctx))
            .collect();
        // Completion works on the element being typed, which is the last one.
        let predictions = elements
            .last()
            .map(|last| last.predictions.clone())
            .unwrap_or_default();

        let mut conversion = Conversion::array(elements, arg.clone());
        conversion.predictions = predictions;
        conversion
    }

    fn stringify(&self, value: &Value, ctx: &ParseContext) -> String {
        match value {
            Value::Array(values) => values
                .iter()
                .map(|v| self.subtype.stringify(v, ctx))
                .collect::<Vec<_>>()
                .join(" "),
            _ => String::new(),
        }
    }

    fn get_blank(&self, _ctx: &ParseContext) -> Conversion {
        Conversion::array(Vec::new(), Argument::array(Vec::new()))
    }

    fn default_value(&self) -> Option<Value> {
        Some(Value::Array(Vec::new()))
    }

    fn pending_lookups(&self, ctx: &ParseContext) -> Vec<DeferredLookup> {
        self.subtype.pending_lookups(ctx)
    }
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::NumberType;
    use serde_json::json;

    fn numbers() -> ArrayType {
        ArrayType::new(Arc::new(NumberType::new()))
    }

    #[test]
    fn test_array_parses_each_element() {
        // --- Setup ---
        let ctx = ParseContext::default();
        let mut arg = Argument::array(Vec::new());
        arg.push(Argument::new("1", " ", ""));
        arg.push(Argument::new("2", " ", ""));

        // --- Execute ---
        let conversion = numbers().parse(&arg, &ctx);

        // --- Assert ---
        assert_eq!(conversion.status(), Status::Valid);
        assert_eq!(conversion.value, json!([1, 2]));
        assert_eq!(conversion.elements().map(<[Conversion]>::len), Some(2));
    }

    #[test]
    fn test_worst_element_wins() {
        let ctx = ParseContext::default();
        let mut arg = Argument::array(Vec::new());
        arg.push(Argument::new("1", " ", ""));
        arg.push(Argument::new("x", " ", ""));
        let conversion = numbers().parse(&arg, &ctx);
        assert_eq!(conversion.status(), Status::Error);
        assert_eq!(conversion.message, "Can't convert 'x' to a number.");
    }

    #[test]
    fn test_non_array_argument_is_an_error() {
        let conversion = numbers().parse(&Argument::new("1", "", ""), &ParseContext::default());
        assert_eq!(conversion.status(), Status::Error);
    }

    #[test]
    fn test_blank_and_stringify() {
        let ctx = ParseContext::default();
        let array = numbers();
        let blank = array.get_blank(&ctx);
        assert_eq!(blank.status(), Status::Valid);
        assert_eq!(blank.value, json!([]));
        assert_eq!(array.stringify(&json!([1, 2, 3]), &ctx), "1 2 3");
    }
}
