// src/core/types/union.rs

use super::{ParseContext, Type, TypeError, TypeKind, Types, selection::DeferredLookup};
use crate::{
    core::{
        argument::Argument,
        conversion::{Conversion, Prediction, Status},
    },
    models::TypeSpecDetail,
};
use serde_json::{Map, Value};
use std::{collections::HashSet, sync::Arc};

/// Tries several types in order. Values are tagged with the winning type:
/// `{"type": "number", "number": 3}`.
#[derive(Debug, Clone)]
pub struct UnionType {
    alternatives: Vec<Arc<dyn Type>>,
}

impl UnionType {
    pub fn new(alternatives: Vec<Arc<dyn Type>>) -> Self {
        Self { alternatives }
    }

    pub fn from_spec(spec: &TypeSpecDetail, types: &Types) -> Result<Self, TypeError> {
        let specs = spec
            .alternatives
            .as_ref()
            .filter(|alternatives| !alternatives.is_empty())
            .ok_or_else(|| TypeError::MissingField {
                name: spec.name.clone(),
                field: "alternatives",
            })?;
        let alternatives = specs
            .iter()
            .map(|alternative| types.get_type(alternative))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(alternatives))
    }

    fn tag(name: &str, value: Value) -> Value {
        if value.is_null() {
            return Value::Null;
        }
        let mut tagged = Map::new();
        tagged.insert("type".to_string(), Value::String(name.to_string()));
        tagged.insert(name.to_string(), value);
        Value::Object(tagged)
    }

    /// Takes predictions from each alternative in turn, skipping duplicates.
    fn interleave(lists: Vec<Vec<Prediction>>, max: usize) -> Vec<Prediction> {
        let mut seen = HashSet::new();
        let mut merged = Vec::new();
        let mut iters: Vec<_> = lists.into_iter().map(Vec::into_iter).collect();
        let mut exhausted = false;
        while !exhausted && merged.len() < max {
            exhausted = true;
            for iter in &mut iters {
                if let Some(prediction) = iter.next() {
                    exhausted = false;
                    if seen.insert(prediction.name.clone()) && merged.len() < max {
                        merged.push(prediction);
                    }
                }
            }
        }
        merged
    }
}

impl Type for UnionType {
    fn name(&self) -> &str {
        "union"
    }

    fn kind(&self) -> TypeKind {
        TypeKind::Other
    }

    fn parse(&self, arg: &Argument, ctx: &ParseContext) -> Conversion {
        let mut winner: Option<(&str, Conversion)> = None;
        let mut first_message = String::new();
        let mut predictions = Vec::new();

        for alternative in &self.alternatives {
            let conversion = alternative.parse(arg, ctx);
            predictions.push(conversion.predictions.clone());
            if winner.is_none() {
                if conversion.status() == Status::Error {
                    if first_message.is_empty() {
                        first_message = conversion.message.clone();
                    }
                } else {
                    winner = Some((alternative.name(), conversion));
                }
            }
        }

        let predictions = Self::interleave(predictions, ctx.max_predictions);
        match winner {
            Some((name, conversion)) => {
                let status = conversion.status();
                Conversion::new(
                    Self::tag(name, conversion.value),
                    arg.clone(),
                    status,
                    conversion.message,
                    predictions,
                )
            }
            None => Conversion::new(Value::Null, arg.clone(), Status::Error, first_message, predictions),
        }
    }

    fn stringify(&self, value: &Value, ctx: &ParseContext) -> String {
        let Some(name) = value.get("type").and_then(Value::as_str) else {
            return String::new();
        };
        self.alternatives
            .iter()
            .find(|alternative| alternative.name() == name)
            .map(|alternative| alternative.stringify(value.get(name).unwrap_or(&Value::Null), ctx))
            .unwrap_or_default()
    }

    fn pending_lookups(&self, ctx: &ParseContext) -> Vec<DeferredLookup> {
        self.alternatives
            .iter()
            .flat_map(|alternative| alternative.pending_lookups(ctx))
            .collect()
    }
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Lookup, NumberType, SelectionType, StringType};
    use serde_json::json;

    fn union() -> UnionType {
        let selection = SelectionType::from_lookup(vec![
            Lookup::new("one", json!(1)),
            Lookup::new("two", json!(2)),
        ]);
        UnionType::new(vec![
            Arc::new(selection),
            Arc::new(NumberType::new()),
            Arc::new(StringType),
        ])
    }

    fn parse(text: &str) -> Conversion {
        union().parse(&Argument::new(text, "", ""), &ParseContext::default())
    }

    #[test]
    fn test_falls_through_to_string() {
        let conversion = parse("three");
        assert_eq!(conversion.status(), Status::Valid);
        assert_eq!(conversion.value, json!({"type": "string", "string": "three"}));
    }

    #[test]
    fn test_first_alternative_wins() {
        assert_eq!(parse("two").value, json!({"type": "selection", "selection": 2}));
        assert_eq!(parse("7").value, json!({"type": "number", "number": 7}));
    }

    #[test]
    fn test_incomplete_alternative_wins() {
        let conversion = parse("o");
        assert_eq!(conversion.status(), Status::Incomplete);
        assert!(conversion.value.is_null());
        assert_eq!(conversion.predictions.len(), 1);
        assert_eq!(conversion.predictions[0].name, "one");
    }

    #[test]
    fn test_all_alternatives_failing_is_an_error() {
        let strict = UnionType::new(vec![Arc::new(NumberType::new())]);
        let conversion = strict.parse(&Argument::new("x", "", ""), &ParseContext::default());
        assert_eq!(conversion.status(), Status::Error);
        assert_eq!(conversion.message, "Can't convert 'x' to a number.");
    }

    #[test]
    fn test_stringify_uses_tagged_type() {
        let ctx = ParseContext::default();
        let union = union();
        assert_eq!(union.stringify(&json!({"type": "selection", "selection": 1}), &ctx), "one");
        assert_eq!(union.stringify(&json!({"type": "number", "number": 5}), &ctx), "5");
        assert_eq!(union.stringify(&json!(5), &ctx), "");
    }
}
