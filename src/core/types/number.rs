// src/core/types/number.rs

use super::{ParseContext, Type, TypeError, TypeKind};
use crate::{
    core::{
        argument::Argument,
        conversion::{Conversion, Status},
    },
    models::TypeSpecDetail,
};
use serde_json::{Number, Value};

/// Numbers with optional bounds. Integer-only unless `allow_float` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberType {
    min: Option<f64>,
    max: Option<f64>,
    step: f64,
    allow_float: bool,
}

impl Default for NumberType {
    fn default() -> Self {
        Self {
            min: None,
            max: None,
            step: 1.0,
            allow_float: false,
        }
    }
}

impl NumberType {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn with_max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn with_step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    pub fn allow_float(mut self, allow: bool) -> Self {
        self.allow_float = allow;
        self
    }

    pub fn from_spec(spec: &TypeSpecDetail) -> Result<Self, TypeError> {
        let step = spec.step.unwrap_or(1.0);
        if step <= 0.0 || !step.is_finite() {
            return Err(TypeError::Invalid {
                name: spec.name.clone(),
                reason: format!("step must be a positive number, got {}", step),
            });
        }
        if let (Some(min), Some(max)) = (spec.min, spec.max) {
            if min > max {
                return Err(TypeError::Invalid {
                    name: spec.name.clone(),
                    reason: format!("min ({}) is greater than max ({})", min, max),
                });
            }
        }
        Ok(Self {
            min: spec.min,
            max: spec.max,
            step,
            allow_float: spec.allow_float,
        })
    }

    fn bounds_check(&self, value: f64) -> f64 {
        match (self.min, self.max) {
            (Some(min), _) if value < min => min,
            (_, Some(max)) if value > max => max,
            _ => value,
        }
    }

    /// Whole numbers become JSON integers, anything else a float.
    #[allow(clippy::cast_possible_truncation)]
    fn to_value(&self, number: f64) -> Value {
        if number.fract() == 0.0 && number.abs() < 9.0e15 {
            Value::from(number as i64)
        } else if self.allow_float {
            Number::from_f64(number).map_or(Value::Null, Value::Number)
        } else {
            Value::from(number.round() as i64)
        }
    }

    fn error(arg: &Argument, message: String) -> Conversion {
        Conversion::new(Value::Null, arg.clone(), Status::Error, message, Vec::new())
    }
}

impl Type for NumberType {
    fn name(&self) -> &str {
        "number"
    }

    fn kind(&self) -> TypeKind {
        TypeKind::Number
    }

    /// # Logic:
    /// - Nothing beyond whitespace and an optional `-` -> INCOMPLETE.
    /// - A `.` in integer mode, or anything unparsable -> ERROR.
    /// - Outside `min`/`max` -> ERROR.
    fn parse(&self, arg: &Argument, _ctx: &ParseContext) -> Conversion {
        let text = arg.text();
        let trimmed = text.trim_start();
        if trimmed.strip_prefix('-').unwrap_or(trimmed).is_empty() {
            return Conversion::new(Value::Null, arg.clone(), Status::Incomplete, "", Vec::new());
        }

        if !self.allow_float && text.contains('.') {
            return Self::error(arg, format!("Can't convert '{}' to an integer.", text));
        }

        let parsed = if self.allow_float {
            trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
        } else {
            trimmed.parse::<i64>().ok().map(|n| n as f64)
        };
        let Some(number) = parsed else {
            return Self::error(arg, format!("Can't convert '{}' to a number.", text));
        };

        if let Some(max) = self.max.filter(|max| number > *max) {
            return Self::error(
                arg,
                format!("{} is greater than maximum allowed: {}.", number, max),
            );
        }
        if let Some(min) = self.min.filter(|min| number < *min) {
            return Self::error(
                arg,
                format!("{} is smaller than minimum allowed: {}.", number, min),
            );
        }

        Conversion::valid(self.to_value(number), arg.clone())
    }

    fn stringify(&self, value: &Value, _ctx: &ParseContext) -> String {
        match value {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    fn increment(&self, value: &Value, _ctx: &ParseContext) -> Option<Value> {
        let Some(current) = value.as_f64() else {
            return Some(self.to_value(self.min.unwrap_or(0.0)));
        };
        // Snap to the nearest multiple of the step.
        let next = ((current + self.step) / self.step).floor() * self.step;
        let next = if self.max.is_some() {
            self.bounds_check(next)
        } else {
            next
        };
        Some(self.to_value(next))
    }

    fn decrement(&self, value: &Value, _ctx: &ParseContext) -> Option<Value> {
        let Some(current) = value.as_f64() else {
            return Some(self.to_value(self.max.unwrap_or(1.0)));
        };
        let next = ((current - self.step) / self.step).ceil() * self.step;
        let next = if self.min.is_some() {
            self.bounds_check(next)
        } else {
            next
        };
        Some(self.to_value(next))
    }
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(number: &NumberType, text: &str) -> Conversion {
        number.parse(&Argument::new(text, "", ""), &ParseContext::default())
    }

    #[test]
    fn test_incomplete_inputs() {
        let number = NumberType::new();
        for text in ["", "  ", "-", " -"] {
            assert_eq!(parse(&number, text).status(), Status::Incomplete, "{:?}", text);
        }
    }

    #[test]
    fn test_valid_and_invalid() {
        let number = NumberType::new();
        assert_eq!(parse(&number, "42").value, json!(42));
        assert_eq!(parse(&number, "-7").value, json!(-7));
        assert_eq!(parse(&number, "12abc").status(), Status::Error);
        let float = parse(&number, "1.5");
        assert_eq!(float.status(), Status::Error);
        assert_eq!(float.message, "Can't convert '1.5' to an integer.");
    }

    #[test]
    fn test_floats_when_allowed() {
        let number = NumberType::new().allow_float(true);
        assert_eq!(parse(&number, "1.5").value, json!(1.5));
        assert_eq!(parse(&number, "2.0").value, json!(2));
        assert_eq!(parse(&number, "inf").status(), Status::Error);
    }

    #[test]
    fn test_bounds() {
        let number = NumberType::new().with_min(0.0).with_max(10.0);
        assert_eq!(parse(&number, "10").status(), Status::Valid);
        let high = parse(&number, "11");
        assert_eq!(high.status(), Status::Error);
        assert!(high.message.contains("greater than maximum"));
        assert_eq!(parse(&number, "-1").status(), Status::Error);
    }

    #[test]
    fn test_stepping_snaps_and_clamps() {
        let ctx = ParseContext::default();
        let number = NumberType::new().with_min(0.0).with_max(10.0).with_step(5.0);

        assert_eq!(number.increment(&json!(3), &ctx), Some(json!(5)));
        assert_eq!(number.increment(&json!(10), &ctx), Some(json!(10)));
        assert_eq!(number.decrement(&json!(7), &ctx), Some(json!(5)));
        assert_eq!(number.decrement(&json!(0), &ctx), Some(json!(0)));

        // --- Starting from nothing ---
        assert_eq!(number.increment(&Value::Null, &ctx), Some(json!(0)));
        assert_eq!(number.decrement(&Value::Null, &ctx), Some(json!(10)));
    }

    #[test]
    fn test_unbounded_stepping() {
        let ctx = ParseContext::default();
        let number = NumberType::new();
        assert_eq!(number.increment(&json!(-1), &ctx), Some(json!(0)));
        assert_eq!(number.decrement(&json!(-1), &ctx), Some(json!(-2)));
        assert_eq!(number.decrement(&Value::Null, &ctx), Some(json!(1)));
    }

    #[test]
    fn test_from_spec_rejects_bad_ranges() {
        let spec = TypeSpecDetail {
            name: "number".to_string(),
            min: Some(5.0),
            max: Some(1.0),
            ..Default::default()
        };
        assert!(NumberType::from_spec(&spec).is_err());
    }
}
