// src/core/conversion.rs

use crate::core::argument::{ArgId, Argument};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// How well a piece of input converts. The ordering is meaningful:
/// `Valid < Incomplete < Error`, and combining two statuses keeps the worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Status {
    /// The input converts as typed.
    Valid,
    /// The input could become valid with more characters.
    Incomplete,
    /// The input is invalid as typed.
    Error,
}

impl Status {
    /// Keeps the most severe of the two.
    pub fn combine(self, other: Self) -> Self {
        self.max(other)
    }

    /// Single-character symbol used in status markup strings.
    pub fn symbol(self) -> char {
        match self {
            Self::Valid => 'V',
            Self::Incomplete => 'I',
            Self::Error => 'E',
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Valid => "VALID",
            Self::Incomplete => "INCOMPLETE",
            Self::Error => "ERROR",
        };
        f.write_str(name)
    }
}

/// A ranked candidate completion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// What would be typed.
    pub name: String,
    /// The value the name converts to.
    pub value: Value,
    pub description: Option<String>,
    /// When true, completing with this prediction still expects more input
    /// (e.g. a group command), so no trailing space is added.
    pub incomplete: bool,
}

impl Prediction {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
            description: None,
            incomplete: false,
        }
    }
}

/// The result of converting an argument with a type.
///
/// `value` is `Value::Null` when no value could be determined. When the
/// status is not `Valid` the value must not be relied upon.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub value: Value,
    pub arg: Argument,
    status: Status,
    pub message: String,
    pub predictions: Vec<Prediction>,
    /// Element conversions, for array conversions only.
    elements: Option<Vec<Conversion>>,
}

impl Conversion {
    /// A valid conversion.
    pub fn valid(value: Value, arg: Argument) -> Self {
        Self::new(value, arg, Status::Valid, String::new(), Vec::new())
    }

    pub fn new(
        value: Value,
        arg: Argument,
        status: Status,
        message: impl Into<String>,
        predictions: Vec<Prediction>,
    ) -> Self {
        Self {
            value,
            arg,
            status,
            message: message.into(),
            predictions,
            elements: None,
        }
    }

    /// Composes element conversions. The status is the worst of the elements.
    pub fn array(elements: Vec<Conversion>, arg: Argument) -> Self {
        let status = elements
            .iter()
            .fold(Status::Valid, |acc, c| acc.combine(c.status));
        let value = Value::Array(elements.iter().map(|c| c.value.clone()).collect());
        let message = elements
            .iter()
            .find(|c| !c.message.is_empty())
            .map(|c| c.message.clone())
            .unwrap_or_default();
        Self {
            value,
            arg,
            status,
            message,
            predictions: Vec::new(),
            elements: Some(elements),
        }
    }

    /// The overall status.
    pub fn status(&self) -> Status {
        self.status
    }

    /// The status of the part of this conversion that came from `arg`. For arrays
    /// this is the status of the element the argument belongs to.
    pub fn status_for(&self, arg: ArgId) -> Status {
        self.elements
            .as_ref()
            .and_then(|elements| {
                elements
                    .iter()
                    .find(|c| c.arg.get_args().iter().any(|a| a.id() == arg))
            })
            .map_or(self.status, |c| c.status_for(arg))
    }

    pub fn elements(&self) -> Option<&[Conversion]> {
        self.elements.as_deref()
    }

    pub fn is_array(&self) -> bool {
        self.elements.is_some()
    }

    /// True when the user gave something: a value, or at least some text.
    pub fn is_data_provided(&self) -> bool {
        !self.value.is_null() || !self.arg.text().is_empty()
    }

    pub fn value_equals(&self, other: &Self) -> bool {
        self.value == other.value
    }

    pub fn arg_equals(&self, other: &Self) -> bool {
        self.arg == other.arg
    }

    /// Replaces the argument, keeping everything else.
    pub(crate) fn with_arg(mut self, arg: Argument) -> Self {
        self.arg = arg;
        self
    }
}

impl fmt::Display for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.elements {
            Some(elements) => {
                let parts: Vec<String> = elements.iter().map(Conversion::to_string).collect();
                write!(f, "[ {} ]", parts.join(", "))
            }
            None => write!(f, "{} -> {} ({})", self.arg, self.value, self.status),
        }
    }
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_ordering_and_combine() {
        assert!(Status::Valid < Status::Incomplete);
        assert!(Status::Incomplete < Status::Error);
        assert_eq!(Status::Valid.combine(Status::Incomplete), Status::Incomplete);
        assert_eq!(Status::Error.combine(Status::Valid), Status::Error);
        assert_eq!(Status::Incomplete.to_string(), "INCOMPLETE");
    }

    #[test]
    fn test_array_status_is_worst_element() {
        let ok = Conversion::valid(json!(1), Argument::new("1", " ", ""));
        let bad_arg = Argument::new("x", " ", "");
        let bad_id = bad_arg.id();
        let bad = Conversion::new(Value::Null, bad_arg, Status::Error, "nope", Vec::new());
        let ok_id = ok.arg.id();

        let array = Conversion::array(vec![ok, bad], Argument::array(Vec::new()));
        assert_eq!(array.status(), Status::Error);
        assert_eq!(array.value, json!([1, null]));
        assert_eq!(array.message, "nope");
        assert_eq!(array.status_for(ok_id), Status::Valid);
        assert_eq!(array.status_for(bad_id), Status::Error);
    }

    #[test]
    fn test_empty_array_is_valid() {
        let array = Conversion::array(Vec::new(), Argument::array(Vec::new()));
        assert_eq!(array.status(), Status::Valid);
        assert_eq!(array.value, json!([]));
    }

    #[test]
    fn test_is_data_provided() {
        let blank = Conversion::new(
            Value::Null,
            Argument::blank(),
            Status::Incomplete,
            "",
            Vec::new(),
        );
        assert!(!blank.is_data_provided());

        let typed = Conversion::new(
            Value::Null,
            Argument::new("abc", "", ""),
            Status::Error,
            "",
            Vec::new(),
        );
        assert!(typed.is_data_provided());
    }
}
