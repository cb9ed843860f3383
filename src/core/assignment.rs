// src/core/assignment.rs

use crate::{
    constants::UNASSIGNED_PARAM_NAME,
    core::{
        argument::{ArgId, Argument, ArgumentKind, Slot},
        conversion::{Conversion, Prediction, Status},
        parameters::Parameter,
        types::{Lookup, ParseContext, SelectionType, Type, TypeKind},
    },
};
use serde_json::Value;
use std::sync::Arc;

/// The live binding of one parameter to its current conversion.
#[derive(Debug, Clone)]
pub struct Assignment {
    param: Arc<Parameter>,
    slot: Slot,
    conversion: Conversion,
}

impl Assignment {
    pub fn new(param: Arc<Parameter>, slot: Slot, conversion: Conversion) -> Self {
        let mut assignment = Self {
            param,
            slot,
            conversion,
        };
        assignment.conversion.arg.assign(slot);
        assignment
    }

    /// Catches an argument no parameter claimed. It is never VALID.
    ///
    /// # Logic:
    /// - The exact name of a parameter means it was given twice -> ERROR.
    /// - Other text that looks like a name (`--fo`) is matched against the
    ///   named-only parameters that can still take a value, so it is at
    ///   best INCOMPLETE.
    /// - Anything else is an ERROR.
    pub fn unassigned(arg: Argument, assignments: &[Assignment], index: usize, ctx: &ParseContext) -> Self {
        let lookups = assignments
            .iter()
            .filter(|a| {
                let param = a.param();
                !param.is_positional_allowed()
                    && (a.arg().is_blank_kind() || param.kind() == TypeKind::Array)
            })
            .map(|a| {
                let name = a.param().name();
                Lookup::new(format!("--{}", name), Value::String(name.to_string()))
            })
            .collect();
        let names = SelectionType::from_lookup(lookups).with_name("param");

        let repeated = assignments.iter().find(|a| a.param().is_known_as(arg.text()));
        let conversion = match repeated {
            Some(a) => {
                let message = format!("Parameter '{}' given twice.", a.param().name());
                Conversion::new(Value::Null, arg, Status::Error, message, Vec::new())
            }
            None if arg.text().starts_with('-') => {
                let conversion = names.parse(&arg, ctx);
                if conversion.status() == Status::Valid {
                    Conversion::new(Value::Null, arg, Status::Error, "Too many arguments.", Vec::new())
                } else {
                    conversion
                }
            }
            None => Conversion::new(Value::Null, arg, Status::Error, "Too many arguments.", Vec::new()),
        };
        let param = Parameter::new(UNASSIGNED_PARAM_NAME, Arc::new(names));
        Self::new(Arc::new(param), Slot::Unassigned(index), conversion)
    }

    pub fn param(&self) -> &Arc<Parameter> {
        &self.param
    }

    pub fn slot(&self) -> Slot {
        self.slot
    }

    pub fn conversion(&self) -> &Conversion {
        &self.conversion
    }

    pub fn arg(&self) -> &Argument {
        &self.conversion.arg
    }

    pub fn value(&self) -> &Value {
        &self.conversion.value
    }

    /// The value a command would receive: the converted value, or the
    /// parameter's default when nothing was converted.
    pub fn effective_value(&self) -> Value {
        if self.conversion.value.is_null() {
            self.param.default_value().unwrap_or(Value::Null)
        } else {
            self.conversion.value.clone()
        }
    }

    pub fn message(&self) -> &str {
        &self.conversion.message
    }

    pub(crate) fn set_conversion(&mut self, mut conversion: Conversion) {
        conversion.arg.assign(self.slot);
        self.conversion = conversion;
    }

    /// The status of the whole assignment.
    pub fn status(&self) -> Status {
        self.status_for(None)
    }

    /// The status as seen from one of the assignment's arguments.
    ///
    /// # Logic:
    /// - Required and nothing provided -> INCOMPLETE.
    /// - Optional and left blank -> VALID, even for types where blank input
    ///   is INCOMPLETE (e.g. selections).
    /// - Otherwise the conversion decides.
    pub fn status_for(&self, arg: Option<ArgId>) -> Status {
        if self.param.is_data_required() && !self.conversion.is_data_provided() {
            return Status::Incomplete;
        }
        if !self.param.is_data_required() && self.arg().is_blank_kind() {
            return Status::Valid;
        }
        match arg {
            Some(id) => self.conversion.status_for(id),
            None => self.conversion.status(),
        }
    }

    pub fn predictions(&self) -> &[Prediction] {
        &self.conversion.predictions
    }

    /// The prediction at `index`, wrapping in both directions so repeated
    /// TAB/shift-TAB cycles.
    pub fn prediction_at(&self, index: isize) -> Option<&Prediction> {
        let predictions = self.predictions();
        let len = isize::try_from(predictions.len()).ok().filter(|len| *len > 0)?;
        let wrapped = usize::try_from(index.rem_euclid(len)).ok()?;
        predictions.get(wrapped)
    }

    /// True while the user is still typing the `--name` part of a named
    /// argument (no space typed after the name yet).
    pub fn is_in_name(&self) -> bool {
        match self.arg().kind() {
            ArgumentKind::Named { value: None, .. } => !self.arg().prefix().ends_with(' '),
            _ => false,
        }
    }

    pub fn is_unassigned(&self) -> bool {
        matches!(self.slot, Slot::Unassigned(_))
    }

    pub(crate) fn type_(&self) -> &Arc<dyn Type> {
        self.param.type_()
    }
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{NumberType, StringType};
    use serde_json::json;

    fn number_param(default: Option<i64>) -> Arc<Parameter> {
        let param = Parameter::new("count", Arc::new(NumberType::new()));
        Arc::new(match default {
            Some(d) => param.with_default(json!(d)),
            None => param,
        })
    }

    fn blank(param: &Arc<Parameter>) -> Assignment {
        let conversion = param.type_().get_blank(&ParseContext::default());
        Assignment::new(param.clone(), Slot::Param(0), conversion)
    }

    #[test]
    fn test_required_blank_is_incomplete() {
        let assignment = blank(&number_param(None));
        assert_eq!(assignment.status(), Status::Incomplete);
        assert!(assignment.effective_value().is_null());
    }

    #[test]
    fn test_optional_blank_is_valid_and_defaults() {
        let assignment = blank(&number_param(Some(3)));
        assert_eq!(assignment.status(), Status::Valid);
        assert_eq!(assignment.effective_value(), json!(3));
    }

    #[test]
    fn test_conversion_status_and_owner() {
        let param = number_param(None);
        let conversion = param
            .type_()
            .parse(&Argument::new("x", " ", ""), &ParseContext::default());
        let assignment = Assignment::new(param, Slot::Param(1), conversion);
        assert_eq!(assignment.status(), Status::Error);
        assert_eq!(assignment.arg().owner(), Some(Slot::Param(1)));
    }

    /// Blank assignments for named-only string parameters.
    fn named_only(names: &[&str]) -> Vec<Assignment> {
        names
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let param = Arc::new(
                    Parameter::new(*name, Arc::new(StringType))
                        .with_group("Options")
                        .with_default(json!("")),
                );
                blank_at(&param, index)
            })
            .collect()
    }

    fn blank_at(param: &Arc<Parameter>, index: usize) -> Assignment {
        let conversion = param.type_().get_blank(&ParseContext::default());
        Assignment::new(param.clone(), Slot::Param(index), conversion)
    }

    #[test]
    fn test_unassigned_dash_argument_predicts_names() {
        // --- Setup ---
        let assignments = named_only(&["verbose", "version"]);
        let ctx = ParseContext::default();

        // --- Execute ---
        let partial = Assignment::unassigned(Argument::new("--ver", " ", ""), &assignments, 0, &ctx);
        let stray = Assignment::unassigned(Argument::new("extra", " ", ""), &assignments, 1, &ctx);

        // --- Assert ---
        assert_eq!(partial.status(), Status::Incomplete);
        assert_eq!(partial.predictions().len(), 2);
        assert_eq!(stray.status(), Status::Error);
        assert_eq!(stray.message(), "Too many arguments.");
        assert!(stray.is_unassigned());
    }

    #[test]
    fn test_unassigned_exact_name_is_an_error() {
        // --- Setup ---
        let mut assignments = named_only(&["verbose"]);
        let positional = Arc::new(Parameter::new("file", Arc::new(StringType)));
        assignments.push(blank_at(&positional, 1));
        let ctx = ParseContext::default();

        // --- Execute ---
        let repeated = Assignment::unassigned(Argument::new("--verbose", " ", ""), &assignments, 0, &ctx);
        let partial = Assignment::unassigned(Argument::new("--fi", " ", ""), &assignments, 1, &ctx);

        // --- Assert ---
        assert_eq!(repeated.status(), Status::Error);
        assert_eq!(repeated.message(), "Parameter 'verbose' given twice.");
        assert!(partial.predictions().iter().all(|p| p.name != "--file"));
        assert_ne!(partial.status(), Status::Valid);
    }

    #[test]
    fn test_prediction_at_wraps() {
        let assignments = named_only(&["alpha", "beta"]);
        let assignment =
            Assignment::unassigned(Argument::new("--", "", ""), &assignments, 0, &ParseContext::default());
        assert_eq!(assignment.prediction_at(0).map(|p| p.name.as_str()), Some("--alpha"));
        assert_eq!(assignment.prediction_at(3).map(|p| p.name.as_str()), Some("--beta"));
        assert_eq!(assignment.prediction_at(-1).map(|p| p.name.as_str()), Some("--beta"));
    }

    #[test]
    fn test_is_in_name() {
        let param = number_param(Some(1));
        let dangling = Argument::named(Argument::new("--count", " ", ""), None);
        let conversion = param.type_().parse(&dangling, &ParseContext::default());
        let assignment = Assignment::new(param, Slot::Param(0), conversion);
        assert!(assignment.is_in_name());
    }
}
