use crate::errors::ValidationError;
use crate::types::Value;

/// One allowed `(code, label)` pair of a choice field.
#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    pub code: Value,
    pub label: String,
}

impl Choice {
    pub fn new(code: impl Into<Value>, label: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            label: label.into(),
        }
    }
}

/// Accepts any declared code or label and normalizes it to the code.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceValidator {
    pub choices: Vec<Choice>,
}

impl ChoiceValidator {
    pub fn new(choices: Vec<Choice>) -> Self {
        Self { choices }
    }

    pub fn validate(&self, value: Value) -> Result<Value, ValidationError> {
        for choice in &self.choices {
            if value.loose_eq(&choice.code) {
                return Ok(choice.code.clone());
            }
            if value.as_str() == Some(choice.label.as_str()) {
                return Ok(choice.code.clone());
            }
        }
        Err(ValidationError::new("choice", format!("value {value:?} is not allowed")))
    }
}

/// Lower bound on an integer value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinValidator {
    pub min: i64,
}

impl MinValidator {
    pub fn new(min: i64) -> Self {
        Self { min }
    }

    pub fn validate(&self, value: Value) -> Result<Value, ValidationError> {
        let number = value
            .as_i64()
            .ok_or_else(|| ValidationError::new("not_integer", format!("value {value:?} is not an integer")))?;
        if number < self.min {
            return Err(ValidationError::new(
                "min",
                format!("value {number} must be greater than or equal to {}", self.min),
            ));
        }
        Ok(Value::Int(number))
    }
}

/// A validator in a field's chain. Each step may transform the value or reject it.
#[derive(Debug, Clone)]
pub enum Validator {
    Choice(ChoiceValidator),
    Min(MinValidator),
    Custom {
        name: &'static str,
        check: fn(Value) -> Result<Value, ValidationError>,
    },
}

impl Validator {
    pub fn validate(&self, value: Value) -> Result<Value, ValidationError> {
        match self {
            Validator::Choice(choice) => choice.validate(value),
            Validator::Min(min) => min.validate(value),
            Validator::Custom { check, .. } => check(value),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Validator::Choice(_) => "choice",
            Validator::Min(_) => "min",
            Validator::Custom { name, .. } => name,
        }
    }
}

/// Run `value` through every validator in order.
pub fn run_chain(validators: &[Validator], value: Value) -> Result<Value, ValidationError> {
    validators.iter().try_fold(value, |value, validator| validator.validate(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status() -> ChoiceValidator {
        ChoiceValidator::new(vec![Choice::new(0, "enabled"), Choice::new(1, "disabled")])
    }

    #[test]
    fn choice_accepts_code_and_label() {
        assert_eq!(status().validate(Value::Int(1)), Ok(Value::Int(1)));
        assert_eq!(status().validate(Value::from("disabled")), Ok(Value::Int(1)));
        assert_eq!(status().validate(Value::Bool(false)), Ok(Value::Int(0)));
    }

    #[test]
    fn choice_rejects_unknown() {
        let err = status().validate(Value::from("paused")).expect_err("unknown label");
        assert_eq!(err.code, "choice");
        assert!(err.message.contains("paused"));
    }

    #[test]
    fn min_enforces_lower_bound() {
        let min = MinValidator::new(1);
        assert_eq!(min.validate(Value::Int(3)), Ok(Value::Int(3)));
        assert_eq!(min.validate(Value::from("2")), Ok(Value::Int(2)));
        assert_eq!(min.validate(Value::Int(0)).expect_err("below").code, "min");
        assert_eq!(min.validate(Value::from("wide")).expect_err("text").code, "not_integer");
    }

    #[test]
    fn chain_threads_transformed_value() {
        fn upper(value: Value) -> Result<Value, ValidationError> {
            Ok(Value::Text(value.render().to_uppercase()))
        }
        let chain = vec![
            Validator::Custom { name: "upper", check: upper },
            Validator::Choice(ChoiceValidator::new(vec![Choice::new("A", "alpha")])),
        ];
        assert_eq!(run_chain(&chain, Value::from("a")), Ok(Value::from("A")));
    }
}
