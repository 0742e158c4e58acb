//! Request payload checks.
//!
//! Payloads arrive as loosely typed JSON. Every operation first checks the fields
//! it needs with [`validate`] (one call per nesting level, results concatenated)
//! and only then decodes the payload into its typed parameter struct with
//! [`checked`]. A failed check is not an error: it is answered with
//! [`Reply::Rejected`], which serializes as `{"error": [...]}`.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::fmt;

/// Primitive shape a field must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Integer,
    Double,
    /// Integer or double
    Number,
    String,
    Boolean,
    Array,
    Object,
}

impl ParamType {
    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Double => value.is_f64(),
            Self::Number => value.is_number(),
            Self::String => value.is_string(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Double => "double",
            Self::Number => "number",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Name of the runtime type of a JSON value, in the vocabulary of [`ParamType`].
#[must_use]
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "double",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Field lookup that treats JSON `null` like an absent key.
#[must_use]
pub fn field<'a>(payload: &'a Value, name: &str) -> Option<&'a Value> {
    payload.get(name).filter(|v| !v.is_null())
}

/// Check that every required field is present with the required shape.
///
/// Returns one message per violated field; an empty list means the payload is
/// acceptable. Fields not listed are ignored. A payload that is not an object has
/// none of its fields set.
#[must_use]
pub fn validate(required: &[(&str, ParamType)], payload: &Value) -> Vec<String> {
    let mut errors = Vec::new();
    for &(name, expected) in required {
        match field(payload, name) {
            None => errors.push(format!("Param {name} not set")),
            Some(value) if !expected.matches(value) => errors.push(mismatch(name, expected, value)),
            Some(_) => {}
        }
    }
    errors
}

/// Like [`validate`], but absent fields are fine.
#[must_use]
pub fn validate_optional(optional: &[(&str, ParamType)], payload: &Value) -> Vec<String> {
    optional
        .iter()
        .filter_map(|&(name, expected)| {
            field(payload, name)
                .filter(|value| !expected.matches(value))
                .map(|value| mismatch(name, expected, value))
        })
        .collect()
}

fn mismatch(name: &str, expected: ParamType, value: &Value) -> String {
    format!(
        "Param {name} has not type {expected}, but type {}",
        type_name(value)
    )
}

/// Turn the collected messages into typed parameters.
///
/// Decoding only runs on a payload that passed validation; a failure at that point
/// (an id outside the 32 bit range, for instance) is reported as one more message.
///
/// # Errors
///
/// Returns the messages when there are any, or the decoding failure.
pub fn checked<T: DeserializeOwned>(errors: Vec<String>, payload: &Value) -> Result<T, Vec<String>> {
    if !errors.is_empty() {
        return Err(errors);
    }
    T::deserialize(payload).map_err(|e| vec![format!("Invalid parameters: {e}")])
}

/// Outcome of an operation that validates its input.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reply<T> {
    Done(T),
    Rejected { error: Vec<String> },
}

impl<T> Reply<T> {
    #[must_use]
    pub fn rejected(error: Vec<String>) -> Self {
        Self::Rejected { error }
    }

    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    /// The successful value, if any.
    #[must_use]
    pub fn done(self) -> Option<T> {
        match self {
            Self::Done(value) => Some(value),
            Self::Rejected { .. } => None,
        }
    }

    /// Validation messages, empty on success.
    #[must_use]
    pub fn errors(&self) -> &[String] {
        match self {
            Self::Done(_) => &[],
            Self::Rejected { error } => error,
        }
    }
}
