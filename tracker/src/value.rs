//! Argument and result values flowing through steps.

use std::fmt;

use serde_json::Value;

/// Fixed rendering for secret-marked argument values.
pub const MASK_TEXT: &str = "*****";

/// Fixed rendering for dry-run stub values.
pub const STUB_PLACEHOLDER: &str = "<VALUE>";

/// A loosely-typed step argument, captured at call time.
#[derive(Debug, Clone, PartialEq)]
pub enum StepArg {
    /// Any plain JSON value (null, bool, number, string, array, object).
    Json(Value),
    /// An argument that was never provided.
    Undefined,
    /// A callback argument, kept as its source text.
    Function(String),
    /// A value carrying its own meaningful text rendering.
    Rendered(String),
    /// A secret-marked value; renders as [`MASK_TEXT`] regardless of content.
    Secret(Box<StepArg>),
}

impl StepArg {
    pub fn secret(inner: StepArg) -> Self {
        Self::Secret(Box::new(inner))
    }

    pub fn is_secret(&self) -> bool {
        matches!(self, Self::Secret(_))
    }
}

impl From<Value> for StepArg {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<&str> for StepArg {
    fn from(value: &str) -> Self {
        Self::Json(Value::String(value.to_string()))
    }
}

/// Inert stand-in returned by dry-run execution.
///
/// Every field access yields another stub, so arbitrarily deep property
/// chains on a dry-run result stay inert; rendering is always the fixed
/// placeholder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StubValue;

impl StubValue {
    pub fn get(self, _field: &str) -> StubValue {
        StubValue
    }
}

impl fmt::Display for StubValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(STUB_PLACEHOLDER)
    }
}

/// Result of running a step: a real helper value or a dry-run stub.
#[derive(Debug, Clone, PartialEq)]
pub enum StepValue {
    Json(Value),
    Stub(StubValue),
}

impl StepValue {
    /// Field access. Objects index into their members (missing → null);
    /// stubs yield stubs; anything else yields null.
    pub fn get(&self, field: &str) -> StepValue {
        match self {
            Self::Stub(stub) => Self::Stub(stub.get(field)),
            Self::Json(Value::Object(map)) => {
                Self::Json(map.get(field).cloned().unwrap_or(Value::Null))
            }
            Self::Json(_) => Self::Json(Value::Null),
        }
    }

    pub fn is_stub(&self) -> bool {
        matches!(self, Self::Stub(_))
    }
}

impl fmt::Display for StepValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(Value::String(text)) => f.write_str(text),
            Self::Json(value) => write!(f, "{value}"),
            Self::Stub(stub) => write!(f, "{stub}"),
        }
    }
}
