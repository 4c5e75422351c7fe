//! Typed failures surfaced by step execution.

use thiserror::Error;

/// Failure raised by an assertion-style command.
///
/// Carries a CLI-formatted message and the original stack; the reporter
/// re-displays the stack with its leading message line stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionError {
    pub message: String,
    pub stack: String,
}

impl AssertionError {
    pub fn new(message: impl Into<String>, stack: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: stack.into(),
        }
    }

    /// Message formatted for terminal display.
    pub fn cli_message(&self) -> &str {
        &self.message
    }

    /// The stack with the leading message line removed, for re-display under
    /// the CLI message.
    pub fn stack_without_message(&self) -> String {
        match self.stack.split_once('\n') {
            Some((_first, rest)) => rest.to_string(),
            None => String::new(),
        }
    }
}

/// Failure outcome of a step's wrapped capability.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StepError {
    #[error("{}", .0.cli_message())]
    Assertion(AssertionError),
    #[error("{0}")]
    Execution(String),
}

impl StepError {
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution(message.into())
    }
}
