//! Test-only helpers: deterministic frames, args, fakes for helper and sink.

use serde_json::Value;

use crate::core::frame::{Frame, SiteId};
use crate::error::StepError;
use crate::printer::OutputSink;
use crate::step::Helper;
use crate::value::{StepArg, StepValue};

/// Create a named frame at a deterministic location.
pub fn frame(function: &str, file: &str, line: u32, column: u32) -> Frame {
    Frame::new(Some(function), Some(file), line, column)
}

/// Site id for a `(file, line)` pair at column 1.
pub fn site(file: &str, line: u32) -> SiteId {
    SiteId::for_frame(&Frame::new(None, Some(file), line, 1))
}

/// JSON step argument.
pub fn json_arg(value: impl Into<Value>) -> StepArg {
    StepArg::Json(value.into())
}

/// Sink recording every emitted line, by kind and in overall order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub lines: Vec<String>,
    pub step_lines: Vec<String>,
    pub meta_lines: Vec<String>,
    pub plain_lines: Vec<String>,
}

impl OutputSink for RecordingSink {
    fn step_line(&mut self, text: &str) {
        self.lines.push(text.to_string());
        self.step_lines.push(text.to_string());
    }

    fn meta_line(&mut self, text: &str) {
        self.lines.push(text.to_string());
        self.meta_lines.push(text.to_string());
    }

    fn plain_line(&mut self, text: &str) {
        self.lines.push(text.to_string());
        self.plain_lines.push(text.to_string());
    }
}

/// Helper fake recording invoked methods and returning a scripted outcome.
pub struct RecordingHelper {
    outcome: Result<StepValue, StepError>,
    pub calls: Vec<String>,
}

impl RecordingHelper {
    pub fn succeeding() -> Self {
        Self {
            outcome: Ok(StepValue::Json(Value::Null)),
            calls: Vec::new(),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            outcome: Err(StepError::execution(message)),
            calls: Vec::new(),
        }
    }
}

impl Helper for RecordingHelper {
    fn name(&self) -> &str {
        "RecordingHelper"
    }

    fn invoke(&mut self, method: &str, _args: &[StepArg]) -> Result<StepValue, StepError> {
        self.calls.push(method.to_string());
        self.outcome.clone()
    }
}
