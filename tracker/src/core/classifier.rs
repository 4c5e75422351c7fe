//! Frame classification for call-tree reconstruction.
//!
//! The builder never receives an explicit tree; it infers one from frame
//! names. The heuristic lives behind [`FrameClassifier`] so it can be swapped
//! or tightened without touching the builder or the printer.

use crate::core::frame::Frame;

/// Function-name fragments marking a scenario/hook/within/session entry point.
const BOUNDARY_MARKERS: &[&str] = &[
    "Scenario",
    "beforeSuite",
    "before",
    "afterSuite",
    "after",
    "within",
    "session",
];

/// Function-name fragments of the generic call-wrapper shapes produced by
/// proxied actor and page-object invocations.
const GROUPING_MARKERS: &[&str] = &["Proxy", "Object"];

/// Wrapper-shaped names that are iteration helpers or object literals, not
/// grouping calls.
const GROUPING_EXCLUDED_FUNCTIONS: &[&str] = &["Object.keys.map.forEach", "Object.obj."];

/// Frames originating from the dependency-injection container are plumbing,
/// never user-facing grouping calls.
const CONTAINER_FILE_MARKER: &str = "container";

/// Predicates the call-tree builder uses to interpret a raw stack.
pub trait FrameClassifier {
    /// True if the frame marks a test/hook/within/session boundary.
    fn is_boundary(&self, frame: &Frame) -> bool;

    /// True if the frame is a generic wrapped-call site (page-object or actor
    /// proxy invocation).
    fn is_grouping_call(&self, frame: &Frame) -> bool;
}

/// Default vocabulary tuned to the scenario → hook/within → proxy → step
/// stack shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFrameClassifier;

impl FrameClassifier for DefaultFrameClassifier {
    fn is_boundary(&self, frame: &Frame) -> bool {
        let Some(function) = frame.function.as_deref() else {
            return false;
        };
        BOUNDARY_MARKERS
            .iter()
            .any(|marker| function.contains(marker))
    }

    fn is_grouping_call(&self, frame: &Frame) -> bool {
        let Some(function) = frame.function.as_deref() else {
            return false;
        };
        if !GROUPING_MARKERS
            .iter()
            .any(|marker| function.contains(marker))
        {
            return false;
        }
        if GROUPING_EXCLUDED_FUNCTIONS
            .iter()
            .any(|excluded| function.contains(excluded))
        {
            return false;
        }
        match frame.file.as_deref() {
            Some(file) => !file.contains(CONTAINER_FILE_MARKER),
            None => false,
        }
    }
}
