//! Step records: one tracked execution of a low-level action.
//!
//! Each command a test performs through the actor object is wrapped in a
//! [`Step`]. The step captures its raw stack at creation; the call tree is
//! computed from it once, merged into history, and never recomputed.

use std::fmt;
use std::time::Instant;

use crate::core::calltree::{CallNode, StepSummary, build_path};
use crate::core::classifier::FrameClassifier;
use crate::core::frame::Frame;
use crate::core::humanize::{humanize, humanize_args};
use crate::error::StepError;
use crate::history::History;
use crate::meta::{MetaStepArena, MetaStepId};
use crate::scope::RunScope;
use crate::value::{StepArg, StepValue, StubValue};

/// Capability provider executing the low-level commands wrapped by steps.
///
/// A step never owns its helper; `run` borrows one for the duration of the
/// call.
pub trait Helper {
    fn name(&self) -> &str;
    fn invoke(&mut self, method: &str, args: &[StepArg]) -> Result<StepValue, StepError>;
}

/// Execution state of a step.
///
/// Legal transitions: `Pending → (Success|Failed)` and
/// `Pending → Queued → (Success|Failed)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Pending,
    Queued,
    Success,
    Failed,
}

impl StepStatus {
    pub fn can_transition(self, next: StepStatus) -> bool {
        matches!(
            (self, next),
            (StepStatus::Pending, StepStatus::Queued)
                | (StepStatus::Pending, StepStatus::Success)
                | (StepStatus::Pending, StepStatus::Failed)
                | (StepStatus::Queued, StepStatus::Success)
                | (StepStatus::Queued, StepStatus::Failed)
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::Queued => "queued",
            StepStatus::Success => "success",
            StepStatus::Failed => "failed",
        }
    }
}

/// One executed command.
#[derive(Debug, Clone)]
pub struct Step {
    /// Label of the performing entity.
    pub actor: String,
    /// Command name shown to humans; may alias the helper method.
    pub name: String,
    /// Helper method actually invoked.
    pub helper_method: String,
    pub status: StepStatus,
    pub args: Vec<StepArg>,
    /// Reconstructed `{id, parent_id}` path; empty until computed.
    pub call_tree: Vec<CallNode>,
    pub prefix: String,
    pub suffix: String,
    pub session_prefix: String,
    pub comment: String,
    /// Back-reference to the grouping action that triggered this step.
    pub meta_step: Option<MetaStepId>,
    pub started_at: Option<Instant>,
    pub finished_at: Option<Instant>,
    raw_trace: Vec<Frame>,
}

impl Step {
    /// Wrap a command, capturing the raw stack as handed over by the
    /// embedding runner (innermost frame first).
    pub fn new(name: &str, raw_trace: Vec<Frame>) -> Self {
        Self {
            actor: "I".to_string(),
            name: name.to_string(),
            helper_method: name.to_string(),
            status: StepStatus::Pending,
            args: Vec::new(),
            call_tree: Vec::new(),
            prefix: String::new(),
            suffix: String::new(),
            session_prefix: String::new(),
            comment: String::new(),
            meta_step: None,
            started_at: None,
            finished_at: None,
            raw_trace,
        }
    }

    /// The captured stack; immutable after capture.
    pub fn raw_trace(&self) -> &[Frame] {
        &self.raw_trace
    }

    pub fn set_args(&mut self, args: Vec<StepArg>) {
        self.args = args;
    }

    /// Compute and record the call-tree path for this step.
    ///
    /// Reverses the captured trace (outermost first), builds the path with
    /// the last known page-object path as seed, annotates the final node with
    /// this step's summary, and merges the path into history. A stack with no
    /// classifiable frames leaves the tree empty and the merge is a no-op.
    pub fn set_call_tree(&mut self, classifier: &dyn FrameClassifier, history: &mut History) {
        let mut frames = self.raw_trace.clone();
        frames.reverse();
        let mut path = build_path(&frames, history.last_page_object(), classifier);
        if let Some(last) = path.last_mut() {
            last.step = Some(self.summary());
        }
        history.insert(&path);
        self.call_tree = path;
    }

    /// Execute the wrapped capability.
    ///
    /// Under dry-run the helper is never invoked: the step succeeds
    /// immediately with an inert stub. Otherwise the helper method runs
    /// synchronously; success and failure are recorded on the step (and
    /// propagated through its MetaStep chain) and a failure is re-raised to
    /// the caller.
    pub fn run(
        &mut self,
        helper: &mut dyn Helper,
        scope: &mut RunScope,
        args: Vec<StepArg>,
    ) -> Result<StepValue, StepError> {
        self.args = args;
        self.started_at = Some(Instant::now());
        if scope.dry_run {
            self.set_status(StepStatus::Success, &mut scope.arena);
            self.finished_at = Some(Instant::now());
            return Ok(StepValue::Stub(StubValue));
        }

        let result = helper.invoke(&self.helper_method, &self.args);
        self.finished_at = Some(Instant::now());
        match result {
            Ok(value) => {
                self.set_status(StepStatus::Success, &mut scope.arena);
                Ok(value)
            }
            Err(err) => {
                self.set_status(StepStatus::Failed, &mut scope.arena);
                Err(err)
            }
        }
    }

    /// Record a status, mirroring it onto the MetaStep chain. Transitions
    /// outside the legal set are ignored.
    pub fn set_status(&mut self, status: StepStatus, arena: &mut MetaStepArena) {
        if !self.status.can_transition(status) {
            return;
        }
        self.status = status;
        if let Some(meta) = self.meta_step {
            arena.propagate_status(meta, status);
        }
    }

    pub fn humanize(&self) -> String {
        humanize(&self.name)
    }

    pub fn humanize_args(&self) -> String {
        humanize_args(&self.args)
    }

    pub fn summary(&self) -> StepSummary {
        StepSummary {
            actor: self.actor.clone(),
            name: self.humanize(),
            args: self.humanize_args(),
        }
    }

    /// Machine-replayable rendering: `I.fillField("Email", "a@b.com")`.
    pub fn to_code(&self) -> String {
        format!(
            "{}{}.{}({}){}",
            self.prefix,
            self.actor,
            self.name,
            self.humanize_args(),
            self.suffix
        )
    }

    /// Source location the step originated from: the innermost frame with
    /// file information, with `base_dir` shortened to `.`.
    pub fn line(&self, base_dir: Option<&str>) -> Option<String> {
        self.raw_trace
            .iter()
            .find(|frame| frame.file.is_some())
            .map(|frame| format!("at {}", frame.location(base_dir)))
    }

    /// True iff any MetaStep in this step's chain is a BDD clause.
    pub fn has_bdd_ancestor(&self, arena: &MetaStepArena) -> bool {
        match self.meta_step {
            Some(meta) => arena.chain_has_bdd(meta),
            None => false,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{} {} {}{}",
            self.prefix,
            self.actor,
            self.humanize(),
            self.humanize_args(),
            self.suffix
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{RecordingHelper, frame, json_arg};

    fn traced_step(name: &str) -> Step {
        Step::new(name, vec![frame("Proxy.fillField", "login_test.js", 12, 5)])
    }

    #[test]
    fn status_transition_rules() {
        use StepStatus::*;
        assert!(Pending.can_transition(Queued));
        assert!(Pending.can_transition(Success));
        assert!(Pending.can_transition(Failed));
        assert!(Queued.can_transition(Failed));
        assert!(!Success.can_transition(Failed));
        assert!(!Failed.can_transition(Success));
        assert!(!Queued.can_transition(Queued));
    }

    #[test]
    fn run_invokes_helper_and_records_success() {
        let mut scope = RunScope::new();
        let mut helper = RecordingHelper::succeeding();
        let mut step = traced_step("fillField");

        let value = step
            .run(&mut helper, &mut scope, vec![json_arg("Email")])
            .expect("run");
        assert_eq!(step.status, StepStatus::Success);
        assert_eq!(helper.calls, vec!["fillField".to_string()]);
        assert!(!value.is_stub());
    }

    #[test]
    fn run_marks_failed_and_reraises() {
        let mut scope = RunScope::new();
        let mut helper = RecordingHelper::failing("element not found");
        let mut step = traced_step("click");

        let err = step
            .run(&mut helper, &mut scope, Vec::new())
            .expect_err("expected failure");
        assert_eq!(step.status, StepStatus::Failed);
        assert_eq!(err.to_string(), "element not found");
    }

    /// Dry-run returns a stub without touching the helper; every property
    /// access on the stub yields another stub.
    #[test]
    fn dry_run_returns_stub_and_skips_helper() {
        let mut scope = RunScope::new();
        scope.dry_run = true;
        let mut helper = RecordingHelper::succeeding();
        let mut step = traced_step("grabTextFrom");

        let value = step
            .run(&mut helper, &mut scope, Vec::new())
            .expect("dry run");
        assert!(helper.calls.is_empty());
        assert_eq!(step.status, StepStatus::Success);
        assert!(value.get("anything").get("deeper").is_stub());
        assert_eq!(value.to_string(), "<VALUE>");
    }

    #[test]
    fn set_call_tree_annotates_leaf_with_summary() {
        let mut scope = RunScope::new();
        let mut step = Step::new(
            "fillField",
            vec![
                frame("Proxy.fillField", "login_test.js", 12, 5),
                frame("Scenario", "login_test.js", 4, 1),
            ],
        );
        step.set_args(vec![json_arg("Email")]);
        scope.track_step(&mut step);

        assert_eq!(step.call_tree.len(), 2);
        let leaf = step.call_tree.last().expect("leaf");
        let summary = leaf.step.as_ref().expect("summary");
        assert_eq!(summary.label(), "I fill field \"Email\"");
        assert!(step.call_tree[0].step.is_none());
    }

    #[test]
    fn unclassifiable_trace_leaves_step_usable() {
        let mut scope = RunScope::new();
        let mut step = Step::new("click", vec![frame("processTicks", "internal.js", 1, 1)]);
        scope.track_step(&mut step);

        assert!(step.call_tree.is_empty());
        assert!(scope.history.get().is_empty());
        assert_eq!(step.to_string().trim_end(), "I click");
    }

    #[test]
    fn display_and_to_code_honor_decorations() {
        let mut step = traced_step("fillField");
        step.set_args(vec![json_arg("Email"), json_arg("a@b.com")]);
        step.prefix = "> ".to_string();
        step.suffix = " [1]".to_string();

        assert_eq!(
            step.to_string(),
            "> I fill field \"Email\", \"a@b.com\" [1]"
        );
        assert_eq!(
            step.to_code(),
            "> I.fillField(\"Email\", \"a@b.com\") [1]"
        );
    }

    #[test]
    fn line_reports_innermost_frame_with_base_shortened() {
        let step = Step::new(
            "click",
            vec![
                frame("Proxy.click", "/repo/tests/login_test.js", 12, 5),
                frame("Scenario", "/repo/tests/login_test.js", 4, 1),
            ],
        );
        assert_eq!(
            step.line(Some("/repo")),
            Some("at ./tests/login_test.js:12:5".to_string())
        );
        assert_eq!(Step::new("click", Vec::new()).line(None), None);
    }
}
