//! Explicit per-run state: history, MetaStep arena, event channel.
//!
//! Everything the builder and printer share lives here and is passed by
//! reference; there is no ambient global state. `reset` clears the scope at
//! run boundaries so independent runs sharing a process never see each
//! other's call sites.

use crate::core::calltree::build_path;
use crate::core::classifier::{DefaultFrameClassifier, FrameClassifier};
use crate::core::frame::Frame;
use crate::error::StepError;
use crate::events::Dispatcher;
use crate::history::History;
use crate::meta::{MetaStepArena, MetaStepId};
use crate::step::{Step, StepStatus};
use crate::value::StepArg;

pub struct RunScope {
    pub history: History,
    pub arena: MetaStepArena,
    /// When set, `Step::run` returns stubs without invoking helpers.
    pub dry_run: bool,
    dispatcher: Dispatcher,
    classifier: Box<dyn FrameClassifier>,
}

impl RunScope {
    pub fn new() -> Self {
        Self::with_classifier(Box::new(DefaultFrameClassifier))
    }

    pub fn with_classifier(classifier: Box<dyn FrameClassifier>) -> Self {
        Self {
            history: History::new(),
            arena: MetaStepArena::new(),
            dry_run: false,
            dispatcher: Dispatcher::new(),
            classifier,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn classifier(&self) -> &dyn FrameClassifier {
        self.classifier.as_ref()
    }

    /// Announce a freshly created step (tagging it with the innermost active
    /// MetaStep, if any) and record its call tree.
    pub fn track_step(&mut self, step: &mut Step) {
        self.dispatcher.emit_step_created(step);
        step.set_call_tree(self.classifier.as_ref(), &mut self.history);
    }

    /// Create a MetaStep record and track its grouping call site: the path is
    /// merged into history with the MetaStep's rendering on its final node
    /// and remembered as the last page-object path for seeding.
    pub fn open_meta(
        &mut self,
        actor: &str,
        name: &str,
        args: Vec<StepArg>,
        frames: &[Frame],
        parent: Option<MetaStepId>,
    ) -> MetaStepId {
        let id = self.arena.insert(actor, name, args, parent);
        let mut reversed = frames.to_vec();
        reversed.reverse();
        let mut path = build_path(
            &reversed,
            self.history.last_page_object(),
            self.classifier.as_ref(),
        );
        if let Some(last) = path.last_mut() {
            last.step = Some(self.arena.get(id).summary());
        }
        self.history.insert(&path);
        if !path.is_empty() {
            self.history.record_page_object(&path);
        }
        id
    }

    /// Run a grouping action.
    ///
    /// Marks the MetaStep queued, tags every step created during `f` with it
    /// (the tagging listener is released on every exit path via its drop
    /// guard), and swallows a failing `f` into the MetaStep's own status:
    /// callers see `None`, never the underlying error. The MetaStep's final
    /// status otherwise derives from its children's propagation.
    pub fn run_meta<T>(
        &mut self,
        actor: &str,
        name: &str,
        args: Vec<StepArg>,
        frames: &[Frame],
        parent: Option<MetaStepId>,
        f: impl FnOnce(&mut RunScope) -> Result<T, StepError>,
    ) -> (MetaStepId, Option<T>) {
        let id = self.open_meta(actor, name, args, frames, parent);
        self.arena.set_status(id, StepStatus::Queued);
        self.arena.mark_started(id);
        let _tagging = self
            .dispatcher
            .on_step_created(move |step| step.meta_step = Some(id));
        let result = f(self);
        self.arena.mark_finished(id);
        match result {
            Ok(value) => (id, Some(value)),
            Err(_) => {
                self.arena.set_status(id, StepStatus::Failed);
                (id, None)
            }
        }
    }

    /// Clear all run-scoped state at a run boundary.
    pub fn reset(&mut self) {
        tracing::debug!(metas = self.arena.len(), "resetting run scope");
        self.history.reset();
        self.arena.clear();
    }
}

impl Default for RunScope {
    fn default() -> Self {
        Self::new()
    }
}
