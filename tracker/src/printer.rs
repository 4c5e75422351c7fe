//! Stateful incremental rendering of the step tree.
//!
//! The printer diffs each new step's ancestor path against the history store
//! and a stack of currently open ancestor labels. Only ancestors that changed
//! since the previous step are printed; ancestors already on screen instead
//! deepen the indentation shift. Ancestors stay open across step boundaries
//! until superseded by a later step's diff.

use crate::core::calltree::CallNode;
use crate::history::History;
use crate::meta::{MetaStepArena, MetaStepId};
use crate::step::Step;

/// Indentation applied to every step line before ancestor shifts.
pub const BASE_STEP_SHIFT: usize = 3;

/// Destination for rendered lines. Terminal styling and truncation are sink
/// concerns; the printer only decides *what* to print.
pub trait OutputSink {
    /// A concrete step line.
    fn step_line(&mut self, text: &str);
    /// An ancestor (MetaStep) label line.
    fn meta_line(&mut self, text: &str);
    /// A plain reporter line (banners, results, summaries).
    fn plain_line(&mut self, text: &str);
    /// Cursor rewind before overwriting a line; no-op unless the sink
    /// supports it.
    fn rewind(&mut self) {}
}

/// Sink that drops everything; used by inspection tooling that only wants
/// the side effects of a replay.
#[derive(Debug, Default)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn step_line(&mut self, _text: &str) {}
    fn meta_line(&mut self, _text: &str) {}
    fn plain_line(&mut self, _text: &str) {}
}

/// Output detail levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    #[default]
    Minimal,
    Steps,
    Debug,
    Verbose,
}

impl Verbosity {
    pub fn level(self) -> u8 {
        match self {
            Verbosity::Minimal => 0,
            Verbosity::Steps => 1,
            Verbosity::Debug => 2,
            Verbosity::Verbose => 3,
        }
    }

    pub fn shows_steps(self) -> bool {
        self >= Verbosity::Steps
    }
}

/// Rendering mode. `Actor` suppresses ancestor-chain printing entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputStyle {
    #[default]
    Tree,
    Actor,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PrinterConfig {
    pub verbosity: Verbosity,
    pub style: OutputStyle,
}

/// The incremental tree printer.
pub struct TreePrinter {
    config: PrinterConfig,
    /// Open ancestor labels, most-recent-first. A key appears at most once.
    open: Vec<String>,
    shift: usize,
}

impl TreePrinter {
    pub fn new(config: PrinterConfig) -> Self {
        Self {
            config,
            open: Vec::new(),
            shift: 0,
        }
    }

    /// Currently open ancestor keys, most-recent-first.
    pub fn open_ancestors(&self) -> &[String] {
        &self.open
    }

    /// Forget all open ancestors; called when a test starts.
    pub fn test_started(&mut self) {
        self.open.clear();
        self.shift = 0;
    }

    /// Render a step and whatever ancestor context came into view with it.
    pub fn step_started(
        &mut self,
        step: &Step,
        arena: &MetaStepArena,
        history: &History,
        sink: &mut dyn OutputSink,
    ) {
        self.shift = BASE_STEP_SHIFT;

        if let Some(meta) = step.meta_step {
            if arena.is_within(meta) {
                self.print_default_meta_chain(meta, arena, sink);
            }
        }
        if self.config.style != OutputStyle::Actor {
            self.print_tracked_ancestors(step, history, sink);
        }
        self.emit(step, sink);
    }

    /// Close the step's frame. The open-ancestor stack is untouched:
    /// ancestors remain open until superseded by the next step's diff.
    pub fn step_finished(&mut self, _step: &Step) {
        self.shift = 0;
    }

    /// Print a `within`-style MetaStep chain, outermost first, skipping any
    /// label already open.
    fn print_default_meta_chain(
        &mut self,
        id: MetaStepId,
        arena: &MetaStepArena,
        sink: &mut dyn OutputSink,
    ) {
        let label = arena.label(id);
        if self.open.iter().any(|key| key == &label) {
            return;
        }
        if let Some(parent) = arena.parent(id) {
            self.print_default_meta_chain(parent, arena, sink);
        }
        self.open.insert(0, label.clone());
        sink.meta_line(&format!("{}{}", " ".repeat(self.shift), label));
    }

    /// Diff the step's ancestor path against history and the open stack.
    fn print_tracked_ancestors(
        &mut self,
        step: &Step,
        history: &History,
        sink: &mut dyn OutputSink,
    ) {
        let display = display_path(&step.call_tree, self.config.verbosity);
        let mut cursor = history.get();
        for call in display {
            let Some(node) = cursor.get(&call.id) else {
                // The ancestor at this level is gone from history: collapse
                // one open entry and stop descending. Single-pop per
                // mismatch; multi-level jumps may leave stale ancestors
                // open until later steps supersede them.
                if !self.open.is_empty() {
                    self.open.remove(0);
                }
                break;
            };
            let key = call.id.to_string();
            if !self.open.iter().any(|open| open == &key) {
                self.open.insert(0, key);
                if let Some(description) = &node.description {
                    sink.meta_line(&format!(
                        "{}{}{}",
                        " ".repeat(self.shift),
                        step.session_prefix,
                        description
                    ));
                }
            } else {
                self.shift += 2;
            }
            cursor = &node.children;
        }
    }

    fn emit(&mut self, step: &Step, sink: &mut dyn OutputSink) {
        let text = format!(
            "{}{}{}",
            " ".repeat(self.shift),
            step.session_prefix,
            step
        );
        sink.step_line(text.trim_end());
    }
}

/// Which part of the call tree is shown as ancestor context.
///
/// The final node is the step itself and is always printed separately; below
/// debug verbosity only the outermost ancestor is announced.
fn display_path(call_tree: &[CallNode], verbosity: Verbosity) -> &[CallNode] {
    let ancestors = &call_tree[..call_tree.len().saturating_sub(1)];
    if verbosity < Verbosity::Debug {
        &ancestors[..ancestors.len().min(1)]
    } else {
        ancestors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::RunScope;
    use crate::test_support::{RecordingSink, frame, json_arg};
    use crate::value::StepArg;

    fn config(verbosity: Verbosity) -> PrinterConfig {
        PrinterConfig {
            verbosity,
            style: OutputStyle::Tree,
        }
    }

    fn tracked_step(scope: &mut RunScope, name: &str, line: u32, args: Vec<StepArg>) -> Step {
        let mut step = Step::new(name, vec![frame("Proxy.step", "pages/login.js", line, 5)]);
        step.set_args(args);
        scope.track_step(&mut step);
        step
    }

    fn open_login_submit(scope: &mut RunScope, line: u32) {
        scope.open_meta(
            "Login",
            "submit",
            vec![json_arg("a@b.com")],
            &[frame("Proxy.submit", "login_test.js", line, 3)],
            None,
        );
    }

    /// Ancestor label is printed once; a sibling step under the same
    /// ancestor only deepens the shift.
    #[test]
    fn ancestor_printed_once_then_shift_deepens() {
        let mut scope = RunScope::new();
        let mut printer = TreePrinter::new(config(Verbosity::Steps));
        let mut sink = RecordingSink::default();
        printer.test_started();

        open_login_submit(&mut scope, 8);
        let fill = tracked_step(&mut scope, "fillField", 12, vec![json_arg("Email")]);
        printer.step_started(&fill, &scope.arena, &scope.history, &mut sink);
        printer.step_finished(&fill);

        let click = tracked_step(&mut scope, "click", 13, vec![json_arg("Submit")]);
        printer.step_started(&click, &scope.arena, &scope.history, &mut sink);
        printer.step_finished(&click);

        assert_eq!(
            sink.lines,
            vec![
                "   Login: submit \"a@b.com\"",
                "   I fill field \"Email\"",
                "     I click \"Submit\"",
            ]
        );
        let announced = sink
            .meta_lines
            .iter()
            .filter(|line| line.contains("Login: submit"))
            .count();
        assert_eq!(announced, 1);
    }

    /// The open stack never holds the same key twice.
    #[test]
    fn open_stack_has_no_duplicates() {
        let mut scope = RunScope::new();
        let mut printer = TreePrinter::new(config(Verbosity::Steps));
        let mut sink = RecordingSink::default();
        printer.test_started();

        open_login_submit(&mut scope, 8);
        for line in 12..18 {
            let step = tracked_step(&mut scope, "click", line, Vec::new());
            printer.step_started(&step, &scope.arena, &scope.history, &mut sink);
            printer.step_finished(&step);

            let mut sorted = printer.open_ancestors().to_vec();
            sorted.sort();
            sorted.dedup();
            assert_eq!(sorted.len(), printer.open_ancestors().len());
        }
    }

    /// A second call to the same page-object method at a new call site
    /// announces the ancestor again.
    #[test]
    fn new_call_site_reannounces_ancestor() {
        let mut scope = RunScope::new();
        let mut printer = TreePrinter::new(config(Verbosity::Steps));
        let mut sink = RecordingSink::default();
        printer.test_started();

        open_login_submit(&mut scope, 8);
        let first = tracked_step(&mut scope, "fillField", 12, Vec::new());
        printer.step_started(&first, &scope.arena, &scope.history, &mut sink);
        printer.step_finished(&first);

        open_login_submit(&mut scope, 30);
        let second = tracked_step(&mut scope, "fillField", 12, Vec::new());
        printer.step_started(&second, &scope.arena, &scope.history, &mut sink);
        printer.step_finished(&second);

        let announced = sink
            .meta_lines
            .iter()
            .filter(|line| line.contains("Login: submit"))
            .count();
        assert_eq!(announced, 2);
    }

    #[test]
    fn actor_style_suppresses_ancestors() {
        let mut scope = RunScope::new();
        let mut printer = TreePrinter::new(PrinterConfig {
            verbosity: Verbosity::Steps,
            style: OutputStyle::Actor,
        });
        let mut sink = RecordingSink::default();
        printer.test_started();

        open_login_submit(&mut scope, 8);
        let step = tracked_step(&mut scope, "fillField", 12, Vec::new());
        printer.step_started(&step, &scope.arena, &scope.history, &mut sink);

        assert!(sink.meta_lines.is_empty());
        assert_eq!(sink.step_lines.len(), 1);
    }

    /// Below debug verbosity only the outermost ancestor is announced.
    #[test]
    fn verbosity_truncates_ancestor_depth() {
        let mut scope = RunScope::new();
        let mut sink = RecordingSink::default();
        let mut printer = TreePrinter::new(config(Verbosity::Steps));
        printer.test_started();

        // Build a three-level path: boundary → page object → step.
        let mut step = Step::new(
            "click",
            vec![
                frame("Proxy.click", "pages/login.js", 12, 5),
                frame("Object.submit", "login_test.js", 8, 3),
                frame("Scenario", "login_test.js", 4, 1),
            ],
        );
        scope.track_step(&mut step);
        assert_eq!(step.call_tree.len(), 3);

        printer.step_started(&step, &scope.arena, &scope.history, &mut sink);
        // Only the boundary level was walked; the page-object level would
        // have been announced too at debug verbosity.
        assert_eq!(printer.open_ancestors().len(), 1);

        let mut debug_printer = TreePrinter::new(config(Verbosity::Debug));
        let mut debug_sink = RecordingSink::default();
        debug_printer.test_started();
        debug_printer.step_started(&step, &scope.arena, &scope.history, &mut debug_sink);
        assert_eq!(debug_printer.open_ancestors().len(), 2);
    }

    /// An ancestor missing from history pops exactly one open entry.
    #[test]
    fn missing_history_level_pops_single_entry() {
        let scope = RunScope::new();
        let mut printer = TreePrinter::new(config(Verbosity::Steps));
        let mut sink = RecordingSink::default();
        printer.test_started();
        printer.open.insert(0, "stale-inner".to_string());
        printer.open.insert(0, "stale-outer".to_string());

        // A step whose single ancestor was never merged into history.
        let mut step = Step::new(
            "click",
            vec![
                frame("Proxy.click", "pages/login.js", 12, 5),
                frame("Object.submit", "login_test.js", 8, 3),
            ],
        );
        step.call_tree = crate::core::calltree::build_path(
            &[
                frame("Object.submit", "login_test.js", 8, 3),
                frame("Proxy.click", "pages/login.js", 12, 5),
            ],
            &[],
            scope.classifier(),
        );

        printer.step_started(&step, &scope.arena, &scope.history, &mut sink);
        assert_eq!(printer.open_ancestors(), ["stale-inner"]);
    }

    /// A `within` MetaStep prints its default chain outer-first, once.
    #[test]
    fn within_chain_prints_outer_first_and_skips_open_labels() {
        let mut scope = RunScope::new();
        let mut printer = TreePrinter::new(config(Verbosity::Steps));
        let mut sink = RecordingSink::default();
        printer.test_started();

        let outer = scope.arena.insert("When", "user logs in", Vec::new(), None);
        let within = scope
            .arena
            .insert("Within", ".modal", Vec::new(), Some(outer));

        let mut step = Step::new("click", vec![frame("Proxy.click", "login.js", 5, 2)]);
        step.meta_step = Some(within);
        scope.track_step(&mut step);

        printer.step_started(&step, &scope.arena, &scope.history, &mut sink);
        let chain: Vec<&String> = sink.meta_lines.iter().collect();
        assert_eq!(chain.len(), 2);
        assert!(chain[0].contains("When user logs in"));
        assert!(chain[1].contains("Within .modal"));

        // Re-entry is idempotent: nothing new printed for the same chain.
        let mut second = Step::new("see", vec![frame("Proxy.see", "login.js", 6, 2)]);
        second.meta_step = Some(within);
        scope.track_step(&mut second);
        let before = sink.meta_lines.len();
        printer.step_started(&second, &scope.arena, &scope.history, &mut sink);
        assert_eq!(sink.meta_lines.len(), before);
    }
}
