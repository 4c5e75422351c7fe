//! Terminal reporter shell around the tree printer.
//!
//! Owns rendering primitives (styling, truncation, cursor rewind), per-test
//! printer reset, pass/fail/pending accounting, and the end-of-run failure
//! listing. Tree reconstruction itself happens elsewhere; this module only
//! consumes the printer and the Step/MetaStep model.

use std::time::{Duration, Instant};

use console::style;

use crate::error::StepError;
use crate::printer::{OutputSink, OutputStyle, PrinterConfig, TreePrinter, Verbosity};
use crate::scope::RunScope;
use crate::step::Step;

/// Recognized output options, from CLI flags or the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReporterOptions {
    pub steps: bool,
    pub debug: bool,
    pub verbose: bool,
    /// Disable cursor rewind before printing test results.
    pub noreverse: bool,
    /// Disable output truncation.
    pub notruncate: bool,
    /// Rendering mode; `"actor"` suppresses ancestor-chain printing.
    pub output_style: Option<String>,
}

impl ReporterOptions {
    pub fn verbosity(&self) -> Verbosity {
        if self.verbose {
            Verbosity::Verbose
        } else if self.debug {
            Verbosity::Debug
        } else if self.steps {
            Verbosity::Steps
        } else {
            Verbosity::Minimal
        }
    }

    pub fn style(&self) -> OutputStyle {
        match self.output_style.as_deref() {
            Some("actor") => OutputStyle::Actor,
            _ => OutputStyle::Tree,
        }
    }
}

/// Active capability providers and plugins, for debug banners.
#[derive(Debug, Clone, Default)]
pub struct ContainerInfo {
    pub helpers: Vec<String>,
    pub plugins: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub passes: usize,
    pub failures: usize,
    pub pending: usize,
}

/// A failed test retained for the end-of-run listing.
#[derive(Debug, Clone)]
pub struct FailedTest {
    pub test: String,
    pub error: StepError,
}

/// Stdout sink with styling, optional truncation and cursor rewind.
pub struct ConsoleSink {
    truncate: bool,
    reverse: bool,
    width: usize,
}

impl ConsoleSink {
    pub fn new(truncate: bool, reverse: bool) -> Self {
        let width = console::Term::stdout()
            .size_checked()
            .map(|(_rows, cols)| cols as usize)
            .unwrap_or(120);
        Self {
            truncate,
            reverse,
            width: width.max(40),
        }
    }

    fn clip(&self, text: &str) -> String {
        if !self.truncate {
            return text.to_string();
        }
        let mut clipped: String = text.chars().take(self.width).collect();
        if clipped.len() < text.len() {
            clipped.push('…');
        }
        clipped
    }
}

impl OutputSink for ConsoleSink {
    fn step_line(&mut self, text: &str) {
        println!("{}", style(self.clip(text)).dim());
    }

    fn meta_line(&mut self, text: &str) {
        println!("{}", style(self.clip(text)).bold());
    }

    fn plain_line(&mut self, text: &str) {
        println!("{text}");
    }

    fn rewind(&mut self) {
        if self.reverse {
            print!("\r");
        }
    }
}

/// Reporter driving the printer from lifecycle notifications.
pub struct Reporter<S: OutputSink> {
    printer: TreePrinter,
    sink: S,
    verbosity: Verbosity,
    stats: RunStats,
    failures: Vec<FailedTest>,
    started: Instant,
}

impl<S: OutputSink> Reporter<S> {
    pub fn new(options: &ReporterOptions, sink: S) -> Self {
        let config = PrinterConfig {
            verbosity: options.verbosity(),
            style: options.style(),
        };
        Self {
            printer: TreePrinter::new(config),
            sink,
            verbosity: options.verbosity(),
            stats: RunStats::default(),
            failures: Vec::new(),
            started: Instant::now(),
        }
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    pub fn sink(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Startup banner; container info is listed at debug verbosity.
    pub fn run_started(&mut self, root: &str, container: Option<&ContainerInfo>) {
        self.started = Instant::now();
        self.sink
            .plain_line(&format!("tracker v{}", env!("CARGO_PKG_VERSION")));
        self.sink.plain_line(&format!("Using test root \"{root}\""));
        if self.verbosity >= Verbosity::Debug {
            if let Some(container) = container {
                self.sink
                    .plain_line(&format!("Helpers: {}", container.helpers.join(", ")));
                self.sink
                    .plain_line(&format!("Plugins: {}", container.plugins.join(", ")));
            }
        }
    }

    pub fn suite_started(&mut self, name: &str) {
        self.sink.plain_line("");
        self.sink.plain_line(name);
    }

    pub fn test_started(&mut self, name: &str) {
        self.printer.test_started();
        if self.verbosity.shows_steps() {
            self.sink.plain_line(&format!("{name} --"));
        }
    }

    pub fn test_passed(&mut self, name: &str) {
        self.stats.passes += 1;
        if !self.verbosity.shows_steps() {
            self.sink.rewind();
        }
        self.sink
            .plain_line(&format!("  {} {}", style("✔").green(), name));
    }

    pub fn test_failed(&mut self, name: &str, error: StepError) {
        self.stats.failures += 1;
        if !self.verbosity.shows_steps() {
            self.sink.rewind();
        }
        self.sink
            .plain_line(&format!("  {} {}", style("✖").red(), name));
        self.failures.push(FailedTest {
            test: name.to_string(),
            error,
        });
    }

    pub fn test_pending(&mut self, name: &str) {
        self.stats.pending += 1;
        if !self.verbosity.shows_steps() {
            self.sink.rewind();
        }
        self.sink
            .plain_line(&format!("  {} {}", style("-").dim(), name));
    }

    pub fn step_started(&mut self, step: &Step, scope: &RunScope) {
        if self.verbosity.shows_steps() {
            self.printer
                .step_started(step, &scope.arena, &scope.history, &mut self.sink);
        }
    }

    pub fn step_finished(&mut self, step: &Step) {
        if self.verbosity.shows_steps() {
            self.printer.step_finished(step);
        }
    }

    /// Print the failure listing and the run summary.
    pub fn run_ended(&mut self) {
        self.sink.plain_line("");
        if !self.failures.is_empty() {
            self.sink.plain_line("-- FAILURES:");
            for (index, failed) in self.failures.iter().enumerate() {
                for line in render_failure(index + 1, failed, self.verbosity) {
                    self.sink.plain_line(&line);
                }
            }
            self.sink.plain_line("");
        }

        let stats = self.stats;
        let summary = format!(
            "  {}, {}, {} // done in {}",
            style(format!("{} passed", stats.passes)).green(),
            style(format!("{} failed", stats.failures)).red(),
            style(format!("{} pending", stats.pending)).yellow(),
            format_duration(self.started.elapsed())
        );
        self.sink.plain_line(&summary);
    }
}

/// Render one failure entry. Assertion failures show their CLI message and
/// the stack with its leading message line stripped; below verbose level the
/// stack gains a hint to raise verbosity. Cosmetic only; the failure value
/// itself stays intact.
fn render_failure(index: usize, failed: &FailedTest, verbosity: Verbosity) -> Vec<String> {
    let (message, mut stack) = match &failed.error {
        StepError::Assertion(assertion) => (
            assertion.cli_message().to_string(),
            assertion.stack_without_message(),
        ),
        StepError::Execution(message) => (message.clone(), String::new()),
    };
    if verbosity < Verbosity::Verbose {
        if !stack.is_empty() {
            stack.push('\n');
        }
        stack.push_str("Run with --verbose flag to see the full stack trace");
    }

    let mut lines = vec![format!("  {index}) {}: {message}", failed.test)];
    for line in stack.lines() {
        lines.push(format!("     {line}"));
    }
    lines
}

/// Humanize a duration: `450ms`, `3s`, `1m 20s`.
fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1_000 {
        return format!("{millis}ms");
    }
    let secs = duration.as_secs();
    if secs < 60 {
        return format!("{secs}s");
    }
    format!("{}m {}s", secs / 60, secs % 60)
}
