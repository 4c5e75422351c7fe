//! Recorded step-event logs and the offline replay driver.
//!
//! A replay log is a JSON-lines file: one lifecycle event per line, validated
//! against an embedded schema on load. Replaying a log drives the full
//! pipeline (step creation, MetaStep attribution, call-tree reconstruction,
//! history merge, incremental printing) exactly as a live run would.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use jsonschema::validator_for;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::frame::Frame;
use crate::error::StepError;
use crate::events::Subscription;
use crate::meta::MetaStepId;
use crate::printer::OutputSink;
use crate::report::Reporter;
use crate::scope::RunScope;
use crate::step::{Step, StepStatus};
use crate::value::StepArg;

const REPLAY_SCHEMA: &str = include_str!("../schemas/replay_log.v1.schema.json");

fn default_actor() -> String {
    "I".to_string()
}

/// One recorded lifecycle event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecordedEvent {
    SuiteStarted {
        name: String,
    },
    TestStarted {
        name: String,
    },
    TestPassed {
        name: String,
    },
    TestFailed {
        name: String,
        #[serde(default)]
        message: String,
    },
    TestPending {
        name: String,
    },
    MetaStarted {
        actor: String,
        name: String,
        #[serde(default)]
        args: Vec<Value>,
        #[serde(default)]
        frames: Vec<Frame>,
    },
    MetaFinished {
        #[serde(default)]
        failed: bool,
    },
    StepExecuted {
        #[serde(default = "default_actor")]
        actor: String,
        name: String,
        #[serde(default)]
        args: Vec<Value>,
        #[serde(default)]
        frames: Vec<Frame>,
        #[serde(default)]
        failed: bool,
    },
    RunEnded,
}

/// Load and validate a replay log (one JSON event per line).
pub fn load_events(path: &Path) -> Result<Vec<RecordedEvent>> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    parse_events(&contents).with_context(|| format!("parse {}", path.display()))
}

/// Parse replay-log contents, validating every line against the schema.
pub fn parse_events(contents: &str) -> Result<Vec<RecordedEvent>> {
    let schema: Value = serde_json::from_str(REPLAY_SCHEMA).context("parse replay schema")?;
    let compiled = validator_for(&schema).map_err(|err| anyhow!("invalid schema: {}", err))?;

    let mut events = Vec::new();
    for (index, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let lineno = index + 1;
        let value: Value = serde_json::from_str(line)
            .with_context(|| format!("line {lineno}: invalid json"))?;
        if !compiled.is_valid(&value) {
            let messages = compiled
                .iter_errors(&value)
                .map(|err| err.to_string())
                .collect::<Vec<_>>();
            return Err(anyhow!(
                "line {lineno}: schema validation failed: {}",
                messages.join("; ")
            ));
        }
        let event: RecordedEvent = serde_json::from_value(value)
            .with_context(|| format!("line {lineno}: unrecognized event"))?;
        events.push(event);
    }
    tracing::debug!(events = events.len(), "parsed replay log");
    Ok(events)
}

/// Totals of one replayed log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub tests: usize,
    pub steps: usize,
}

/// Drive the tracker pipeline over a recorded event stream.
///
/// Open MetaSteps are held as (id, tagging subscription) pairs; dropping the
/// subscription when the meta finishes (or when a new test starts) releases
/// the attribution listener exactly like a live `run_meta` exit would.
pub fn replay<S: OutputSink>(
    events: &[RecordedEvent],
    scope: &mut RunScope,
    reporter: &mut Reporter<S>,
) -> Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();
    let mut open_metas: Vec<(MetaStepId, Subscription)> = Vec::new();

    for event in events {
        match event {
            RecordedEvent::SuiteStarted { name } => reporter.suite_started(name),
            RecordedEvent::TestStarted { name } => {
                summary.tests += 1;
                open_metas.clear();
                reporter.test_started(name);
            }
            RecordedEvent::TestPassed { name } => reporter.test_passed(name),
            RecordedEvent::TestFailed { name, message } => {
                reporter.test_failed(name, StepError::execution(message.clone()));
            }
            RecordedEvent::TestPending { name } => reporter.test_pending(name),
            RecordedEvent::MetaStarted {
                actor,
                name,
                args,
                frames,
            } => {
                let parent = open_metas.last().map(|(id, _)| *id);
                let args = args.iter().cloned().map(StepArg::from).collect();
                let id = scope.open_meta(actor, name, args, frames, parent);
                scope.arena.set_status(id, StepStatus::Queued);
                scope.arena.mark_started(id);
                let tagging = scope
                    .dispatcher()
                    .on_step_created(move |step| step.meta_step = Some(id));
                open_metas.push((id, tagging));
            }
            RecordedEvent::MetaFinished { failed } => {
                let Some((id, _tagging)) = open_metas.pop() else {
                    return Err(anyhow!("meta_finished without an open meta"));
                };
                scope.arena.mark_finished(id);
                if *failed {
                    scope.arena.set_status(id, StepStatus::Failed);
                }
            }
            RecordedEvent::StepExecuted {
                actor,
                name,
                args,
                frames,
                failed,
            } => {
                summary.steps += 1;
                let mut step = Step::new(name, frames.clone());
                step.actor = actor.clone();
                step.set_args(args.iter().cloned().map(StepArg::from).collect());
                scope.track_step(&mut step);
                reporter.step_started(&step, scope);
                let status = if *failed {
                    StepStatus::Failed
                } else {
                    StepStatus::Success
                };
                step.set_status(status, &mut scope.arena);
                reporter.step_finished(&step);
            }
            RecordedEvent::RunEnded => reporter.run_ended(),
        }
    }
    Ok(summary)
}
