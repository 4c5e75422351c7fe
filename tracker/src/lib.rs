//! Step-execution tracking and hierarchical call-tree reconstruction for a
//! test-automation runner.
//!
//! Every action a test performs is wrapped in a [`step::Step`]; grouped
//! invocations (page-object methods, BDD clauses, `within` blocks) are
//! attributed through MetaStep records in [`meta`]. From a live stream of
//! step events plus raw stack traces, the crate:
//!
//! - reconstructs the logical nesting of actions ([`core::calltree`],
//!   driven by the [`core::classifier`] frame heuristic),
//! - persists the nesting as a queryable, run-scoped [`history`], and
//! - renders it incrementally through the diffing [`printer`], printing only
//!   ancestor labels that changed since the previous step.
//!
//! The architecture enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (frames, classification, path
//!   building, rendering). No I/O, fully testable in isolation.
//! - Stateful components ([`history`], [`meta`], [`scope`], [`printer`]) are
//!   explicit objects passed by reference; nothing is process-global.
//! - Side-effecting surfaces ([`report`], [`replay`], the CLI) sit at the
//!   edges.

pub mod config;
pub mod core;
pub mod error;
pub mod events;
pub mod history;
pub mod logging;
pub mod meta;
pub mod printer;
pub mod replay;
pub mod report;
pub mod scope;
pub mod step;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod value;
