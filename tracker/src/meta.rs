//! MetaStep records: grouping actions attributing steps to their trigger.
//!
//! MetaSteps form parent chains (a page-object method inside a BDD clause
//! inside a session block). The chain is stored as an index-based arena:
//! records live in a flat table, parent links are ids, so there are no
//! reference cycles and records stay cheap to inspect in tests.

use std::sync::LazyLock;
use std::time::Instant;

use regex::Regex;

use crate::core::calltree::StepSummary;
use crate::core::humanize::humanize_args;
use crate::step::StepStatus;
use crate::value::StepArg;

static BDD_CLAUSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(Given|When|Then|And)").unwrap());

const WITHIN_PREFIX: &str = "Within";

/// Arena index of a MetaStep record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MetaStepId(usize);

/// One grouping action: a page-object method, a BDD clause, a `within` or
/// session block.
#[derive(Debug, Clone)]
pub struct MetaStepRecord {
    /// Triggering entity label: page-object name, BDD clause text, `Within`.
    pub actor: String,
    /// Action name, rendered verbatim (no camelCase transformation).
    pub name: String,
    pub args: Vec<StepArg>,
    pub status: StepStatus,
    pub parent: Option<MetaStepId>,
    pub started_at: Option<Instant>,
    pub finished_at: Option<Instant>,
}

impl MetaStepRecord {
    /// True if the actor is a BDD clause (`Given`/`When`/`Then`/`And`).
    pub fn is_bdd(&self) -> bool {
        BDD_CLAUSE.is_match(&self.actor)
    }

    /// True if the actor labels a `within` grouping.
    pub fn is_within(&self) -> bool {
        self.actor.starts_with(WITHIN_PREFIX)
    }

    /// Actor text for display: plain for BDD/within labels, `"{actor}:"`
    /// otherwise.
    fn actor_text(&self) -> String {
        if self.is_bdd() || self.is_within() {
            self.actor.clone()
        } else {
            format!("{}:", self.actor)
        }
    }

    /// Concrete rendering used for history descriptions and tree labels.
    pub fn summary(&self) -> StepSummary {
        StepSummary {
            actor: self.actor_text(),
            name: self.name.clone(),
            args: humanize_args(&self.args),
        }
    }
}

/// Flat table of MetaStep records for one run scope.
#[derive(Default)]
pub struct MetaStepArena {
    records: Vec<MetaStepRecord>,
}

impl MetaStepArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        actor: &str,
        name: &str,
        args: Vec<StepArg>,
        parent: Option<MetaStepId>,
    ) -> MetaStepId {
        self.records.push(MetaStepRecord {
            actor: actor.to_string(),
            name: name.to_string(),
            args,
            status: StepStatus::Pending,
            parent,
            started_at: None,
            finished_at: None,
        });
        MetaStepId(self.records.len() - 1)
    }

    pub fn get(&self, id: MetaStepId) -> &MetaStepRecord {
        &self.records[id.0]
    }

    pub fn status(&self, id: MetaStepId) -> StepStatus {
        self.records[id.0].status
    }

    pub fn parent(&self, id: MetaStepId) -> Option<MetaStepId> {
        self.records[id.0].parent
    }

    pub fn is_within(&self, id: MetaStepId) -> bool {
        self.records[id.0].is_within()
    }

    pub fn label(&self, id: MetaStepId) -> String {
        self.records[id.0].summary().label()
    }

    /// Set a record's status directly. Failed is sticky: once a MetaStep
    /// failed it is never flipped back.
    pub fn set_status(&mut self, id: MetaStepId, status: StepStatus) {
        let record = &mut self.records[id.0];
        if record.status != StepStatus::Failed {
            record.status = status;
        }
    }

    /// Mirror a child step's status onto the MetaStep and transitively up the
    /// parent chain, honoring sticky failure at every level.
    pub fn propagate_status(&mut self, id: MetaStepId, status: StepStatus) {
        let mut current = Some(id);
        while let Some(id) = current {
            self.set_status(id, status);
            current = self.records[id.0].parent;
        }
    }

    /// True iff any record in the chain starting at `id` is a BDD clause.
    pub fn chain_has_bdd(&self, id: MetaStepId) -> bool {
        let mut current = Some(id);
        while let Some(id) = current {
            let record = &self.records[id.0];
            if record.is_bdd() {
                return true;
            }
            current = record.parent;
        }
        false
    }

    pub fn mark_started(&mut self, id: MetaStepId) {
        self.records[id.0].started_at = Some(Instant::now());
    }

    pub fn mark_finished(&mut self, id: MetaStepId) {
        self.records[id.0].finished_at = Some(Instant::now());
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bdd_and_within_detection() {
        let mut arena = MetaStepArena::new();
        let given = arena.insert("Given a logged-in user", "step", Vec::new(), None);
        let within = arena.insert("Within", ".modal", Vec::new(), None);
        let page = arena.insert("Login", "submit", Vec::new(), None);

        assert!(arena.get(given).is_bdd());
        assert!(!arena.get(given).is_within());
        assert!(arena.get(within).is_within());
        assert!(!arena.get(page).is_bdd());
    }

    #[test]
    fn label_appends_colon_only_for_plain_actors() {
        let mut arena = MetaStepArena::new();
        let page = arena.insert("Login", "submit", vec![StepArg::from("a@b.com")], None);
        let clause = arena.insert("When", "I log in", Vec::new(), None);

        assert_eq!(arena.label(page), "Login: submit \"a@b.com\"");
        assert_eq!(arena.label(clause), "When I log in");
    }

    #[test]
    fn propagate_mirrors_status_up_the_chain() {
        let mut arena = MetaStepArena::new();
        let outer = arena.insert("Given", "setup", Vec::new(), None);
        let inner = arena.insert("Login", "submit", Vec::new(), Some(outer));

        arena.propagate_status(inner, StepStatus::Success);
        assert_eq!(arena.status(inner), StepStatus::Success);
        assert_eq!(arena.status(outer), StepStatus::Success);
    }

    /// Sticky-failure law: failed is never overwritten back to success.
    #[test]
    fn failed_is_sticky() {
        let mut arena = MetaStepArena::new();
        let meta = arena.insert("Login", "submit", Vec::new(), None);

        arena.propagate_status(meta, StepStatus::Success);
        arena.propagate_status(meta, StepStatus::Failed);
        assert_eq!(arena.status(meta), StepStatus::Failed);

        arena.propagate_status(meta, StepStatus::Success);
        assert_eq!(arena.status(meta), StepStatus::Failed);
    }

    #[test]
    fn chain_has_bdd_walks_parents() {
        let mut arena = MetaStepArena::new();
        let clause = arena.insert("Then the dashboard is shown", "check", Vec::new(), None);
        let page = arena.insert("Dashboard", "open", Vec::new(), Some(clause));
        let plain = arena.insert("Profile", "load", Vec::new(), None);

        assert!(arena.chain_has_bdd(page));
        assert!(!arena.chain_has_bdd(plain));
    }
}
