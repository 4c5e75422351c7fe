//! Pure call-tree path construction from classified frames.

use serde::{Deserialize, Serialize};

use crate::core::classifier::FrameClassifier;
use crate::core::frame::{Frame, SiteId};

/// One node of a reconstructed call-tree path.
///
/// Boundary nodes root at level 0 (`parent_id: None`); grouping nodes chain
/// to the previous path entry. The final node of a step's path carries the
/// step's own summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallNode {
    pub id: SiteId,
    pub parent_id: Option<SiteId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<StepSummary>,
}

/// Concrete rendering of the action at a call site: actor, humanized name,
/// humanized arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSummary {
    pub actor: String,
    pub name: String,
    pub args: String,
}

impl StepSummary {
    /// Single-line label, as shown for ancestor rows in the tree view.
    pub fn label(&self) -> String {
        format!("{} {} {}", self.actor, self.name, self.args)
            .trim_end()
            .to_string()
    }
}

/// Build the `{id, parent_id}` path for one captured stack.
///
/// `frames` must be ordered outermost first (callers reverse the captured
/// trace). Boundary frames each append an independently rooted node; grouping
/// frames chain to the previous entry. When the first grouping frame is met
/// while the path is still empty, the path is seeded with `seed`, the last
/// known page-object path, stitching the step to the page-object call that
/// most recently invoked any step.
///
/// A stack with no boundary or grouping frames yields an empty path; the step
/// stays usable, just untracked in the tree.
pub fn build_path<C: FrameClassifier + ?Sized>(
    frames: &[Frame],
    seed: &[CallNode],
    classifier: &C,
) -> Vec<CallNode> {
    let mut path: Vec<CallNode> = Vec::new();
    for frame in frames {
        if frame.function.is_none() {
            continue;
        }
        if classifier.is_boundary(frame) {
            path.push(CallNode {
                id: SiteId::for_frame(frame),
                parent_id: None,
                step: None,
            });
        }
        if classifier.is_grouping_call(frame) {
            if path.is_empty() {
                path.extend_from_slice(seed);
            }
            let parent_id = path.last().map(|node| node.id.clone());
            path.push(CallNode {
                id: SiteId::for_frame(frame),
                parent_id,
                step: None,
            });
        }
    }
    path
}
