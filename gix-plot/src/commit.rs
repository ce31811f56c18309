//! Commit nodes as the plot sees them.

use gix_hash::ObjectId;
use smallvec::SmallVec;

use crate::lane::LaneId;

/// The parent ids of a commit, two inline as merges rarely have more.
pub type ParentIds = SmallVec<[ObjectId; 2]>;

/// The record a commit source yields for each commit, child-first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    /// The id of the commit.
    pub id: ObjectId,
    /// The ids of all parents, in commit order.
    pub parents: ParentIds,
}

impl CommitInfo {
    /// Create a new record from an id and its parent ids.
    pub fn new(id: ObjectId, parents: impl IntoIterator<Item = ObjectId>) -> Self {
        Self {
            id,
            parents: parents.into_iter().collect(),
        }
    }
}

/// A commit node within a [`PlotCommitList`](crate::PlotCommitList).
///
/// Children are recorded as row indexes into the list, in the order their
/// rows entered. The lane is assigned exactly once, when a descendant needs
/// to connect to this commit or when the commit itself enters with children;
/// tips of unseen sub-graphs stay laneless until then.
#[derive(Debug, Clone)]
pub struct PlotCommit {
    pub(crate) id: ObjectId,
    pub(crate) parents: ParentIds,
    pub(crate) children: Vec<usize>,
    pub(crate) lane: Option<LaneId>,
    pub(crate) passing_lanes: Vec<LaneId>,
}

impl PlotCommit {
    pub(crate) fn new(info: CommitInfo) -> Self {
        Self {
            id: info.id,
            parents: info.parents,
            children: Vec::new(),
            lane: None,
            passing_lanes: Vec::new(),
        }
    }

    /// The id of this commit.
    pub fn id(&self) -> &ObjectId {
        &self.id
    }

    /// The parent ids, in commit order.
    pub fn parents(&self) -> &[ObjectId] {
        &self.parents
    }

    /// Row indexes of all children seen so far, in enter order.
    pub fn children(&self) -> &[usize] {
        &self.children
    }

    /// The lane this commit was placed on, if any yet.
    pub fn lane(&self) -> Option<LaneId> {
        self.lane
    }

    /// All lanes running through this commit's row without ending here.
    pub fn passing_lanes(&self) -> &[LaneId] {
        &self.passing_lanes
    }

    pub(crate) fn is_child(&self, row: usize) -> bool {
        self.children.contains(&row)
    }
}
