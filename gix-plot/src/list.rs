//! The windowed commit list performing lane assignment.

use std::collections::{BTreeSet, HashMap, HashSet};

use gix_hash::ObjectId;

use crate::{
    commit::{CommitInfo, PlotCommit},
    lane::{LaneHooks, LaneId, LaneSlot, NoopHooks},
    walk::CommitSource,
    Error,
};

/// A list of commits, entered child-first, with lanes assigned on entry.
///
/// Lanes occupy integer positions. A lane is active while its oldest end has
/// not yet been connected to a parent in the list; closing a lane returns its
/// position to a free pool from which the smallest position is handed out
/// first. A commit whose fresh lane would collide with a line already running
/// through the rows above it is repositioned onto the smallest free position
/// that does not collide.
pub struct PlotCommitList {
    source: Option<Box<dyn CommitSource>>,
    commits: Vec<PlotCommit>,
    index_by_id: HashMap<ObjectId, usize>,
    pending_children: HashMap<ObjectId, Vec<usize>>,
    lanes: Vec<LaneSlot>,
    positions_allocated: usize,
    free_positions: BTreeSet<usize>,
    active_lanes: HashSet<LaneId>,
    hooks: Box<dyn LaneHooks>,
}

impl Default for PlotCommitList {
    fn default() -> Self {
        Self::new()
    }
}

impl PlotCommitList {
    /// Create an empty list with no source bound and no-op lane hooks.
    pub fn new() -> Self {
        Self {
            source: None,
            commits: Vec::new(),
            index_by_id: HashMap::new(),
            pending_children: HashMap::new(),
            lanes: Vec::new(),
            positions_allocated: 0,
            free_positions: BTreeSet::new(),
            active_lanes: HashSet::new(),
            hooks: Box::new(NoopHooks),
        }
    }

    /// Install lane hooks, e.g. for color assignment in a renderer.
    pub fn with_hooks(mut self, hooks: impl LaneHooks + 'static) -> Self {
        self.hooks = Box::new(hooks);
        self
    }

    /// Bind the commit source feeding this list.
    ///
    /// Sources that are not plot-aware are rejected, as they cannot guarantee
    /// the parent structure lane assignment relies on.
    pub fn source(&mut self, source: impl CommitSource + 'static) -> Result<(), Error> {
        if !source.is_plot_aware() {
            return Err(Error::WrongSource);
        }
        self.source = Some(Box::new(source));
        Ok(())
    }

    /// Pull commits from the bound source and enter them until the list has
    /// grown past `high_mark` or the source runs dry.
    ///
    /// Returns the number of commits entered by this call.
    pub fn fill_to(&mut self, high_mark: usize) -> usize {
        let mut entered = 0;
        while self.commits.len() <= high_mark {
            let Some(info) = self.source.as_mut().and_then(|source| source.next_commit()) else {
                break;
            };
            let index = self.commits.len();
            self.enter(index, info);
            entered += 1;
        }
        entered
    }

    /// Enter the next commit of the walk at row `index`.
    ///
    /// `index` must equal the current list length: commits enter exactly
    /// once, in delivery order, children before parents.
    pub fn enter(&mut self, index: usize, info: CommitInfo) {
        assert_eq!(
            index,
            self.commits.len(),
            "commits must enter in delivery order"
        );
        let mut commit = PlotCommit::new(info);

        // Register as a child of each parent. Parents normally enter later
        // and drain the pending map then; a parent already in the list gets
        // the back-pointer directly.
        for parent in &commit.parents {
            match self.index_by_id.get(parent) {
                Some(&parent_row) => self.commits[parent_row].children.push(index),
                None => self
                    .pending_children
                    .entry(parent.clone())
                    .or_default()
                    .push(index),
            }
        }
        commit.children = self.pending_children.remove(&commit.id).unwrap_or_default();
        self.index_by_id.insert(commit.id.clone(), index);
        self.commits.push(commit);

        let n_children = self.commits[index].children.len();
        if n_children == 0 {
            // A tip. It receives its lane when a descendant connects to it.
            return;
        }

        let only_child = self.commits[index].children[0];
        if n_children == 1 && self.commits[only_child].parents.len() < 2 {
            // Single child with a single parent: continue its lane.
            let lane = match self.commits[only_child].lane {
                Some(lane) => lane,
                None => {
                    // The child was the root of a sub-graph unseen at its own
                    // enter time; open its lane lazily now.
                    let lane = self.next_free_lane();
                    self.commits[only_child].lane = Some(lane);
                    self.active_lanes.insert(lane);
                    lane
                }
            };
            for row in (0..index).rev() {
                if row == only_child {
                    break;
                }
                self.commits[row].passing_lanes.push(lane);
            }
            self.commits[index].lane = Some(lane);
        } else {
            // Multiple children, or the only child is a merge. Keep one child
            // lane reserved while closing the others, close the reserved one
            // last, then place this commit on a fresh lane. Deferring the
            // close keeps the children from collapsing onto this commit's
            // position prematurely.
            let children = self.commits[index].children.clone();
            let mut reserved: Option<LaneId> = None;
            for child_row in children {
                match self.commits[child_row].lane {
                    None => {
                        let lane = self.next_free_lane();
                        self.commits[child_row].lane = Some(lane);
                        self.active_lanes.insert(lane);
                        if reserved.is_some() {
                            self.close_lane(lane);
                        } else {
                            reserved = Some(lane);
                        }
                    }
                    Some(lane) => {
                        if reserved.is_none() && self.active_lanes.contains(&lane) {
                            reserved = Some(lane);
                        } else {
                            self.close_lane(lane);
                        }
                    }
                }
            }
            if let Some(lane) = reserved {
                self.close_lane(lane);
            }
            let lane = self.next_free_lane();
            self.active_lanes.insert(lane);
            self.commits[index].lane = Some(lane);
            self.handle_blocked_lanes(index, lane, n_children);
        }
    }

    /// Accumulate every lane passing through `commit`'s row into `out`, in
    /// unspecified order.
    pub fn find_passing_through(&self, commit: &PlotCommit, out: &mut Vec<LaneId>) {
        out.extend_from_slice(&commit.passing_lanes);
    }

    /// Reset the list and all allocator state, keeping source and hooks.
    pub fn clear(&mut self) {
        self.commits.clear();
        self.index_by_id.clear();
        self.pending_children.clear();
        self.lanes.clear();
        self.positions_allocated = 0;
        self.free_positions.clear();
        self.active_lanes.clear();
    }

    /// The number of commits entered so far.
    pub fn len(&self) -> usize {
        self.commits.len()
    }

    /// Whether no commit has been entered yet.
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    /// The commit at row `index`, if entered.
    pub fn get(&self, index: usize) -> Option<&PlotCommit> {
        self.commits.get(index)
    }

    /// Iterate all entered commits in row order.
    pub fn iter(&self) -> impl Iterator<Item = &PlotCommit> + '_ {
        self.commits.iter()
    }

    /// The current position of `lane`.
    pub fn lane_position(&self, lane: LaneId) -> usize {
        self.lanes[lane.index()].position
    }

    /// How many positions were ever handed out; equals the maximum position
    /// ever assigned plus one.
    pub fn positions_allocated(&self) -> usize {
        self.positions_allocated
    }

    /// Whether `lane`'s oldest end is still unconnected.
    pub fn is_active(&self, lane: LaneId) -> bool {
        self.active_lanes.contains(&lane)
    }

    /// The number of currently active lanes.
    pub fn active_lane_count(&self) -> usize {
        self.active_lanes.len()
    }

    /// Positions closed and not yet reallocated, smallest first.
    pub fn free_positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.free_positions.iter().copied()
    }

    /// Create a lane on the smallest free position, or on a brand new one.
    fn next_free_lane(&mut self) -> LaneId {
        let position = match self.free_positions.pop_first() {
            Some(position) => position,
            None => {
                let next = self.positions_allocated;
                self.positions_allocated += 1;
                next
            }
        };
        let lane = LaneId(self.lanes.len() as u32);
        self.lanes.push(LaneSlot { position });
        self.hooks.lane_created(lane, position);
        lane
    }

    /// Close `lane` if it is still active: recycle it and return its position
    /// to the free pool. Closing an already closed lane does nothing, so
    /// merge parents sharing a closed child lane cannot double-free its
    /// position.
    fn close_lane(&mut self, lane: LaneId) {
        if self.active_lanes.remove(&lane) {
            let position = self.lanes[lane.index()].position;
            self.hooks.lane_recycled(lane, position);
            self.free_positions.insert(position);
        }
    }

    /// The no-line-through-commit pass.
    ///
    /// Walk the rows above `index` until all children of the entered commit
    /// are accounted for, record its lane as passing on each crossed row,
    /// collect the positions those rows' own lanes occupy, and if the fresh
    /// lane landed on one of them move it to the smallest free position that
    /// is not blocked, releasing the old position.
    fn handle_blocked_lanes(&mut self, index: usize, lane: LaneId, n_children: usize) {
        let mut remaining = n_children;
        let mut blocked = BTreeSet::new();
        for row in (0..index).rev() {
            if self.commits[index].is_child(row) {
                remaining -= 1;
                if remaining == 0 {
                    break;
                }
            }
            if let Some(row_lane) = self.commits[row].lane {
                blocked.insert(self.lanes[row_lane.index()].position);
            }
            self.commits[row].passing_lanes.push(lane);
        }

        let position = self.lanes[lane.index()].position;
        if !blocked.contains(&position) {
            return;
        }
        let new_position = match self
            .free_positions
            .iter()
            .copied()
            .find(|candidate| !blocked.contains(candidate))
        {
            Some(free) => {
                self.free_positions.remove(&free);
                free
            }
            None => {
                let next = self.positions_allocated;
                self.positions_allocated += 1;
                next
            }
        };
        self.free_positions.insert(position);
        self.lanes[lane.index()].position = new_position;
        tracing::trace!(
            lane = lane.index(),
            from = position,
            to = new_position,
            "repositioned blocked lane"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_positions_are_reused_smallest_first() {
        let mut list = PlotCommitList::new();
        let first = list.next_free_lane();
        let second = list.next_free_lane();
        assert_eq!(list.lane_position(first), 0);
        assert_eq!(list.lane_position(second), 1);

        list.active_lanes.insert(first);
        list.active_lanes.insert(second);
        list.close_lane(second);
        list.close_lane(first);

        let recycled = list.next_free_lane();
        assert_eq!(list.lane_position(recycled), 0, "smallest position first");
        assert_eq!(list.positions_allocated(), 2);
    }

    #[test]
    fn closing_twice_frees_once() {
        let mut list = PlotCommitList::new();
        let lane = list.next_free_lane();
        list.active_lanes.insert(lane);
        list.close_lane(lane);
        list.close_lane(lane);
        assert_eq!(list.free_positions().count(), 1);
    }
}
