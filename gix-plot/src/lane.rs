//! Lane handles and the customization seam for renderers.

/// A handle to one lane of the plot.
///
/// Handles stay valid for the lifetime of the list, including after the lane
/// closes; a closed lane keeps its last position so rows that recorded it
/// render consistently. The position behind a handle can change once, when a
/// blocked commit repositions its lane, and every holder observes the change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LaneId(pub(crate) u32);

impl LaneId {
    /// The index of this lane in creation order, mainly useful to hooks that
    /// key rendering state by lane.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// One lane's state within the list's arena.
#[derive(Debug, Clone)]
pub(crate) struct LaneSlot {
    pub(crate) position: usize,
}

/// Customization points invoked as lanes come and go.
///
/// Downstream renderers attach state such as colors here. Injected with
/// [`PlotCommitList::with_hooks`](crate::PlotCommitList::with_hooks); the
/// defaults do nothing.
pub trait LaneHooks {
    /// A lane was created and placed at `position`.
    fn lane_created(&mut self, lane: LaneId, position: usize) {
        let _ = (lane, position);
    }

    /// An active lane was closed; its `position` returns to the free pool.
    fn lane_recycled(&mut self, lane: LaneId, position: usize) {
        let _ = (lane, position);
    }
}

/// The default hooks, doing nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

impl LaneHooks for NoopHooks {}
