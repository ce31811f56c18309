//! gix-plot: lane assignment for commit-history graphs.
//!
//! Commits arrive in child-before-parent order from a plot-aware walker and
//! are entered into a [`PlotCommitList`]. Each entered commit is assigned an
//! integer lane position, and rows its lane runs through record it as a
//! passing lane, such that a renderer can draw the graph without any line
//! crossing through a commit node.
//!
//! Positions of closed lanes are recycled smallest-first to keep the rendered
//! graph compact.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

mod commit;
mod lane;
mod list;
mod walk;

pub use commit::{CommitInfo, PlotCommit};
pub use lane::{LaneHooks, LaneId, NoopHooks};
pub use list::PlotCommitList;
pub use walk::{CommitSource, PlotWalk};

/// The error returned when binding a commit source.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The backing commit source does not materialize the parent structure
    /// lane assignment relies on.
    #[error("commit source is not plot-aware")]
    WrongSource,
}
