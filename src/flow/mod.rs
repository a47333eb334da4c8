//! Flow distribution (§4.4) and composition with insertions (§4.5): packs a
//! [`Child`] stream into the regions of a page/column, handling floats,
//! footnotes, and relayout.

mod collect;
mod compose;
mod distribute;

pub use collect::{
    collect_lines, Body, Child, LineChild, MultiChild, MultiSpill, PlacedChild,
    PlacementScope, SingleChild,
};
pub use compose::{compose, ColumnConfig, Composer, Config, Insertions, RelayoutSignal, Work};
pub use distribute::distribute;

use ecow::EcoVec;

use crate::error::LayoutDiagnostic;

/// Why distribution of the current region stopped.
#[derive(Debug)]
pub enum Stop {
    /// The region is done; `true` if a break was forced (e.g. explicit
    /// column/page break) rather than the region simply running out of
    /// space.
    Finish(bool),
    /// An insertion (float/footnote) changed the available space; redo the
    /// region or the whole page.
    Relayout(RelayoutSignal),
    /// A fatal error; propagates to the caller.
    Error(EcoVec<LayoutDiagnostic>),
}

pub type FlowResult<T> = Result<T, Stop>;

impl From<EcoVec<LayoutDiagnostic>> for Stop {
    fn from(errors: EcoVec<LayoutDiagnostic>) -> Self {
        Stop::Error(errors)
    }
}

/// The maximum number of relayout passes for one page before giving up and
/// emitting best-effort output with a warning (§5, §9: "the source provides
/// no cap and quietly oscillates — implementers should cap at ≥ 16").
pub const MAX_RELAYOUT_ITERATIONS: usize = 16;
