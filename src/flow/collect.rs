//! Prepares a caller-supplied stream of document children into the [`Child`]
//! union the distributor consumes (§4.4's input).
//!
//! Grounded in `flow/collect.rs`'s `Collector`, but without a content/element
//! model to recognize: callers build [`Child`]s directly (or via [`collect`]
//! from a list of pre-classified [`RawChild`]s) rather than this crate
//! pattern-matching on document element types, since parsing and evaluation
//! are out of scope (`spec.md` §1).

use std::rc::Rc;

use crate::error::SourceResult;
use crate::frame::Frame;
use crate::geom::{Axes, Fr, FixedAlignment, Location, Rel};
use crate::regions::Regions;

/// A prepared child in flow layout.
///
/// Every boxed variant holds an [`Rc`] rather than a plain `Box` so that a
/// single child can cheaply be pulled out of the shared work queue by value
/// for dispatch (see `flow::compose::Work`), and so that `Work` itself —
/// which must support cheap clone for sticky/relayout snapshots (§3) — never
/// deep-copies child bodies.
#[derive(Clone)]
pub enum Child {
    /// An introspection tag, migratable to the next region if left alone.
    Tag(Location),
    /// Relative spacing with a weakness level (0 = strong).
    RelSpacing(Rel, u8),
    /// Fractional spacing with a weakness level.
    FrSpacing(Fr, u8),
    /// An already laid-out paragraph line.
    Line(Rc<LineChild>),
    /// An unbreakable block, optionally fractional.
    Single(Rc<SingleChild>),
    /// A breakable block.
    Multi(Rc<MultiChild>),
    /// An absolutely or floatingly placed element.
    Placed(Rc<PlacedChild>),
    /// Wait for pending floats before continuing.
    Flush,
    /// An explicit column/page break; `weak` means "only if something
    /// already occupies the region".
    Break(bool),
}

impl std::fmt::Debug for Child {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Tag(l) => write!(f, "Tag({l:?})"),
            Self::RelSpacing(r, w) => write!(f, "RelSpacing({r:?}, {w})"),
            Self::FrSpacing(fr, w) => write!(f, "FrSpacing({fr:?}, {w})"),
            Self::Line(l) => write!(f, "Line({:?})", l.frame.size()),
            Self::Single(_) => write!(f, "Single"),
            Self::Multi(_) => write!(f, "Multi"),
            Self::Placed(_) => write!(f, "Placed"),
            Self::Flush => write!(f, "Flush"),
            Self::Break(w) => write!(f, "Break({w})"),
        }
    }
}

/// A prepared paragraph line: already laid out, since line-breaking doesn't
/// depend on the concrete region sequence.
#[derive(Debug)]
pub struct LineChild {
    pub frame: Frame,
    pub align: Axes<FixedAlignment>,
    /// Height of this line plus any following lines grouped with it for
    /// widow/orphan prevention.
    pub need: crate::geom::Abs,
}

/// The body of a block: already-realized content, or a callback that lays
/// content out against a region supplied later by the distributor.
///
/// Mirrors the teacher's "realized content vs. single-region layouter vs.
/// multi-region layouter" split (`spec.md` §6), modeled here as trait-object
/// closures since this crate has no content/evaluator layer to dispatch on.
#[derive(Clone)]
pub enum Body {
    Content(Frame),
    Single(Rc<dyn Fn(crate::geom::Size, Axes<bool>) -> SourceResult<Frame>>),
    Multi(Rc<dyn Fn(Regions) -> SourceResult<(Frame, Option<MultiSpill>)>>),
}

impl std::fmt::Debug for Body {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Content(frame) => write!(f, "Content({:?})", frame.size()),
            Self::Single(_) => write!(f, "Single(<fn>)"),
            Self::Multi(_) => write!(f, "Multi(<fn>)"),
        }
    }
}

/// A prepared unbreakable block.
pub struct SingleChild {
    pub align: Axes<FixedAlignment>,
    pub sticky: bool,
    pub alone: bool,
    pub fr: Option<Fr>,
    pub location: Location,
    body: Body,
}

impl SingleChild {
    pub fn new(
        align: Axes<FixedAlignment>,
        sticky: bool,
        alone: bool,
        fr: Option<Fr>,
        location: Location,
        body: Body,
    ) -> Self {
        Self { align, sticky, alone, fr, location, body }
    }

    /// Builds this child's frame against the given base size, shrinking
    /// vertical expansion unless this is the region's only child.
    pub fn layout(&self, base: crate::geom::Size, expand: Axes<bool>) -> SourceResult<Frame> {
        let expand = Axes::new(expand.x, expand.y & self.alone);
        match &self.body {
            Body::Content(frame) => Ok(frame.clone()),
            Body::Single(f) => f(base, expand),
            Body::Multi(f) => {
                let regions = Regions::one(base, expand);
                f(regions).map(|(frame, _)| frame)
            }
        }
    }
}

impl std::fmt::Debug for SingleChild {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("SingleChild")
            .field("align", &self.align)
            .field("sticky", &self.sticky)
            .field("fr", &self.fr)
            .finish()
    }
}

/// A prepared breakable block.
pub struct MultiChild {
    pub align: Axes<FixedAlignment>,
    pub sticky: bool,
    pub alone: bool,
    pub location: Location,
    body: Rc<dyn Fn(Regions) -> SourceResult<(Frame, Option<MultiSpill>)>>,
}

impl MultiChild {
    pub fn new(
        align: Axes<FixedAlignment>,
        sticky: bool,
        alone: bool,
        location: Location,
        body: Rc<dyn Fn(Regions) -> SourceResult<(Frame, Option<MultiSpill>)>>,
    ) -> Self {
        Self { align, sticky, alone, location, body }
    }

    pub fn layout(&self, regions: Regions) -> SourceResult<(Frame, Option<MultiSpill>)> {
        (self.body)(regions)
    }
}

impl std::fmt::Debug for MultiChild {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("MultiChild").field("align", &self.align).finish()
    }
}

/// The not-yet-laid-out remainder of a breakable block that didn't fully
/// fit into a region.
#[derive(Clone)]
pub struct MultiSpill {
    pub align: Axes<FixedAlignment>,
    /// Whether a later frame among the remaining regions is non-empty; used
    /// to suppress an orphaned empty leading frame (§9's orphan rule).
    pub exist_non_empty_frame: bool,
    body: Rc<dyn Fn(Regions) -> SourceResult<(Frame, Option<MultiSpill>)>>,
}

impl MultiSpill {
    pub fn new(
        align: Axes<FixedAlignment>,
        exist_non_empty_frame: bool,
        body: Rc<dyn Fn(Regions) -> SourceResult<(Frame, Option<MultiSpill>)>>,
    ) -> Self {
        Self { align, exist_non_empty_frame, body }
    }

    pub fn layout(&self, regions: Regions) -> SourceResult<(Frame, Option<MultiSpill>)> {
        (self.body)(regions)
    }
}

impl std::fmt::Debug for MultiSpill {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("MultiSpill").field("align", &self.align).finish()
    }
}

/// The scope a floating placement searches for room in.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PlacementScope {
    Column,
    Page,
}

/// A prepared absolutely or floatingly placed child.
#[derive(Debug)]
pub struct PlacedChild {
    pub align_x: FixedAlignment,
    /// `None` when the element isn't floating; `Some(None)` means "auto",
    /// `Some(Some(a))` a fixed vertical alignment.
    pub align_y: Option<Option<FixedAlignment>>,
    pub scope: PlacementScope,
    pub float: bool,
    pub clearance: crate::geom::Abs,
    pub delta: Axes<Rel>,
    pub location: Location,
    frame: Frame,
}

impl PlacedChild {
    pub fn new(
        align_x: FixedAlignment,
        align_y: Option<Option<FixedAlignment>>,
        scope: PlacementScope,
        float: bool,
        clearance: crate::geom::Abs,
        delta: Axes<Rel>,
        location: Location,
        frame: Frame,
    ) -> Self {
        Self { align_x, align_y, scope, float, clearance, delta, location, frame }
    }

    pub fn layout(&self) -> Frame {
        self.frame.clone()
    }
}

/// Builds a child stream, resolving widow/orphan "need" for paragraph lines
/// the way `Collector::lines` does.
pub fn collect_lines(
    lines: Vec<Frame>,
    align: Axes<FixedAlignment>,
    leading: crate::geom::Abs,
    orphan_cost: crate::geom::Ratio,
    widow_cost: crate::geom::Ratio,
) -> Vec<Child> {
    let len = lines.len();
    let prevent_orphans =
        orphan_cost > crate::geom::Ratio::zero() && len >= 2 && !lines[1].is_empty();
    let prevent_widows = widow_cost > crate::geom::Ratio::zero()
        && len >= 2
        && !lines[len - 2].is_empty();
    let prevent_all = len == 3 && prevent_orphans && prevent_widows;

    let height_at = |i: usize, lines: &[Frame]| lines.get(i).map(Frame::height).unwrap_or_default();
    let front_1 = height_at(0, &lines);
    let front_2 = height_at(1, &lines);
    let back_2 = height_at(len.saturating_sub(2), &lines);
    let back_1 = height_at(len.saturating_sub(1), &lines);

    let mut out = Vec::with_capacity(lines.len() * 2);
    for (i, frame) in lines.into_iter().enumerate() {
        if i > 0 {
            out.push(Child::RelSpacing(Rel::from(leading), 5));
        }
        let need = if prevent_all && i == 0 {
            front_1 + leading + front_2 + leading + back_1
        } else if prevent_orphans && i == 0 {
            front_1 + leading + front_2
        } else if prevent_widows && i >= 2 && i + 2 == len {
            back_2 + leading + back_1
        } else {
            frame.height()
        };
        out.push(Child::Line(Rc::new(LineChild { frame, align, need })));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Abs, Ratio, Size};

    #[test]
    fn collect_lines_inserts_leading_between_lines() {
        let lines = vec![
            Frame::soft(Size::new(Abs::pt(10.0), Abs::pt(12.0))),
            Frame::soft(Size::new(Abs::pt(10.0), Abs::pt(12.0))),
        ];
        let align = Axes::splat(FixedAlignment::Start);
        let out = collect_lines(lines, align, Abs::pt(2.0), Ratio::zero(), Ratio::zero());
        assert_eq!(out.len(), 3);
        assert!(matches!(out[0], Child::Line(_)));
        assert!(matches!(out[1], Child::RelSpacing(_, 5)));
        assert!(matches!(out[2], Child::Line(_)));
    }
}
