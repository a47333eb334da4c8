//! Helpers shared across math constructs: style transitions, row
//! stacking, and alignment-point bookkeeping for multi-row math.

use crate::frame::Frame;
use crate::geom::{Abs, Axes, Em, FixedAlignment, Point, Size};

use super::fragment::{GlyphFragment, MathFragment};
use super::run::LeftRightAlternator;

/// Shortfall subtracted from a stretched delimiter's target height so it
/// doesn't look oversized next to the content it encloses.
pub const DELIM_SHORT_FALL: Em = Em::new(0.1);

/// Line leading used between math rows at script/scriptscript size,
/// tighter than the surrounding paragraph's leading.
pub const TIGHT_LEADING: Em = Em::new(0.25);

/// Where a [`MathFragment`]'s per-row alignment point falls, and the
/// row's total width once every fragment has been placed around it.
#[derive(Debug, Clone, Default)]
pub struct AlignmentResult {
    pub points: Vec<Abs>,
    pub width: Abs,
}

/// Finds the cumulative width up to each `Align` marker in a row, used so
/// sibling rows in a matrix/cases/multi-row equation can line up their
/// columns (see `spec.md` §4.7 "Multi-row math").
pub fn alignments(row: &[MathFragment]) -> AlignmentResult {
    let mut points = vec![];
    let mut width = Abs::zero();
    for fragment in row {
        if matches!(fragment, MathFragment::Align) {
            points.push(width);
        } else {
            width += fragment.width();
        }
    }
    AlignmentResult { points, width }
}

/// Places `rows` vertically (aligned per `align` within the widest row,
/// separated by `leading`) with `baseline_row`'s baseline promoted to the
/// resulting frame's baseline.
pub fn stack(
    rows: Vec<Frame>,
    align: FixedAlignment,
    leading: Abs,
    baseline_row: usize,
    alternator: LeftRightAlternator,
) -> Frame {
    let _ = alternator;
    let width = rows.iter().map(Frame::width).fold(Abs::zero(), Abs::max);
    let height = rows.iter().map(Frame::height).sum::<Abs>()
        + leading * (rows.len().saturating_sub(1)) as f64;

    let mut frame = Frame::soft(Size::new(width, height));
    let mut y = Abs::zero();
    let mut baseline = Abs::zero();
    for (i, row) in rows.into_iter().enumerate() {
        let x = align.position(width - row.width());
        if i == baseline_row {
            baseline = y + row.ascent();
        }
        let row_height = row.height();
        frame.push_frame(Point::new(x, y), row);
        y += row_height + leading;
    }
    frame.set_baseline(baseline);
    frame
}

/// Applies `f` to both axes of `size`, used by constructs that need a
/// per-axis relative gap (matrix row/column gaps).
pub fn resolve_gap(gap: Axes<Abs>) -> Axes<Abs> {
    gap
}

/// Grows a glyph's ascent/descent symmetrically to `target`, standing in
/// for the teacher's glyph-variant/assembly stretch (no shaping backend
/// here to source assembly parts from; see `DESIGN.md`).
pub fn stretch_glyph_to_height(mut glyph: GlyphFragment, target: Abs) -> GlyphFragment {
    let natural = glyph.height();
    if target > natural {
        let extra = (target - natural) / 2.0;
        glyph.ascent += extra;
        glyph.descent += extra;
    }
    glyph
}
