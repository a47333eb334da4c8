//! A single row (or multi-row block) of math fragments: inter-atom
//! spacing, row splitting on `Linebreak`, and assembly into a frame.

use crate::error::SourceResult;
use crate::frame::Frame;
use crate::geom::{Abs, Point, Size};

use super::fragment::{glyph_to_frame, FrameFragment, GlyphFragment, MathFragment};
use super::shared::{alignments, stack, TIGHT_LEADING};
use super::spacing::spacing_between;
use super::{MathContext, MathStyle};

/// Which side of an alignment point a cell's content hugs: cells before
/// the point right-align to it, cells after left-align, in a matrix's
/// "elements"/"cells" columns; `None` leaves every cell at its natural
/// position (used for `cases` branches).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeftRightAlternator {
    Right,
    Left,
    None,
}

impl LeftRightAlternator {
    pub fn next(self) -> Self {
        match self {
            Self::Right => Self::Left,
            Self::Left => Self::Right,
            Self::None => Self::None,
        }
    }
}

/// One frame per region of a multi-row equation, each already holding its
/// constituent rows positioned within it — `build()` stacks them into the
/// single frame a breakable block caller expects.
pub struct MathRunFrameBuilder {
    pub frames: Vec<(Frame, Point)>,
    pub size: Size,
}

impl MathRunFrameBuilder {
    pub fn build(self) -> Frame {
        let mut frame = Frame::soft(self.size);
        let baseline = self.frames.first().map(|(f, pos)| pos.y + f.ascent());
        for (sub, pos) in self.frames {
            frame.push_frame(pos, sub);
        }
        if let Some(baseline) = baseline {
            frame.set_baseline(baseline);
        }
        frame
    }
}

/// A sequence of math fragments, possibly split into several rows by
/// `Linebreak` markers.
pub struct MathRun(Vec<MathFragment>);

impl MathRun {
    pub fn new(fragments: Vec<MathFragment>) -> Self {
        Self(fragments)
    }

    pub fn is_multiline(&self) -> bool {
        self.0.iter().any(|f| matches!(f, MathFragment::Linebreak))
    }

    /// Splits into rows at `Linebreak` markers, dropping the markers
    /// themselves.
    pub fn rows(&self) -> Vec<&[MathFragment]> {
        self.0.split(|f| matches!(f, MathFragment::Linebreak)).collect()
    }

    pub fn row_count(&self) -> usize {
        self.rows().len()
    }

    /// Interleaves `GetSpacing`-derived gaps between adjacent atoms of a
    /// single row, skipping `Align` markers (handled separately by
    /// [`alignments`]) and never spacing around `Linebreak`.
    fn spaced_row(row: &[MathFragment], style: MathStyle, font_size: Abs) -> Vec<MathFragment> {
        let mut out: Vec<MathFragment> = vec![];
        for fragment in row {
            if let Some(prev) = out.last() {
                let prev_is_boundary = matches!(prev, MathFragment::Align);
                let next_is_boundary = matches!(fragment, MathFragment::Align);
                if !prev_is_boundary && !next_is_boundary {
                    if let Some(amount) =
                        spacing_between(prev.class(), fragment.class(), style, font_size)
                    {
                        out.push(MathFragment::Spacing(amount, true));
                    }
                }
            }
            out.push(fragment.clone());
        }
        out
    }

    /// Lays one row out left-to-right, respecting alignment points: cells
    /// before a point are positioned so the point falls at `points[i]`,
    /// alternating which side of the gap each successive point anchors
    /// (`alternator`).
    fn into_line_frame(row: Vec<MathFragment>, points: &[Abs]) -> Frame {
        let ascent = row.iter().map(MathFragment::ascent).fold(Abs::zero(), Abs::max);
        let descent = row.iter().map(MathFragment::descent).fold(Abs::zero(), Abs::max);
        let width =
            row.iter().filter(|f| !matches!(f, MathFragment::Align)).map(MathFragment::width).sum::<Abs>();
        let mut frame = Frame::soft(Size::new(width, ascent + descent));
        frame.set_baseline(ascent);

        let mut x = Abs::zero();
        let mut point_idx = 0;
        for fragment in row {
            if matches!(fragment, MathFragment::Align) {
                if let Some(&point) = points.get(point_idx) {
                    x = point;
                }
                point_idx += 1;
                continue;
            }
            let y = ascent - fragment.ascent();
            let w = fragment.width();
            match fragment {
                MathFragment::Glyph(g) => frame.push_frame(Point::new(x, y), glyph_to_frame(&g)),
                MathFragment::Frame(f) => frame.push_frame(Point::new(x, y), f.frame),
                MathFragment::Spacing(..) | MathFragment::Linebreak | MathFragment::Align => {}
            }
            x += w;
        }
        frame
    }

    /// Lays the whole run out as a single frame.
    pub fn into_frame(self, style: MathStyle, font_size: Abs) -> Frame {
        if !self.is_multiline() {
            let spaced = Self::spaced_row(&self.0, style, font_size);
            let points = alignments(&spaced).points;
            return Self::into_line_frame(spaced, &points);
        }
        self.multiline_frame_builder(style, font_size).build()
    }

    /// Builds the stacked, multi-row frame used both for display-block
    /// equations and as the fallback for `into_fragment` on multi-row runs.
    /// Rows are separated by tight leading (§4.7 "Multi-row math") except
    /// at display size, which uses no extra gap beyond each row's own
    /// ascent/descent (display leading is a paragraph-level concern above
    /// this core).
    pub fn multiline_frame_builder(self, style: MathStyle, font_size: Abs) -> MathRunFrameBuilder {
        let leading = if style.size.is_display() { Abs::zero() } else { TIGHT_LEADING.at(font_size) };
        let rows: Vec<Frame> = self
            .rows()
            .into_iter()
            .map(|row| {
                let spaced = Self::spaced_row(row, style, font_size);
                let points = alignments(&spaced).points;
                Self::into_line_frame(spaced, &points)
            })
            .collect();
        let width = rows.iter().map(Frame::width).fold(Abs::zero(), Abs::max);
        let mut frames = vec![];
        let mut y = Abs::zero();
        for row in rows {
            let height = row.height();
            frames.push((row, Point::with_y(y)));
            y += height + leading;
        }
        if !frames.is_empty() {
            y -= leading;
        }
        MathRunFrameBuilder { frames, size: Size::new(width, y) }
    }

    /// Unifies the run into a single fragment: the lone fragment if there
    /// is exactly one, otherwise a frame wrapping the whole row/block.
    pub fn into_fragment(self) -> MathFragment {
        self.into_fragment_styled(MathStyle::new(false), Abs::zero())
    }

    pub fn into_fragment_styled(self, style: MathStyle, font_size: Abs) -> MathFragment {
        if self.0.len() == 1 && !self.is_multiline() {
            return self.0.into_iter().next().unwrap();
        }
        FrameFragment::new(style, self.into_frame(style, font_size)).into()
    }
}

/// Stacks rows with tight leading, centered, with the baseline taken from
/// `baseline_row` — used by constructs (e.g. over/underbrace-style
/// spreaders) that build a small fixed stack of rows directly rather than
/// through a `MathRun`.
pub fn stack_rows(rows: Vec<Frame>, leading: Abs, baseline_row: usize) -> Frame {
    stack(rows, crate::geom::FixedAlignment::Center, leading, baseline_row, LeftRightAlternator::Right)
}

/// Lays out a single character: the numeric/symbol fast path that shapes
/// one glyph directly rather than going through paragraph text layout.
pub fn layout_atom(ctx: &mut MathContext, c: char, _style: MathStyle) -> SourceResult<()> {
    match GlyphFragment::new(ctx, c) {
        Some(glyph) => ctx.push(glyph),
        None => {
            if let Some(glyph) =
                ctx.services().select_family(&c.to_string()).and_then(|_| GlyphFragment::new(ctx, c))
            {
                ctx.push(glyph);
            }
        }
    }
    Ok(())
}

/// Text in math: the numeric fast path lays out digit-by-digit as glyph
/// fragments; anything else (and any embedded newline) falls back to
/// plain multi-row text, split at `\n`.
pub fn layout_text(ctx: &mut MathContext, text: &str, style: MathStyle) -> SourceResult<()> {
    let is_numeric = text.chars().all(|c| c.is_ascii_digit() || c == '.');
    if is_numeric {
        for c in text.chars() {
            layout_atom(ctx, c, style)?;
        }
        return Ok(());
    }

    let mut lines = text.split('\n').peekable();
    while let Some(line) = lines.next() {
        for c in line.chars() {
            layout_atom(ctx, c, style)?;
        }
        if lines.peek().is_some() {
            ctx.push(MathFragment::Linebreak);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Corner;
    use crate::math::{FontId, FontMetrics, FontService, MathConstants, ShapedGlyph};

    struct StubFonts;
    impl FontService for StubFonts {
        fn font_metrics(&self, _font: FontId) -> FontMetrics {
            FontMetrics {
                units_per_em: 1000.0,
                ascent: crate::geom::Em::new(0.8),
                descent: crate::geom::Em::new(0.2),
            }
        }
        fn math_constants(&self, _font: FontId) -> MathConstants {
            MathConstants::default()
        }
        fn glyph_advance(&self, _font: FontId, _glyph: u16, size: Abs) -> Abs {
            Abs::raw(size.to_raw() * 0.5)
        }
        fn kern_at_height(&self, _font: FontId, _glyph: u16, _corner: Corner, _height: Abs) -> Abs {
            Abs::zero()
        }
        fn shape(&self, _text: &str, _font: FontId, _size: Abs) -> Vec<ShapedGlyph> {
            vec![]
        }
        fn glyph_for_char(&self, _font: FontId, c: char) -> Option<u16> {
            Some(c as u16)
        }
        fn select_family(&self, _text: &str) -> Option<FontId> {
            None
        }
    }

    #[test]
    fn single_atom_run_unifies_to_its_own_fragment() {
        let fonts = StubFonts;
        let mut ctx = MathContext::new(&fonts, FontId(0), Abs::pt(10.0));
        let run = ctx
            .layout_into_run(&crate::math::MathExpr::Atom('x'), MathStyle::new(false))
            .unwrap();
        assert_eq!(run.row_count(), 1);
        let fragment = run.into_fragment();
        assert!(matches!(fragment, MathFragment::Glyph(_)));
    }

    #[test]
    fn linebreak_splits_into_multiple_rows() {
        let fragments = vec![
            MathFragment::Spacing(Abs::pt(1.0), false),
            MathFragment::Linebreak,
            MathFragment::Spacing(Abs::pt(2.0), false),
        ];
        let run = MathRun::new(fragments);
        assert!(run.is_multiline());
        assert_eq!(run.row_count(), 2);
    }
}
