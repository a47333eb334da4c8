//! Matrices (§4.7 "Matrix"): a grid of cells laid out column-by-column,
//! optionally fenced and with augmentation lines drawn at row/column
//! boundaries.
//!
//! The teacher threads per-column `MathRun`s through `shared::alignments`
//! and a `LeftRightAlternator` so `cases`-style branches can left-align
//! while `vec`/`mat` right-align; this crate's `MathExpr::Matrix` has no
//! `Vec`/`Cases` distinction, so every cell is simply centered in its
//! column (see `DESIGN.md`).

use unicode_math_class::MathClass;

use crate::error::SourceResult;
use crate::frame::{Frame, FrameItem, Shape};
use crate::geom::{Abs, Em, FixedAlignment, Point, Ratio, Size};

use super::fragment::{FrameFragment, GlyphFragment};
use super::shared::stretch_glyph_to_height;
use super::{Augment, MathContext, MathExpr, MathStyle};

const ROW_GAP: Em = Em::new(0.2);
const COLUMN_GAP: Em = Em::new(0.5);
const DEFAULT_STROKE_THICKNESS: Em = Em::new(0.05);
const VERTICAL_PADDING: Ratio = Ratio::new(0.1);

pub fn layout_matrix(
    ctx: &mut MathContext,
    rows: &[Vec<MathExpr>],
    delim: Option<(char, char)>,
    augment: &Augment,
    style: MathStyle,
) -> SourceResult<()> {
    let nrows = rows.len();
    let ncols = rows.iter().map(Vec::len).max().unwrap_or(0);

    if nrows == 0 || ncols == 0 {
        ctx.push(FrameFragment::new(style, Frame::soft(Size::zero())));
        return Ok(());
    }

    let font_size = ctx.font_size();
    let row_gap = ROW_GAP.at(font_size);
    let col_gap = COLUMN_GAP.at(font_size);
    let thickness = DEFAULT_STROKE_THICKNESS.at(font_size);
    let denom_style = style.denominator();

    // A reference `(` glyph pads every row to at least its height, the
    // way the teacher avoids jagged rows for cells that are all flat text.
    let paren = GlyphFragment::new(ctx, '(');

    let mut cells: Vec<Vec<Frame>> = Vec::with_capacity(nrows);
    let mut heights = vec![(Abs::zero(), Abs::zero()); nrows];
    let mut col_widths = vec![Abs::zero(); ncols];

    for (r, row) in rows.iter().enumerate() {
        let mut row_cells = Vec::with_capacity(ncols);
        for (c, cell) in row.iter().enumerate() {
            let cell_frame = ctx.layout_into_frame(cell, denom_style)?;
            let mut ascent = cell_frame.ascent();
            let mut descent = cell_frame.descent();
            if let Some(paren) = &paren {
                ascent.set_max(paren.ascent);
                descent.set_max(paren.descent);
            }
            heights[r].0.set_max(ascent);
            heights[r].1.set_max(descent);
            col_widths[c].set_max(cell_frame.width());
            row_cells.push(cell_frame);
        }
        cells.push(row_cells);
    }

    let total_height = heights.iter().map(|&(a, d)| a + d).sum::<Abs>()
        + row_gap * (nrows.saturating_sub(1)) as f64;
    let total_width = col_widths.iter().copied().sum::<Abs>()
        + col_gap * (ncols.saturating_sub(1)) as f64;

    let mut frame = Frame::soft(Size::new(total_width, total_height));

    let mut y = Abs::zero();
    for (r, row_cells) in cells.into_iter().enumerate() {
        let (ascent, descent) = heights[r];
        let mut x = Abs::zero();
        for (c, cell) in row_cells.into_iter().enumerate() {
            let col_width = col_widths[c];
            let pos = Point::new(
                x + FixedAlignment::Center.position(col_width - cell.width()),
                y + ascent - cell.ascent(),
            );
            frame.push_frame(pos, cell);
            x += col_width + col_gap;
        }
        y += ascent + descent + row_gap;
    }

    for &line in &augment.hline {
        let y = hline_offset(&heights, row_gap, line);
        frame.push(Point::with_y(y), FrameItem::Shape(Shape::line(Point::with_x(total_width), thickness)));
    }

    for &line in &augment.vline {
        let x = vline_offset(&col_widths, col_gap, line);
        frame.push(Point::with_x(x), FrameItem::Shape(Shape::line(Point::with_y(total_height), thickness)));
    }

    layout_delimiters(ctx, frame, delim, style)
}

/// Vertical offset of an hline drawn at the boundary before row `line`
/// (0-based); boundary lines at the grid's top/bottom edge sit flush
/// against it rather than reserving extra gap space.
fn hline_offset(heights: &[(Abs, Abs)], row_gap: Abs, line: usize) -> Abs {
    let n = heights.len();
    if line == 0 {
        return Abs::zero();
    }
    if line >= n {
        return heights.iter().map(|&(a, d)| a + d).sum::<Abs>()
            + row_gap * (n.saturating_sub(1)) as f64;
    }
    heights[..line].iter().map(|&(a, d)| a + d).sum::<Abs>()
        + row_gap * (line.saturating_sub(1)) as f64
        + row_gap / 2.0
}

fn vline_offset(col_widths: &[Abs], col_gap: Abs, line: usize) -> Abs {
    let n = col_widths.len();
    if line == 0 {
        return Abs::zero();
    }
    if line >= n {
        return col_widths.iter().copied().sum::<Abs>() + col_gap * (n.saturating_sub(1)) as f64;
    }
    col_widths[..line].iter().copied().sum::<Abs>()
        + col_gap * (line.saturating_sub(1)) as f64
        + col_gap / 2.0
}

fn layout_delimiters(
    ctx: &mut MathContext,
    mut frame: Frame,
    delim: Option<(char, char)>,
    style: MathStyle,
) -> SourceResult<()> {
    let Some((open, close)) = delim else {
        ctx.push(FrameFragment::new(style, frame));
        return Ok(());
    };

    let constants = ctx.constants();
    let font_size = ctx.font_size();
    let axis = constants.axis_height.at(font_size);
    let height = frame.height();
    let target = height + VERTICAL_PADDING.of(height);
    frame.set_baseline(height / 2.0 + axis);

    if let Some(glyph) = GlyphFragment::new(ctx, open) {
        let mut glyph = stretch_glyph_to_height(glyph, target);
        glyph.class = MathClass::Opening;
        ctx.push(glyph);
    }

    ctx.push(FrameFragment::new(style, frame));

    if let Some(glyph) = GlyphFragment::new(ctx, close) {
        let mut glyph = stretch_glyph_to_height(glyph, target);
        glyph.class = MathClass::Closing;
        ctx.push(glyph);
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

    fn rows(n: usize, m: usize) -> Vec<Vec<MathExpr>> {
        (0..n).map(|_| (0..m).map(|_| MathExpr::Atom('x')).collect()).collect()
    }

    #[test]
    fn two_by_two_matrix_is_wider_and_taller_than_one_cell() {
        let fonts = StubFonts;
        let mut ctx = MathContext::new(&fonts, FontId(0), Abs::pt(10.0));
        layout_matrix(&mut ctx, &rows(2, 2), None, &Augment::default(), MathStyle::new(true)).unwrap();
        assert_eq!(ctx.fragments.len(), 1);
        let frame = ctx.fragments.pop().unwrap().into_frame();

        let mut single_ctx = MathContext::new(&fonts, FontId(0), Abs::pt(10.0));
        layout_matrix(&mut single_ctx, &rows(1, 1), None, &Augment::default(), MathStyle::new(true)).unwrap();
        let single = single_ctx.fragments.pop().unwrap().into_frame();

        assert!(frame.width() > single.width());
        assert!(frame.height() > single.height());
    }

    #[test]
    fn delimited_matrix_gets_opening_and_closing_glyphs() {
        let fonts = StubFonts;
        let mut ctx = MathContext::new(&fonts, FontId(0), Abs::pt(10.0));
        layout_matrix(&mut ctx, &rows(2, 2), Some(('[', ']')), &Augment::default(), MathStyle::new(true))
            .unwrap();
        assert_eq!(ctx.fragments.len(), 3);
        assert!(matches!(ctx.fragments[0].class(), MathClass::Opening));
        assert!(matches!(ctx.fragments[2].class(), MathClass::Closing));
    }

    #[test]
    fn augmentation_lines_do_not_panic_at_grid_boundaries() {
        let fonts = StubFonts;
        let mut ctx = MathContext::new(&fonts, FontId(0), Abs::pt(10.0));
        let augment = Augment { hline: vec![0, 1, 2], vline: vec![0, 1, 2] };
        layout_matrix(&mut ctx, &rows(2, 2), None, &augment, MathStyle::new(true)).unwrap();
        assert_eq!(ctx.fragments.len(), 1);
    }
}
