//! Accents (§4.7 "Accent"): top and bottom accents attached over/under a
//! base, positioned from the base's and accent's `accent_attach` points.

use crate::error::{ErrorKind, SourceResult};
use crate::frame::Frame;
use crate::geom::{Abs, Point, Size};

use super::fragment::{glyph_to_frame, FrameFragment, GlyphFragment};
use super::{MathContext, MathExpr, MathStyle};

pub fn layout_accent(
    ctx: &mut MathContext,
    base_expr: &MathExpr,
    accent: char,
    top: bool,
    exact_frame_width: bool,
    style: MathStyle,
) -> SourceResult<()> {
    let base = ctx.layout_into_fragment(base_expr, style)?;
    let base_attach = base.accent_attach();

    let constants = ctx.constants();
    let font_size = ctx.font_size();

    let Some(accent_glyph) = GlyphFragment::new(ctx, accent) else {
        crate::bail!(None, ErrorKind::FontMissing, "no glyph for accent {accent:?}");
    };
    let accent_attach = accent_glyph.accent_attach.0;
    let accent_frame = glyph_to_frame(&accent_glyph);

    // Real OpenType MATH data picks a flattened accent variant once the
    // base is taller than `flattened_accent_base_height`; this crate has
    // no such variant table and always uses the plain accent glyph.

    let (width, base_x, accent_x) = {
        let base_attach_side = if top { base_attach.0 } else { base_attach.1 };
        if !exact_frame_width {
            (base.width(), Abs::zero(), base_attach_side - accent_attach)
        } else {
            let pre_width = accent_attach - base_attach_side;
            let post_width =
                (accent_frame.width() - accent_attach) - (base.width() - base_attach_side);
            let width =
                pre_width.max(Abs::zero()) + base.width() + post_width.max(Abs::zero());
            if pre_width < Abs::zero() {
                (width, Abs::zero(), -pre_width)
            } else {
                (width, pre_width, Abs::zero())
            }
        }
    };

    let (gap, accent_pos, base_pos) = if top {
        // The accent's ink bottom sits above the baseline, so its descent
        // is negative; the default gap is its negated descent, less the
        // base height, unless the base is small enough to need a larger
        // gap so the accent doesn't sit too low.
        let accent_base_height = constants.accent_base_height.at(font_size);
        let gap = -accent_frame.descent() - base.ascent().min(accent_base_height);
        let accent_pos = Point::with_x(accent_x);
        let base_pos = Point::new(base_x, accent_frame.height() + gap);
        (gap, accent_pos, base_pos)
    } else {
        let gap = -accent_frame.ascent();
        let accent_pos = Point::new(accent_x, base.height() + gap);
        let base_pos = Point::with_x(base_x);
        (gap, accent_pos, base_pos)
    };

    let size = Size::new(width, accent_frame.height() + gap + base.height());
    let baseline = base_pos.y + base.ascent();

    let base_text_like = !exact_frame_width && base.is_text_like();
    let base_italics_correction = base.italics_correction();
    let base_ascent = base.base_ascent();
    let base_descent = base.base_descent();

    let mut frame = Frame::soft(size);
    frame.set_baseline(baseline);
    frame.push_frame(accent_pos, accent_frame);
    frame.push_frame(base_pos, base.into_frame());

    ctx.push(
        FrameFragment::new(style, frame)
            .with_base_ascent(base_ascent)
            .with_base_descent(base_descent)
            .with_italics_correction(base_italics_correction)
            .with_text_like(base_text_like)
            .with_accent_attach(base_attach),
    );
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
            let mut c = MathConstants::default();
            c.accent_base_height = crate::geom::Em::new(0.5);
            c
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
    fn top_accent_sits_above_the_base() {
        let fonts = StubFonts;
        let mut ctx = MathContext::new(&fonts, FontId(0), Abs::pt(10.0));
        layout_accent(&mut ctx, &MathExpr::Atom('a'), '^', true, false, MathStyle::new(false)).unwrap();
        assert_eq!(ctx.fragments.len(), 1);
        let frame = ctx.fragments.pop().unwrap().into_frame();
        assert!(frame.height() > Abs::zero());
    }

    #[test]
    fn exact_frame_width_can_widen_the_result() {
        let fonts = StubFonts;
        let mut ctx = MathContext::new(&fonts, FontId(0), Abs::pt(10.0));
        layout_accent(&mut ctx, &MathExpr::Atom('a'), '^', true, true, MathStyle::new(false)).unwrap();
        assert_eq!(ctx.fragments.len(), 1);
    }
}
