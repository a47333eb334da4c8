//! Fenced delimiters (§4.7 "Fenced"): opening/closing glyphs stretched to
//! enclose the body, following the OpenType MATH "stretch relative to
//! twice the maximum extent above/below the axis" rule.
//!
//! The teacher stretches delimiters through `MathFragment::Variant`'s
//! glyph-assembly data; this crate has no such mechanism (no shaping
//! backend to source assembly parts from), so the stretched height is
//! approximated by growing the glyph's ascent/descent symmetrically to the
//! target (see `DESIGN.md`).

use unicode_math_class::MathClass;

use crate::error::{ErrorKind, SourceResult};
use crate::geom::Abs;

use super::fragment::{GlyphFragment, MathFragment};
use super::shared::{stretch_glyph_to_height, DELIM_SHORT_FALL};
use super::{MathContext, MathExpr, MathStyle};

pub fn layout_fenced(
    ctx: &mut MathContext,
    open: Option<char>,
    body: &MathExpr,
    close: Option<char>,
    style: MathStyle,
) -> SourceResult<()> {
    let inner = ctx.layout_into_fragments(body, style)?;

    let constants = ctx.constants();
    let font_size = ctx.font_size();
    let axis = constants.axis_height.at(font_size);

    let max_extent = inner
        .iter()
        .map(|fragment| (fragment.ascent() - axis).max(fragment.descent() + axis))
        .fold(Abs::zero(), Abs::max);
    let relative_to = 2.0 * max_extent;
    let short_fall = DELIM_SHORT_FALL.at(font_size);
    let target = (relative_to - short_fall).max(Abs::zero());

    let mut fragments = Vec::with_capacity(inner.len() + 2);

    if let Some(open) = open {
        let Some(glyph) = GlyphFragment::new(ctx, open) else {
            crate::bail!(None, ErrorKind::FontMissing, "no glyph for opening delimiter {open:?}");
        };
        let mut glyph = stretch_glyph_to_height(glyph, target);
        glyph.class = MathClass::Opening;
        fragments.push(MathFragment::Glyph(glyph));
    }

    fragments.extend(inner);

    if let Some(close) = close {
        let Some(glyph) = GlyphFragment::new(ctx, close) else {
            crate::bail!(None, ErrorKind::FontMissing, "no glyph for closing delimiter {close:?}");
        };
        let mut glyph = stretch_glyph_to_height(glyph, target);
        glyph.class = MathClass::Closing;
        fragments.push(MathFragment::Glyph(glyph));
    }

    ctx.extend(fragments);
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
    fn fenced_body_gets_opening_and_closing_glyphs() {
        let fonts = StubFonts;
        let mut ctx = MathContext::new(&fonts, FontId(0), Abs::pt(10.0));
        layout_fenced(&mut ctx, Some('('), &MathExpr::Atom('x'), Some(')'), MathStyle::new(false)).unwrap();
        assert_eq!(ctx.fragments.len(), 3);
        assert!(matches!(ctx.fragments[0].class(), MathClass::Opening));
        assert!(matches!(ctx.fragments[2].class(), MathClass::Closing));
    }

    #[test]
    fn tall_body_stretches_delimiters_past_natural_height() {
        let fonts = StubFonts;
        let mut ctx = MathContext::new(&fonts, FontId(0), Abs::pt(10.0));
        let tall = MathExpr::Frac {
            num: Box::new(MathExpr::Atom('a')),
            denom: Box::new(MathExpr::Atom('b')),
            style: super::super::FracStyle::Line,
        };
        layout_fenced(&mut ctx, Some('('), &tall, Some(')'), MathStyle::new(false)).unwrap();
        let MathFragment::Glyph(open) = &ctx.fragments[0] else { panic!("expected glyph") };
        assert!(open.height() > Abs::zero());
    }
}
