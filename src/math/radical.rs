//! Radicals (§4.7 "Radical"): TeXbook p.443/p.360; see also
//! <https://www.w3.org/TR/mathml-core/#radicals-msqrt-mroot>.

use crate::error::{ErrorKind, SourceResult};
use crate::frame::{Frame, FrameItem, Shape};
use crate::geom::{Abs, Point, Size};

use super::fragment::{FrameFragment, GlyphFragment};
use super::{MathContext, MathExpr, MathSize, MathStyle};

pub fn layout_root(
    ctx: &mut MathContext,
    radicand: &MathExpr,
    index: Option<&MathExpr>,
    style: MathStyle,
) -> SourceResult<()> {
    let cramped = style.cramped();
    let radicand = ctx.layout_into_frame(radicand, cramped)?;

    let constants = ctx.constants();
    let font_size = ctx.font_size();
    let thickness = constants.radical_rule_thickness.at(font_size);
    let extra_ascender = constants.radical_extra_ascender.at(font_size);
    let kern_before = constants.radical_kern_before_degree.at(font_size);
    let kern_after = constants.radical_kern_after_degree.at(font_size);
    let raise_factor = constants.radical_degree_bottom_raise_percent;
    let mut gap = if style.size == MathSize::Display {
        constants.radical_display_style_vertical_gap
    } else {
        constants.radical_vertical_gap
    }
    .at(font_size);

    let Some(sqrt) = GlyphFragment::new(ctx, '√') else {
        crate::bail!(None, ErrorKind::FontMissing, "no glyph for radical sign");
    };

    let target = radicand.height() + thickness + gap;
    // A real shaping backend would re-layout `sqrt` stretched vertically to
    // `target` (`stretch_vertical`); this crate has no glyph-variant/
    // assembly data to do so, so the stretched height is approximated
    // directly as the target itself.
    let sqrt_height = target.max(sqrt.height());
    let sqrt_width = sqrt.width;

    let index_style = MathStyle { size: style.size.shrink().shrink(), cramped: true };
    let index = index.map(|index| ctx.layout_into_frame(index, index_style)).transpose()?;

    gap = gap.max((sqrt_height - thickness - radicand.height() + gap) / 2.0);

    let sqrt_ascent = radicand.ascent() + gap + thickness;
    let descent = sqrt_height - sqrt_ascent;
    let inner_ascent = sqrt_ascent + extra_ascender;

    let mut sqrt_offset = Abs::zero();
    let mut shift_up = Abs::zero();
    let mut ascent = inner_ascent;

    if let Some(index) = &index {
        sqrt_offset = kern_before + index.width() + kern_after;
        shift_up = raise_factor * (inner_ascent - descent) + index.descent();
        ascent.set_max(shift_up + index.ascent());
    }

    let sqrt_x = sqrt_offset.max(Abs::zero());
    let radicand_x = sqrt_x + sqrt_width;
    let radicand_y = ascent - radicand.ascent();
    let width = radicand_x + radicand.width();
    let size = Size::new(width, ascent + descent);

    let sqrt_pos = Point::new(sqrt_x, radicand_y - gap - thickness);
    let line_pos = Point::new(radicand_x, radicand_y - gap - thickness / 2.0);
    let radicand_pos = Point::new(radicand_x, radicand_y);

    let mut frame = Frame::soft(size);
    frame.set_baseline(ascent);

    if let Some(index) = index {
        let index_x = kern_before;
        let index_pos = Point::new(index_x, ascent - index.ascent() - shift_up);
        frame.push_frame(index_pos, index);
    }

    frame.push(sqrt_pos, FrameItem::Shape(Shape::rect(Size::new(sqrt_width, sqrt_height))));
    frame.push(
        line_pos,
        FrameItem::Shape(Shape::line(Point::with_x(radicand.width()), thickness)),
    );
    frame.push_frame(radicand_pos, radicand);
    ctx.push(FrameFragment::new(style, frame));
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
            c.radical_rule_thickness = crate::geom::Em::new(0.04);
            c.radical_vertical_gap = crate::geom::Em::new(0.1);
            c.radical_display_style_vertical_gap = crate::geom::Em::new(0.15);
            c.radical_extra_ascender = crate::geom::Em::new(0.04);
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
    fn root_encloses_radicand_height_plus_rule_and_gap() {
        let fonts = StubFonts;
        let mut ctx = MathContext::new(&fonts, FontId(0), Abs::pt(10.0));
        layout_root(&mut ctx, &MathExpr::Atom('x'), None, MathStyle::new(false)).unwrap();
        assert_eq!(ctx.fragments.len(), 1);
        let frame = ctx.fragments.pop().unwrap().into_frame();
        assert!(frame.height() > Abs::zero());
        assert!(frame.width() > Abs::zero());
    }

    #[test]
    fn root_with_index_is_wider_than_without() {
        let fonts = StubFonts;
        let plain_width = {
            let mut ctx = MathContext::new(&fonts, FontId(0), Abs::pt(10.0));
            layout_root(&mut ctx, &MathExpr::Atom('x'), None, MathStyle::new(false)).unwrap();
            ctx.fragments.pop().unwrap().into_frame().width()
        };
        let indexed_width = {
            let mut ctx = MathContext::new(&fonts, FontId(0), Abs::pt(10.0));
            layout_root(
                &mut ctx,
                &MathExpr::Atom('x'),
                Some(&MathExpr::Atom('3')),
                MathStyle::new(false),
            )
            .unwrap();
            ctx.fragments.pop().unwrap().into_frame().width()
        };
        assert!(indexed_width > plain_width);
    }
}
