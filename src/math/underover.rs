//! Over/underline (§4.7): a rule drawn above or below a body, with extra
//! ascender/descender clearance so the rule never touches neighboring rows.
//!
//! The teacher's module also lays out over/underbrace, -bracket, -paren and
//! -shell annotations by stretching a spreader glyph to the body's width;
//! `spec.md` §4.7 names only "Over/underline", so those spreader constructs
//! have no counterpart here (see `DESIGN.md`).

use crate::error::SourceResult;
use crate::frame::{Frame, FrameItem, Shape};
use crate::geom::{Abs, Point, Size};

use super::fragment::FrameFragment;
use super::{MathContext, MathExpr, MathStyle};

enum Position {
    Under,
    Over,
}

pub fn layout_underline(ctx: &mut MathContext, body: &MathExpr, style: MathStyle) -> SourceResult<()> {
    layout_underoverline(ctx, body, style, Position::Under)
}

pub fn layout_overline(ctx: &mut MathContext, body: &MathExpr, style: MathStyle) -> SourceResult<()> {
    layout_underoverline(ctx, body, style, Position::Over)
}

fn layout_underoverline(
    ctx: &mut MathContext,
    body: &MathExpr,
    style: MathStyle,
    position: Position,
) -> SourceResult<()> {
    let constants = ctx.constants();
    let font_size = ctx.font_size();

    let extra_height;
    let content;
    let line_pos;
    let content_pos;
    let baseline;
    let bar_height;
    let line_adjust;

    match position {
        Position::Under => {
            let sep = constants.underbar_extra_descender.at(font_size);
            bar_height = constants.underbar_rule_thickness.at(font_size);
            let gap = constants.underbar_vertical_gap.at(font_size);
            extra_height = sep + bar_height + gap;

            content = ctx.layout_into_fragment(body, style)?;

            line_pos = Point::with_y(content.height() + gap + bar_height / 2.0);
            content_pos = Point::zero();
            baseline = content.ascent();
            line_adjust = -content.italics_correction();
        }
        Position::Over => {
            let sep = constants.overbar_extra_ascender.at(font_size);
            bar_height = constants.overbar_rule_thickness.at(font_size);
            let gap = constants.overbar_vertical_gap.at(font_size);
            extra_height = sep + bar_height + gap;

            content = ctx.layout_into_fragment(body, style.cramped())?;

            line_pos = Point::with_y(sep + bar_height / 2.0);
            content_pos = Point::with_y(extra_height);
            baseline = content.ascent() + extra_height;
            line_adjust = Abs::zero();
        }
    }

    let width = content.width();
    let height = content.height() + extra_height;
    let size = Size::new(width, height);
    let line_width = width + line_adjust;

    let content_class = content.class();
    let content_is_text_like = content.is_text_like();
    let content_italics_correction = content.italics_correction();

    let mut frame = Frame::soft(size);
    frame.set_baseline(baseline);
    frame.push_frame(content_pos, content.into_frame());
    frame.push(line_pos, FrameItem::Shape(Shape::line(Point::with_x(line_width), bar_height)));

    ctx.push(
        FrameFragment::new(style, frame)
            .with_class(content_class)
            .with_text_like(content_is_text_like)
            .with_italics_correction(content_italics_correction),
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
            c.overbar_rule_thickness = crate::geom::Em::new(0.05);
            c.overbar_vertical_gap = crate::geom::Em::new(0.15);
            c.overbar_extra_ascender = crate::geom::Em::new(0.05);
            c.underbar_rule_thickness = crate::geom::Em::new(0.05);
            c.underbar_vertical_gap = crate::geom::Em::new(0.15);
            c.underbar_extra_descender = crate::geom::Em::new(0.05);
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
    fn overline_adds_clearance_above_the_body() {
        let fonts = StubFonts;
        let mut ctx = MathContext::new(&fonts, FontId(0), Abs::pt(10.0));
        layout_overline(&mut ctx, &MathExpr::Atom('x'), MathStyle::new(false)).unwrap();
        let frame = ctx.fragments.pop().unwrap().into_frame();
        assert!(frame.height() > Abs::zero());
    }

    #[test]
    fn underline_adds_clearance_below_the_body() {
        let fonts = StubFonts;
        let mut ctx = MathContext::new(&fonts, FontId(0), Abs::pt(10.0));
        layout_underline(&mut ctx, &MathExpr::Atom('x'), MathStyle::new(false)).unwrap();
        let frame = ctx.fragments.pop().unwrap().into_frame();
        assert!(frame.height() > Abs::zero());
    }
}
