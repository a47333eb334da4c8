//! Fractions (§4.7 "Fraction with line" / "Fraction stack" / "Skewed
//! fraction").

use crate::error::SourceResult;
use crate::frame::{Frame, FrameItem, Shape};
use crate::geom::{Abs, Em, Point, Size};

use super::fragment::FrameFragment;
use super::{MathContext, MathExpr, MathStyle};

const FRAC_AROUND: Em = Em::new(0.1);

/// `num_gap`/`denom_gap` per `spec.md` §4.7: the shift from baseline to
/// the rule, less the operand's own ink, clamped to the font's minimum.
fn line_gap(shift: Abs, axis: Abs, thickness: Abs, operand_ink: Abs, min: Abs, above: bool) -> Abs {
    let clearance = if above {
        shift - (axis + thickness / 2.0) - operand_ink
    } else {
        shift + (axis - thickness / 2.0) - operand_ink
    };
    clearance.max(min)
}

struct FracConstants {
    axis: Abs,
    thickness: Abs,
    num_shift: Abs,
    denom_shift: Abs,
    num_min: Abs,
    denom_min: Abs,
}

fn resolve(ctx: &MathContext, style: MathStyle) -> FracConstants {
    let constants = ctx.constants();
    let font_size = ctx.font_size();
    let display = style.size.is_display();
    FracConstants {
        axis: constants.axis_height.at(font_size),
        thickness: constants.fraction_rule_thickness.at(font_size),
        num_shift: if display {
            constants.fraction_numerator_display_style_shift_up
        } else {
            constants.fraction_numerator_shift_up
        }
        .at(font_size),
        denom_shift: if display {
            constants.fraction_denominator_display_style_shift_down
        } else {
            constants.fraction_denominator_shift_down
        }
        .at(font_size),
        num_min: if display {
            constants.fraction_num_display_style_gap_min
        } else {
            constants.fraction_numerator_gap_min
        }
        .at(font_size),
        denom_min: if display {
            constants.fraction_denom_display_style_gap_min
        } else {
            constants.fraction_denominator_gap_min
        }
        .at(font_size),
    }
}

pub fn layout_frac_line(
    ctx: &mut MathContext,
    num: &MathExpr,
    denom: &MathExpr,
    style: MathStyle,
) -> SourceResult<()> {
    let c = resolve(ctx, style);
    let font_size = ctx.font_size();
    let num = ctx.layout_into_frame(num, style.numerator())?;
    let denom = ctx.layout_into_frame(denom, style.denominator())?;

    let num_gap = line_gap(c.num_shift, c.axis, c.thickness, num.descent(), c.num_min, true);
    let denom_gap = line_gap(c.denom_shift, c.axis, c.thickness, denom.ascent(), c.denom_min, false);

    let line_width = num.width().max(denom.width());
    let around = FRAC_AROUND.at(font_size);
    let width = line_width + 2.0 * around;
    let height = num.height() + num_gap + c.thickness + denom_gap + denom.height();
    let size = Size::new(width, height);
    let num_pos = Point::with_x((width - num.width()) / 2.0);
    let line_pos = Point::new((width - line_width) / 2.0, num.height() + num_gap + c.thickness / 2.0);
    let denom_pos = Point::new((width - denom.width()) / 2.0, height - denom.height());
    let baseline = line_pos.y + c.axis;

    let mut frame = Frame::soft(size);
    frame.set_baseline(baseline);
    frame.push_frame(num_pos, num);
    frame.push_frame(denom_pos, denom);
    frame.push(line_pos, FrameItem::Shape(Shape::line(Point::with_x(line_width), c.thickness)));
    ctx.push(FrameFragment::new(style, frame));
    Ok(())
}

pub fn layout_frac_stack(
    ctx: &mut MathContext,
    num: &MathExpr,
    denom: &MathExpr,
    style: MathStyle,
) -> SourceResult<()> {
    let c = resolve(ctx, style);
    let num = ctx.layout_into_frame(num, style.numerator())?;
    let denom = ctx.layout_into_frame(denom, style.denominator())?;

    let gap = ((c.num_shift - num.descent()) + (c.denom_shift - denom.ascent())).max(c.num_min + c.denom_min);
    let width = num.width().max(denom.width());
    let height = num.height() + gap + denom.height();

    let num_pos = Point::with_x((width - num.width()) / 2.0);
    let denom_pos = Point::new((width - denom.width()) / 2.0, height - denom.height());

    let mut frame = Frame::soft(Size::new(width, height));
    frame.set_baseline(num.height() + gap / 2.0);
    frame.push_frame(num_pos, num);
    frame.push_frame(denom_pos, denom);
    ctx.push(FrameFragment::new(style, frame));
    Ok(())
}

pub fn layout_frac_skewed(
    ctx: &mut MathContext,
    num: &MathExpr,
    denom: &MathExpr,
    style: MathStyle,
) -> SourceResult<()> {
    let constants = ctx.constants();
    let font_size = ctx.font_size();
    let vgap = constants.skewed_fraction_vertical_gap.at(font_size);
    let hgap = constants.skewed_fraction_horizontal_gap.at(font_size);
    let axis = constants.axis_height.at(font_size);
    let thickness = constants.fraction_rule_thickness.at(font_size);

    let num = ctx.layout_into_frame(num, style.numerator())?;
    let denom = ctx.layout_into_frame(denom, style.denominator())?;
    let num_size = num.size();
    let denom_size = denom.size();

    let height = num_size.y + denom_size.y + vgap;
    let num_pos = Point::zero();
    let denom_pos = num_pos + num_size.to_point() + Point::new(hgap, vgap);
    let width = denom_pos.x + denom_size.x;

    let slash_top = Point::new(num_size.x + hgap, Abs::zero());
    let slash_start = Point::new(num_size.x, height);

    let mut frame = Frame::soft(Size::new(width, height));
    frame.set_baseline(height / 2.0 + axis);
    frame.push_frame(num_pos, num);
    frame.push_frame(denom_pos, denom);
    frame.push(slash_start, FrameItem::Shape(Shape::line(slash_top - slash_start, thickness)));
    ctx.push(FrameFragment::new(style, frame));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Corner;
    use crate::math::{FontId, FontMetrics, FontService, FracStyle, MathConstants, MathExpr, ShapedGlyph};

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

    /// Scenario 6: `a/b` at 12pt display produces a rule-separated frame
    /// whose width covers both operands plus padding on each side, and a
    /// nested `(a/b)/c` is strictly taller than the plain fraction at the
    /// same style.
    #[test]
    fn line_fraction_has_three_items_and_padded_width() {
        let fonts = StubFonts;
        let mut ctx = MathContext::new(&fonts, FontId(0), Abs::pt(12.0));
        layout_frac_line(&mut ctx, &MathExpr::Atom('a'), &MathExpr::Atom('b'), MathStyle::new(true))
            .unwrap();
        assert_eq!(ctx.fragments.len(), 1);
        let frame = ctx.fragments.pop().unwrap().into_frame();

        assert_eq!(frame.items().count(), 3);

        let around = FRAC_AROUND.at(Abs::pt(12.0));
        let mut single_ctx = MathContext::new(&fonts, FontId(0), Abs::pt(12.0));
        let num = single_ctx.layout_into_frame(&MathExpr::Atom('a'), MathStyle::new(true)).unwrap();
        let denom = single_ctx.layout_into_frame(&MathExpr::Atom('b'), MathStyle::new(true)).unwrap();
        let min_width = num.width().max(denom.width()) + 2.0 * around;
        assert!(frame.width() >= min_width);

        // The baseline sits strictly between the numerator's top and the
        // denominator's bottom, offset from the rule by the axis height.
        assert!(frame.baseline() > Abs::zero() && frame.baseline() < frame.height());
    }

    #[test]
    fn nested_fraction_is_taller_than_simple_fraction() {
        let fonts = StubFonts;

        let mut simple_ctx = MathContext::new(&fonts, FontId(0), Abs::pt(12.0));
        layout_frac_line(
            &mut simple_ctx,
            &MathExpr::Atom('a'),
            &MathExpr::Atom('b'),
            MathStyle::new(true),
        )
        .unwrap();
        let simple = simple_ctx.fragments.pop().unwrap().into_frame();

        let nested_num = MathExpr::Frac {
            num: Box::new(MathExpr::Atom('a')),
            denom: Box::new(MathExpr::Atom('b')),
            style: FracStyle::Line,
        };
        let mut nested_ctx = MathContext::new(&fonts, FontId(0), Abs::pt(12.0));
        layout_frac_line(&mut nested_ctx, &nested_num, &MathExpr::Atom('c'), MathStyle::new(true))
            .unwrap();
        let nested = nested_ctx.fragments.pop().unwrap().into_frame();

        assert!(nested.height() > simple.height());
    }
}
