//! Cancel (§4.7 "Cancel"): a diagonal line struck through a body,
//! optionally crossed by a second, inverted line.
//!
//! The teacher rotates a line [`Frame`] through `Transform::rotate` and
//! supports a caller-supplied length scale and an angle callback; this
//! crate has no transform/angle type, so the rotated endpoints are
//! computed directly by trigonometry and the line always spans the
//! body's full diagonal (see `DESIGN.md`).

use crate::error::SourceResult;
use crate::frame::{FrameItem, Shape};
use crate::geom::{Abs, Point, Size};

use super::fragment::FrameFragment;
use super::{MathContext, MathExpr, MathStyle};

pub fn layout_cancel(
    ctx: &mut MathContext,
    base: &MathExpr,
    cross: bool,
    invert: bool,
    angle: Option<f64>,
    style: MathStyle,
) -> SourceResult<()> {
    let body = ctx.layout_into_fragment(base, style)?;
    let body_text_like = body.is_text_like();
    let body_italics = body.italics_correction();
    let body_attach = body.accent_attach();

    let mut frame = body.into_frame();
    let size = frame.size();
    let center = Point::new(size.x / 2.0, size.y / 2.0);

    let base_angle = angle.unwrap_or_else(|| default_angle(size));
    let (pos, item) = cancel_line(center, size, base_angle, invert);
    frame.push(pos, item);

    if cross {
        let (pos, item) = cancel_line(center, size, base_angle, true);
        frame.push(pos, item);
    }

    ctx.push(
        FrameFragment::new(style, frame)
            .with_italics_correction(body_italics)
            .with_text_like(body_text_like)
            .with_accent_attach(body_attach),
    );
    Ok(())
}

fn cancel_line(center: Point, size: Size, angle: f64, invert: bool) -> (Point, FrameItem) {
    let angle = if invert { -angle } else { angle };
    let half = size.to_point().hypot() / 2.0;
    let (dx, dy) = (angle.sin(), -angle.cos());
    let start = Point::new(center.x + half * dx, center.y + half * dy);
    let end = Point::new(center.x - half * dx, center.y - half * dy);
    let delta = Point::new(end.x - start.x, end.y - start.y);
    (start, FrameItem::Shape(Shape::line(delta, Abs::pt(0.5))))
}

/// The diagonal's angle from the vertical axis, in radians, for a body
/// of the given size (TeXbook-style `\cancel`: `atan2(width, height)`).
fn default_angle(size: Size) -> f64 {
    size.x.to_raw().atan2(size.y.to_raw())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Corner, Em};
    use crate::math::{FontId, FontMetrics, FontService, MathConstants, ShapedGlyph};

    struct StubFonts;
    impl FontService for StubFonts {
        fn font_metrics(&self, _font: FontId) -> FontMetrics {
            FontMetrics { units_per_em: 1000.0, ascent: Em::new(0.8), descent: Em::new(0.2) }
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
    fn cancel_preserves_the_base_frame_size() {
        let fonts = StubFonts;
        let mut ctx = MathContext::new(&fonts, FontId(0), Abs::pt(10.0));
        let base = ctx.layout_into_frame(&MathExpr::Atom('x'), MathStyle::new(false)).unwrap();
        let (base_w, base_h) = (base.width(), base.height());

        layout_cancel(&mut ctx, &MathExpr::Atom('x'), false, false, None, MathStyle::new(false)).unwrap();
        let frame = ctx.fragments.pop().unwrap().into_frame();
        assert_eq!(frame.width(), base_w);
        assert_eq!(frame.height(), base_h);
    }

    #[test]
    fn cross_draws_two_lines() {
        let fonts = StubFonts;

        let mut single_ctx = MathContext::new(&fonts, FontId(0), Abs::pt(10.0));
        layout_cancel(&mut single_ctx, &MathExpr::Atom('x'), false, false, None, MathStyle::new(false))
            .unwrap();
        let single_count = single_ctx.fragments.pop().unwrap().into_frame().items().count();

        let mut ctx = MathContext::new(&fonts, FontId(0), Abs::pt(10.0));
        layout_cancel(&mut ctx, &MathExpr::Atom('x'), true, false, None, MathStyle::new(false)).unwrap();
        let frame = ctx.fragments.pop().unwrap().into_frame();
        assert_eq!(frame.items().count(), single_count + 1);
    }
}
